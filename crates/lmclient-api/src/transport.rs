// Shared transport configuration for building reqwest::Client instances.
//
// TLS and timeout settings live here, plus the timing knobs for the
// post-create consistency workaround.

use std::path::PathBuf;
use std::time::Duration;

use rand::{Rng, thread_rng};

use crate::error::Error;

static USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode.
#[derive(Debug, Clone)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (appliances ship self-signed ones).
    DangerAcceptInvalid,
}

/// Transport configuration for building the HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::DangerAcceptInvalid,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// Timing for the sleep-then-refetch step after creating a Virtual Service.
///
/// The appliance may not list a freshly created VS immediately. The client
/// waits `settle_delay` before re-fetching; if the VS is still unknown it
/// sleeps a random duration up to `not_found_jitter` and gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsistencyPolicy {
    pub settle_delay: Duration,
    pub not_found_jitter: Duration,
}

impl Default for ConsistencyPolicy {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(200),
            not_found_jitter: Duration::from_millis(4000),
        }
    }
}

impl ConsistencyPolicy {
    /// No waiting at all. Useful against mock servers.
    pub fn none() -> Self {
        Self {
            settle_delay: Duration::ZERO,
            not_found_jitter: Duration::ZERO,
        }
    }

    /// A random duration in `[0, not_found_jitter)`.
    pub(crate) fn jitter(&self) -> Duration {
        let max = u64::try_from(self.not_found_jitter.as_millis()).unwrap_or(u64::MAX);
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(thread_rng().gen_range(0..max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_stays_below_bound() {
        let policy = ConsistencyPolicy::default();
        for _ in 0..64 {
            assert!(policy.jitter() < policy.not_found_jitter);
        }
    }

    #[test]
    fn no_jitter_when_disabled() {
        assert_eq!(ConsistencyPolicy::none().jitter(), Duration::ZERO);
    }
}
