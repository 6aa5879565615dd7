use thiserror::Error;

/// Top-level error type for the `lmclient-api` crate.
///
/// Covers every failure mode across both API generations: request signing,
/// transport, appliance-reported failures, and response decoding.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Neither an API key nor a complete username/password pair is configured.
    #[error("Missing authentication: an API key or username and password are required")]
    MissingAuthentication,

    /// The appliance rejected the supplied credentials (HTTP 401).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Unsupported API version flag.
    #[error("Unsupported API version: {0} (expected 1 or 2)")]
    UnsupportedVersion(u8),

    /// Non-success HTTP status whose body is not an appliance status document.
    #[error("status: {status}, body: {body}")]
    Http { status: u16, body: String },

    // ── Appliance ───────────────────────────────────────────────────
    /// Failure reported by the appliance itself (`status != "ok"`).
    #[error("Code: {code} Message: {message}")]
    Api { code: u16, message: String },

    /// Lookup by name found nothing.
    #[error("{kind} with name {name} not found")]
    NotFound { kind: &'static str, name: String },

    /// The appliance answered successfully but without the expected record.
    #[error("Empty response to '{cmd}'")]
    EmptyResponse { cmd: &'static str },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON or XML deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Legacy XML declared a charset we cannot transcode.
    #[error("Unknown charset: {0}")]
    Charset(String),
}

impl Error {
    /// Returns `true` if the appliance reports the addressed resource as
    /// missing, or a lookup by name came up empty.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Api { message, .. } => message.starts_with("Unknown"),
            Self::Http { status, .. } => *status == 404,
            _ => false,
        }
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// The appliance's numeric result code, if the error carries one.
    pub fn api_code(&self) -> Option<u16> {
        match self {
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub(crate) fn deserialization(err: impl std::fmt::Display, body: &str) -> Self {
        let preview: String = body.chars().take(200).collect();
        Self::Deserialization {
            message: format!("{err} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    }
}
