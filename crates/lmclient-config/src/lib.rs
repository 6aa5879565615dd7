//! Shared configuration for LoadMaster clients.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to a ready [`LoadMasterClient`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lmclient_api::{
    ApiVersion, ConsistencyPolicy, Credentials, LoadMasterClient, TlsMode, TransportConfig,
};

const KEYRING_SERVICE: &str = "lmclient";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{0}' not found")]
    UnknownProfile(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to build client: {0}")]
    Client(#[from] lmclient_api::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named appliance profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile by name, falling back to `default_profile`.
    pub fn profile<'a>(
        &'a self,
        name: Option<&'a str>,
    ) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get(name)
            .map(|p| (name, p))
            .ok_or_else(|| ConfigError::UnknownProfile(name.into()))
    }

    /// Build a client for the named (or default) profile.
    pub fn client(&self, name: Option<&str>) -> Result<LoadMasterClient, ConfigError> {
        let (name, profile) = self.profile(name)?;
        profile_to_client(profile, name, &self.defaults)
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    /// 1 for the legacy XML API, 2 for the JSON API.
    #[serde(default = "default_api_version")]
    pub api_version: u8,

    /// Appliances ship self-signed certificates.
    #[serde(default = "default_insecure")]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Wait before re-fetching a freshly created VS, in milliseconds.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            insecure: default_insecure(),
            timeout: default_timeout(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

fn default_api_version() -> u8 {
    2
}
fn default_insecure() -> bool {
    true
}
fn default_timeout() -> u64 {
    30
}
fn default_settle_delay_ms() -> u64 {
    200
}

/// A named appliance profile.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Appliance base URL (e.g., "https://10.0.0.2").
    pub url: String,

    /// Override the API generation.
    pub api_version: Option<u8>,

    /// API key (plaintext; prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    pub username: Option<String>,

    /// Password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout, in seconds.
    pub timeout: Option<u64>,

    /// Override the post-create settle delay, in milliseconds.
    pub settle_delay_ms: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "lmclient", "lmclient").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("lmclient");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// Nested keys are addressed with a double underscore, e.g.
/// `LOADMASTER_DEFAULTS__API_VERSION=1`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("LOADMASTER_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_secret(profile_name: &str, kind: &str) -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/{kind}"))
        .ok()?
        .get_password()
        .ok()
}

/// Env var named by the profile → system keyring → plaintext in config.
fn resolve_secret(
    env_name: Option<&str>,
    plaintext: Option<&str>,
    profile_name: &str,
    kind: &str,
    env: &impl Fn(&str) -> Option<String>,
) -> Option<SecretString> {
    env_name
        .and_then(env)
        .or_else(|| keyring_secret(profile_name, kind))
        .or_else(|| plaintext.map(str::to_owned))
        .filter(|s| !s.is_empty())
        .map(SecretString::from)
}

fn resolve_credentials_with(
    profile: &Profile,
    profile_name: &str,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<Credentials, ConfigError> {
    let api_key = resolve_secret(
        profile.api_key_env.as_deref(),
        profile.api_key.as_deref(),
        profile_name,
        "api-key",
        env,
    );
    let username = profile.username.clone().filter(|u| !u.is_empty());
    let password = username.as_ref().and_then(|_| {
        resolve_secret(
            profile.password_env.as_deref(),
            profile.password.as_deref(),
            profile_name,
            "password",
            env,
        )
    });

    if api_key.is_none() && password.is_none() {
        return Err(ConfigError::NoCredentials {
            profile: profile_name.into(),
        });
    }

    Ok(Credentials {
        api_key,
        username,
        password,
    })
}

/// Resolve the API key and/or username + password for a profile.
///
/// Each secret is looked up in the env var named by the profile, then
/// the system keyring (`lmclient` / `{profile}/api-key` or
/// `{profile}/password`), then the plaintext config value.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<Credentials, ConfigError> {
    resolve_credentials_with(profile, profile_name, &|name| std::env::var(name).ok())
}

// ── Profile → client ────────────────────────────────────────────────

fn api_version(profile: &Profile, defaults: &Defaults) -> Result<ApiVersion, ConfigError> {
    let raw = profile.api_version.unwrap_or(defaults.api_version);
    ApiVersion::try_from(raw).map_err(|_| ConfigError::Validation {
        field: "api_version".into(),
        reason: format!("expected 1 or 2, got {raw}"),
    })
}

fn transport(profile: &Profile, defaults: &Defaults) -> TransportConfig {
    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    TransportConfig {
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
    }
}

/// Build a `LoadMasterClient` from a profile.
pub fn profile_to_client(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<LoadMasterClient, ConfigError> {
    let url: url::Url = profile.url.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {}", profile.url),
    })?;

    let version = api_version(profile, defaults)?;
    let credentials = resolve_credentials(profile, profile_name)?;
    let http = transport(profile, defaults).build_client()?;

    let settle_ms = profile.settle_delay_ms.unwrap_or(defaults.settle_delay_ms);
    let consistency = ConsistencyPolicy {
        settle_delay: Duration::from_millis(settle_ms),
        ..ConsistencyPolicy::default()
    };

    Ok(LoadMasterClient::with_client(http, url, credentials, version)
        .with_consistency(consistency))
}

// ── Environment-only profile ────────────────────────────────────────

fn profile_from_vars(
    env: impl Fn(&str) -> Option<String>,
) -> Result<Option<Profile>, ConfigError> {
    let Some(server) = env("LOADMASTER_SERVER").filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let url = if server.contains("://") {
        server
    } else {
        format!("https://{server}")
    };

    let api_version = env("LOADMASTER_API_VERSION")
        .map(|raw| {
            raw.trim().parse::<u8>().map_err(|_| ConfigError::Validation {
                field: "LOADMASTER_API_VERSION".into(),
                reason: format!("expected 1 or 2, got '{raw}'"),
            })
        })
        .transpose()?;

    Ok(Some(Profile {
        url,
        api_version,
        api_key: env("LOADMASTER_API_KEY"),
        username: env("LOADMASTER_USERNAME"),
        password: env("LOADMASTER_PASSWORD"),
        ..Profile::default()
    }))
}

/// Build a profile from `LOADMASTER_SERVER`, `LOADMASTER_API_KEY`,
/// `LOADMASTER_USERNAME`, `LOADMASTER_PASSWORD` and
/// `LOADMASTER_API_VERSION`. `None` when no server is set.
pub fn profile_from_env() -> Result<Option<Profile>, ConfigError> {
    profile_from_vars(|name| std::env::var(name).ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn profile(url: &str) -> Profile {
        Profile {
            url: url.into(),
            ..Profile::default()
        }
    }

    #[test]
    fn loads_profiles_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
default_profile = "lab"

[defaults]
api_version = 1
timeout = 10

[profiles.lab]
url = "https://10.0.0.2"
api_key = "bar"
settle_delay_ms = 0
"#
        )
        .unwrap();

        let cfg = load_config_from(file.path()).unwrap();
        assert_eq!(cfg.defaults.api_version, 1);
        assert_eq!(cfg.defaults.timeout, 10);
        assert!(cfg.defaults.insecure);

        let (name, lab) = cfg.profile(None).unwrap();
        assert_eq!(name, "lab");
        assert_eq!(lab.url, "https://10.0.0.2");
        assert_eq!(lab.settle_delay_ms, Some(0));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.api_version, 2);
        assert!(matches!(
            cfg.profile(None),
            Err(ConfigError::UnknownProfile(name)) if name == "default"
        ));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                api_key_env: Some("LM_KEY".into()),
                ..profile("https://lm.example")
            },
        );
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profiles, cfg.profiles);
    }

    #[test]
    fn env_var_wins_over_plaintext() {
        let p = Profile {
            api_key: Some("plain".into()),
            api_key_env: Some("LM_KEY".into()),
            ..profile("https://lm.example")
        };
        let creds =
            resolve_credentials_with(&p, "lmclient-test-env", &vars(&[("LM_KEY", "from-env")]))
                .unwrap();
        assert_eq!(creds.api_key.unwrap().expose_secret(), "from-env");
    }

    #[test]
    fn plaintext_used_when_env_unset() {
        let p = Profile {
            username: Some("bal".into()),
            password: Some("secret".into()),
            password_env: Some("LM_PASS".into()),
            ..profile("https://lm.example")
        };
        let creds = resolve_credentials_with(&p, "lmclient-test-plain", &vars(&[])).unwrap();
        assert!(creds.api_key.is_none());
        assert_eq!(creds.username.as_deref(), Some("bal"));
        assert_eq!(creds.password.unwrap().expose_secret(), "secret");
    }

    #[test]
    fn password_without_username_is_ignored() {
        let p = Profile {
            password: Some("secret".into()),
            ..profile("https://lm.example")
        };
        assert!(matches!(
            resolve_credentials_with(&p, "lmclient-test-nouser", &vars(&[])),
            Err(ConfigError::NoCredentials { profile }) if profile == "lmclient-test-nouser"
        ));
    }

    #[test]
    fn invalid_api_version_is_rejected() {
        let p = Profile {
            api_version: Some(3),
            ..profile("https://lm.example")
        };
        assert!(matches!(
            api_version(&p, &Defaults::default()),
            Err(ConfigError::Validation { field, .. }) if field == "api_version"
        ));
    }

    #[test]
    fn transport_follows_profile_overrides() {
        let defaults = Defaults::default();

        let t = transport(&profile("https://lm.example"), &defaults);
        assert!(matches!(t.tls, TlsMode::DangerAcceptInvalid));
        assert_eq!(t.timeout, Duration::from_secs(30));

        let strict = Profile {
            insecure: Some(false),
            ca_cert: Some(PathBuf::from("/etc/lm/ca.pem")),
            timeout: Some(5),
            ..profile("https://lm.example")
        };
        let t = transport(&strict, &defaults);
        assert!(matches!(t.tls, TlsMode::CustomCa(ref p) if p == Path::new("/etc/lm/ca.pem")));
        assert_eq!(t.timeout, Duration::from_secs(5));
    }

    #[test]
    fn profile_to_client_applies_version() {
        let p = Profile {
            api_key: Some("bar".into()),
            api_version: Some(1),
            ..profile("https://lm.example")
        };
        let client = profile_to_client(&p, "lmclient-test-client", &Defaults::default()).unwrap();
        assert_eq!(client.version(), ApiVersion::V1);
        assert_eq!(client.base_url().as_str(), "https://lm.example/");
    }

    #[test]
    fn profile_to_client_rejects_bad_url() {
        let p = Profile {
            api_key: Some("bar".into()),
            ..profile("not a url")
        };
        assert!(matches!(
            profile_to_client(&p, "lmclient-test-url", &Defaults::default()),
            Err(ConfigError::Validation { field, .. }) if field == "url"
        ));
    }

    #[test]
    fn env_profile() {
        let p = profile_from_vars(vars(&[
            ("LOADMASTER_SERVER", "10.0.0.2"),
            ("LOADMASTER_API_KEY", "bar"),
            ("LOADMASTER_API_VERSION", "1"),
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(p.url, "https://10.0.0.2");
        assert_eq!(p.api_key.as_deref(), Some("bar"));
        assert_eq!(p.api_version, Some(1));

        assert_eq!(profile_from_vars(vars(&[])).unwrap(), None);
        assert!(profile_from_vars(vars(&[
            ("LOADMASTER_SERVER", "10.0.0.2"),
            ("LOADMASTER_API_VERSION", "two"),
        ]))
        .is_err());
    }
}
