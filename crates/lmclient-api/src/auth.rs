use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// Which generation of the appliance management API to speak.
///
/// Fixed for the lifetime of a client; there is no negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiVersion {
    /// Legacy API: `GET /access/{cmd}?...`, XML responses.
    V1,
    /// `POST /accessv2` with a JSON body, JSON responses.
    #[default]
    V2,
}

impl TryFrom<u8> for ApiVersion {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            other => Err(Error::UnsupportedVersion(other)),
        }
    }
}

impl From<ApiVersion> for u8 {
    fn from(version: ApiVersion) -> Self {
        match version {
            ApiVersion::V1 => 1,
            ApiVersion::V2 => 2,
        }
    }
}

/// Credentials for signing requests against the appliance.
///
/// An API key and a username/password pair may both be present; the
/// client sends whatever is configured. At least one complete form is
/// required before any request is built.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub api_key: Option<SecretString>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
}

impl Credentials {
    /// API-key-only credentials.
    pub fn api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(SecretString::from(key.into())),
            ..Self::default()
        }
    }

    /// Username/password credentials.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            api_key: None,
            username: Some(username.into()),
            password: Some(SecretString::from(password.into())),
        }
    }

    /// The API key, if set and non-empty.
    pub(crate) fn key(&self) -> Option<&str> {
        self.api_key
            .as_ref()
            .map(ExposeSecret::expose_secret)
            .filter(|k| !k.is_empty())
    }

    /// Username and password, only when both are set and non-empty.
    pub(crate) fn user_pass(&self) -> Option<(&str, &str)> {
        let user = self.username.as_deref().filter(|u| !u.is_empty())?;
        let pass = self
            .password
            .as_ref()
            .map(ExposeSecret::expose_secret)
            .filter(|p| !p.is_empty())?;
        Some((user, pass))
    }

    /// Fails with [`Error::MissingAuthentication`] unless an API key or a
    /// complete username/password pair is present.
    pub fn validate(&self) -> Result<(), Error> {
        if self.key().is_none() && self.user_pass().is_none() {
            return Err(Error::MissingAuthentication);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_from_flag() {
        assert_eq!(ApiVersion::try_from(1).ok(), Some(ApiVersion::V1));
        assert_eq!(ApiVersion::try_from(2).ok(), Some(ApiVersion::V2));
        assert!(matches!(
            ApiVersion::try_from(3),
            Err(Error::UnsupportedVersion(3))
        ));
    }

    #[test]
    fn api_key_alone_is_enough() {
        assert!(Credentials::api_key("k").validate().is_ok());
    }

    #[test]
    fn user_without_password_is_rejected() {
        let creds = Credentials {
            username: Some("bal".into()),
            ..Credentials::default()
        };
        assert!(matches!(
            creds.validate(),
            Err(Error::MissingAuthentication)
        ));
    }

    #[test]
    fn empty_key_counts_as_missing() {
        assert!(Credentials::api_key("").validate().is_err());
        assert!(Credentials::basic("bal", "").validate().is_err());
        assert!(Credentials::basic("bal", "secret").validate().is_ok());
    }
}
