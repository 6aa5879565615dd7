// LoadMaster HTTP client
//
// One request per call. v1 is `GET {base}/access/{cmd}?apikey=..&..` with
// optional basic auth and XML replies; v2 is `POST {base}/accessv2` with the
// command and credentials in a JSON body. Resource operations (vs, rs) are
// inherent methods in their own modules; this one only does transport and
// status handling.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::auth::{ApiVersion, Credentials};
use crate::command::{Body, Params};
use crate::error::Error;
use crate::legacy;
use crate::legacy::models::IntoModel;
use crate::models::ApiResponse;
use crate::transport::{ConsistencyPolicy, TransportConfig};
use crate::v2;

/// Async client for a LoadMaster appliance's management API.
///
/// Speaks either the legacy v1 API or v2, chosen once at construction.
pub struct LoadMasterClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    version: ApiVersion,
    consistency: ConsistencyPolicy,
}

impl LoadMasterClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the appliance root, e.g. `https://10.0.0.2`.
    pub fn new(
        base_url: &str,
        credentials: Credentials,
        version: ApiVersion,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let base_url = Url::parse(base_url)?;
        Ok(Self::with_client(http, base_url, credentials, version))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        credentials: Credentials,
        version: ApiVersion,
    ) -> Self {
        Self {
            http,
            base_url,
            credentials,
            version,
            consistency: ConsistencyPolicy::default(),
        }
    }

    /// Override the post-create settle/jitter timing.
    pub fn with_consistency(mut self, consistency: ConsistencyPolicy) -> Self {
        self.consistency = consistency;
        self
    }

    pub fn version(&self) -> ApiVersion {
        self.version
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub(crate) fn consistency(&self) -> ConsistencyPolicy {
        self.consistency
    }

    // ── URL builders ─────────────────────────────────────────────────

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Request ──────────────────────────────────────────────────────

    fn build_request<P: Params>(
        &self,
        cmd: &str,
        params: &P,
    ) -> Result<reqwest::RequestBuilder, Error> {
        self.credentials.validate()?;
        let api_key = self.credentials.key();
        let user_pass = self.credentials.user_pass();

        match self.version {
            ApiVersion::V1 => {
                let url = self.endpoint(&format!("access/{cmd}"))?;
                debug!("GET {url}");

                let mut query = Vec::new();
                if let Some(key) = api_key {
                    query.push(("apikey", key));
                }
                let command_query = params.query();
                query.extend(command_query.pairs().iter().map(|(k, v)| (*k, v.as_str())));

                let mut builder = self.http.get(url).query(&query);
                if let Some((user, pass)) = user_pass {
                    builder = builder.basic_auth(user, Some(pass));
                }
                Ok(builder)
            }
            ApiVersion::V2 => {
                let url = self.endpoint("accessv2")?;
                debug!(cmd, "POST {url}");

                let body = Body {
                    cmd,
                    apikey: api_key,
                    apiuser: user_pass.map(|(u, _)| u),
                    apipass: user_pass.map(|(_, p)| p),
                    params,
                };
                Ok(self.http.post(url).json(&body))
            }
        }
    }

    /// Send one command and return the raw body of a successful reply.
    ///
    /// Only `200` and `204` count as success. Other statuses are decoded as
    /// an appliance status document when possible so that the caller sees
    /// the appliance's own code and message.
    pub(crate) async fn send<P: Params>(&self, cmd: &str, params: &P) -> Result<Vec<u8>, Error> {
        let resp = self.build_request(cmd, params)?.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?.to_vec();
        trace!(cmd, %status, len = body.len(), "response received");

        if status == StatusCode::OK || status == StatusCode::NO_CONTENT {
            return Ok(body);
        }

        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "appliance rejected the credentials (HTTP 401)".into(),
            });
        }

        let decoded = match self.version {
            ApiVersion::V1 => legacy::decode_status(&body),
            ApiVersion::V2 => v2::decode_status(&body),
        };
        Err(match decoded {
            Err(err @ Error::Api { .. }) => err,
            _ => Error::Http {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            },
        })
    }

    /// Send a data command and decode its payload.
    ///
    /// `X` is the legacy XML record and `J` the v2 JSON shape; both convert
    /// into the same model.
    pub(crate) async fn fetch<P, X, J, T>(&self, cmd: &'static str, params: &P) -> Result<T, Error>
    where
        P: Params,
        X: DeserializeOwned + IntoModel,
        X::Model: Into<T>,
        J: DeserializeOwned + Into<T>,
    {
        let body = self.send(cmd, params).await?;
        match self.version {
            ApiVersion::V1 => legacy::decode::<X>(cmd, &body).map(Into::into),
            ApiVersion::V2 => v2::decode::<J>(cmd, &body).map(Into::into),
        }
    }

    /// Send a status-only command. A status other than `ok` is an error.
    pub(crate) async fn execute<P: Params>(
        &self,
        cmd: &str,
        params: &P,
    ) -> Result<ApiResponse, Error> {
        let body = self.send(cmd, params).await?;
        match self.version {
            ApiVersion::V1 => legacy::decode_status(&body),
            ApiVersion::V2 => v2::decode_status(&body),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::command::NoParams;

    fn client(version: ApiVersion, credentials: Credentials) -> LoadMasterClient {
        LoadMasterClient::with_client(
            reqwest::Client::new(),
            Url::parse("https://lm.example/").unwrap(),
            credentials,
            version,
        )
    }

    #[test]
    fn missing_credentials_fail_before_any_request() {
        let c = client(ApiVersion::V2, Credentials::default());
        assert!(matches!(
            c.build_request("listvs", &NoParams {}),
            Err(Error::MissingAuthentication)
        ));
    }

    #[test]
    fn v1_puts_apikey_in_query() {
        let c = client(ApiVersion::V1, Credentials::api_key("bar"));
        let req = c
            .build_request("listvs", &NoParams {})
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(req.method(), reqwest::Method::GET);
        assert_eq!(req.url().as_str(), "https://lm.example/access/listvs?apikey=bar");
        assert!(req.headers().get("authorization").is_none());
    }

    #[test]
    fn v1_uses_basic_auth_for_user_and_password() {
        let c = client(ApiVersion::V1, Credentials::basic("bal", "secret"));
        let req = c
            .build_request("listvs", &NoParams {})
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(req.url().query(), None);
        assert!(req.headers().get("authorization").is_some());
    }

    #[test]
    fn v2_posts_to_accessv2() {
        let c = client(ApiVersion::V2, Credentials::api_key("bar"));
        let req = c
            .build_request("listvs", &NoParams {})
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(req.method(), reqwest::Method::POST);
        assert_eq!(req.url().as_str(), "https://lm.example/accessv2");
        let body: serde_json::Value =
            serde_json::from_slice(req.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"cmd": "listvs", "apikey": "bar"}));
    }
}
