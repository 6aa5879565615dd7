// Legacy (v1) response codec
//
// Charset coercion, `<Response>` envelope unwrapping, and conversion of the
// text-only wire records into typed models.

pub(crate) mod charset;
pub(crate) mod models;

use serde::de::DeserializeOwned;
use tracing::trace;

use crate::error::Error;
use crate::models::ApiResponse;

use self::models::{Envelope, IntoModel, StatusEnvelope};

fn parse_stat(stat: &str) -> u16 {
    stat.trim().parse().unwrap_or(0)
}

/// A `<Response>` is a failure when it carries `<Error>` or a `code`
/// attribute other than `ok`.
fn check(stat: &str, code: &str, error: Option<String>) -> Result<(), Error> {
    let failed = error.is_some() || (!code.is_empty() && code != "ok");
    if failed {
        return Err(Error::Api {
            code: parse_stat(stat),
            message: error.unwrap_or_else(|| format!("code={code}")),
        });
    }
    Ok(())
}

/// Decode a `<Response><Success><Data>` document into a typed model.
pub(crate) fn decode<X>(cmd: &'static str, body: &[u8]) -> Result<X::Model, Error>
where
    X: DeserializeOwned + IntoModel,
{
    let text = charset::decode_body(body)?;
    trace!(cmd, len = text.len(), "decoding legacy XML");

    let envelope: Envelope<X> =
        quick_xml::de::from_str(&text).map_err(|e| Error::deserialization(e, &text))?;
    check(&envelope.stat, &envelope.code, envelope.error)?;

    let success = envelope.success.ok_or(Error::EmptyResponse { cmd })?;
    success
        .data
        .into_model()
        .map_err(|message| Error::deserialization(message, &text))
}

/// Decode the reply of a status-only command.
pub(crate) fn decode_status(body: &[u8]) -> Result<ApiResponse, Error> {
    let text = charset::decode_body(body)?;
    let envelope: StatusEnvelope =
        quick_xml::de::from_str(&text).map_err(|e| Error::deserialization(e, &text))?;
    let response = ApiResponse {
        code: parse_stat(&envelope.stat),
        message: envelope
            .success
            .map(|s| s.text)
            .or(envelope.error)
            .unwrap_or_default()
            .trim()
            .to_owned(),
        status: envelope.code,
    };

    if response.is_ok() {
        Ok(response)
    } else {
        Err(Error::Api {
            code: response.code,
            message: response.message,
        })
    }
}
