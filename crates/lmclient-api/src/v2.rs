// v2 (JSON) response codec
//
// Every v2 body carries `code`, `message` and `status` next to its payload.
// Lists live under `VS` / `Rs`; a single VS is the top-level object itself.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::error::Error;
use crate::models::{ApiResponse, RealServer, VsSummary};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct VsList {
    #[serde(rename = "VS")]
    pub vs: Vec<VsSummary>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RsList {
    #[serde(rename = "Rs", alias = "RS")]
    pub rs: Vec<RealServer>,
}

impl From<VsList> for Vec<VsSummary> {
    fn from(list: VsList) -> Self {
        list.vs
    }
}

impl From<RsList> for Vec<RealServer> {
    fn from(list: RsList) -> Self {
        list.rs
    }
}

fn parse<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    serde_json::from_slice(body)
        .map_err(|e| Error::deserialization(e, &String::from_utf8_lossy(body)))
}

/// Read the status fields; a present status other than `ok` is an error.
/// Bodies without a status are taken as successful.
pub(crate) fn status(body: &[u8]) -> Result<ApiResponse, Error> {
    let response: ApiResponse = parse(body)?;
    if response.status.is_empty() || response.is_ok() {
        Ok(response)
    } else {
        Err(Error::Api {
            code: response.code,
            message: response.message,
        })
    }
}

/// Decode a data-bearing reply after checking its status.
pub(crate) fn decode<T: DeserializeOwned>(cmd: &'static str, body: &[u8]) -> Result<T, Error> {
    trace!(cmd, len = body.len(), "decoding v2 JSON");
    status(body)?;
    parse(body)
}

/// Decode the reply of a status-only command.
pub(crate) fn decode_status(body: &[u8]) -> Result<ApiResponse, Error> {
    let response = status(body)?;
    if response.status.is_empty() {
        // Status-only commands must say whether they worked.
        return Err(Error::deserialization(
            "missing status field",
            &String::from_utf8_lossy(body),
        ));
    }
    Ok(response)
}
