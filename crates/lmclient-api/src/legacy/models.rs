// Legacy (v1) XML wire records
//
// Every v1 response is a `<Response stat=".." code="..">` document. Data
// commands nest their payload under `<Success><Data>`; status commands put a
// plain message in `<Success>` or `<Error>`. XML carries only text, so the
// records here are all strings and get parsed into the typed models in a
// second step.

use std::str::FromStr;

use serde::Deserialize;

use crate::de::parse_flag;
use crate::models::{RealServer, VirtualService, VsSummary};

// ── Envelopes ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<D> {
    #[serde(rename = "@stat", default)]
    pub stat: String,
    #[serde(rename = "@code", default)]
    pub code: String,
    #[serde(rename = "Success")]
    pub success: Option<SuccessData<D>>,
    #[serde(rename = "Error")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SuccessData<D> {
    #[serde(rename = "Data")]
    pub data: D,
}

/// Envelope of status-only commands and of most error replies.
#[derive(Debug, Deserialize)]
pub(crate) struct StatusEnvelope {
    #[serde(rename = "@stat", default)]
    pub stat: String,
    #[serde(rename = "@code", default)]
    pub code: String,
    #[serde(rename = "Success")]
    pub success: Option<SuccessText>,
    #[serde(rename = "Error")]
    pub error: Option<String>,
}

/// Direct text of a `<Success>` element. Some firmware echoes a `<Data>`
/// record after `modrs`/`delrs`; child elements are skipped.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SuccessText {
    #[serde(rename = "$text")]
    pub text: String,
}

// ── Conversion ───────────────────────────────────────────────────────

/// A wire record that converts into a typed model. The error is a
/// human-readable description of the offending field.
pub(crate) trait IntoModel {
    type Model;

    fn into_model(self) -> Result<Self::Model, String>;
}

fn number<T: FromStr + Default>(field: &str, raw: &str) -> Result<T, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(T::default());
    }
    trimmed
        .parse()
        .map_err(|_| format!("invalid {field}: {raw:?}"))
}

fn flag(field: &str, raw: &str) -> Result<bool, String> {
    parse_flag(raw).ok_or_else(|| format!("invalid {field}: {raw:?}"))
}

// ── Virtual Service ──────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct XmlVsList {
    #[serde(rename = "VS")]
    pub vs: Vec<XmlVsSummary>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct XmlVsSummary {
    #[serde(rename = "Index")]
    pub index: String,
    #[serde(rename = "NickName")]
    pub nickname: String,
    #[serde(rename = "VSAddress")]
    pub address: String,
    #[serde(rename = "VSPort")]
    pub port: String,
    #[serde(rename = "Protocol")]
    pub protocol: String,
    #[serde(rename = "Status")]
    pub status: String,
}

impl IntoModel for XmlVsList {
    type Model = Vec<VsSummary>;

    fn into_model(self) -> Result<Self::Model, String> {
        self.vs
            .into_iter()
            .map(|v| {
                Ok(VsSummary {
                    index: number("Index", &v.index)?,
                    nickname: v.nickname,
                    address: v.address,
                    port: v.port,
                    protocol: v.protocol,
                    status: v.status,
                })
            })
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct XmlVs {
    #[serde(rename = "Index")]
    pub index: String,
    #[serde(rename = "VSAddress")]
    pub address: String,
    #[serde(rename = "Port")]
    pub port: String,
    #[serde(rename = "VSPort")]
    pub vs_port: String,
    #[serde(rename = "NickName")]
    pub nickname: String,
    #[serde(rename = "VStype", alias = "VSType")]
    pub vs_type: String,
    #[serde(rename = "Protocol")]
    pub protocol: String,
    #[serde(rename = "Enable")]
    pub enable: String,
    #[serde(rename = "ForceL4")]
    pub force_l4: String,
    #[serde(rename = "ForceL7")]
    pub force_l7: String,
    #[serde(rename = "Layer")]
    pub layer: String,
    #[serde(rename = "DefaultGW")]
    pub default_gw: String,
    #[serde(rename = "CheckType")]
    pub check_type: String,
    #[serde(rename = "CheckUrl")]
    pub check_url: String,
    #[serde(rename = "CheckCodes")]
    pub check_codes: String,
    #[serde(rename = "CheckPort")]
    pub check_port: String,
    #[serde(rename = "Rs")]
    pub rs: Vec<XmlRs>,
}

impl IntoModel for XmlVs {
    type Model = VirtualService;

    fn into_model(self) -> Result<Self::Model, String> {
        Ok(VirtualService {
            index: number("Index", &self.index)?,
            address: self.address,
            port: self.port,
            vs_port: self.vs_port,
            nickname: self.nickname,
            vs_type: self.vs_type,
            protocol: self.protocol,
            enable: flag("Enable", &self.enable)?,
            force_l4: flag("ForceL4", &self.force_l4)?,
            force_l7: flag("ForceL7", &self.force_l7)?,
            layer: number("Layer", &self.layer)?,
            default_gw: self.default_gw,
            check_type: self.check_type,
            check_url: self.check_url,
            check_codes: self.check_codes,
            check_port: self.check_port,
            real_servers: self
                .rs
                .into_iter()
                .map(IntoModel::into_model)
                .collect::<Result<_, _>>()?,
        })
    }
}

// ── Real Server ──────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct XmlRsList {
    #[serde(rename = "Rs")]
    pub rs: Vec<XmlRs>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct XmlRs {
    #[serde(rename = "VSIndex")]
    pub vs_index: String,
    #[serde(rename = "RsIndex")]
    pub rs_index: String,
    #[serde(rename = "Addr")]
    pub addr: String,
    #[serde(rename = "Port")]
    pub port: String,
    #[serde(rename = "DnsName")]
    pub dns_name: String,
    #[serde(rename = "Forward")]
    pub forward: String,
    #[serde(rename = "Weight")]
    pub weight: String,
    #[serde(rename = "Limit")]
    pub limit: String,
    #[serde(rename = "RateLimit")]
    pub rate_limit: String,
    #[serde(rename = "Follow")]
    pub follow: String,
    #[serde(rename = "Nrules")]
    pub nrules: String,
    #[serde(rename = "Enable")]
    pub enable: String,
}

impl IntoModel for XmlRs {
    type Model = RealServer;

    fn into_model(self) -> Result<Self::Model, String> {
        Ok(RealServer {
            vs_index: number("VSIndex", &self.vs_index)?,
            rs_index: number("RsIndex", &self.rs_index)?,
            addr: self.addr,
            port: number("Port", &self.port)?,
            new_port: None,
            dns_name: self.dns_name,
            forward: self.forward,
            weight: number("Weight", &self.weight)?,
            limit: number("Limit", &self.limit)?,
            rate_limit: number("RateLimit", &self.rate_limit)?,
            follow: number("Follow", &self.follow)?,
            nrules: number("Nrules", &self.nrules)?,
            enable: flag("Enable", &self.enable)?,
        })
    }
}

impl IntoModel for XmlRsList {
    type Model = Vec<RealServer>;

    fn into_model(self) -> Result<Self::Model, String> {
        self.rs.into_iter().map(IntoModel::into_model).collect()
    }
}
