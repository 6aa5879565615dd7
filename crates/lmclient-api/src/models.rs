// Resource models shared by both API generations
//
// Field names on the serde side are the v2 JSON keys. The legacy XML codec
// decodes into its own text-only records and converts into these types.
// Fields use container-level `#[serde(default)]` because the appliance omits
// keys freely across firmware versions.

use serde::{Deserialize, Serialize};

use crate::de::{flag_bool, lenient_number, lenient_string};

// ── Status ───────────────────────────────────────────────────────────

/// Outcome of a status-only command (`delvs`, `delrs`, `modrs`).
///
/// On v1 `code` comes from the `stat` attribute and `status` from the
/// `code` attribute of `<Response>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiResponse {
    #[serde(deserialize_with = "lenient_number")]
    pub code: u16,
    #[serde(deserialize_with = "lenient_string")]
    pub message: String,
    #[serde(deserialize_with = "lenient_string")]
    pub status: String,
}

impl ApiResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

// ── Virtual Service ──────────────────────────────────────────────────

/// Entry from `listvs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VsSummary {
    #[serde(rename = "Index", deserialize_with = "lenient_number")]
    pub index: u32,
    #[serde(rename = "NickName", deserialize_with = "lenient_string")]
    pub nickname: String,
    #[serde(rename = "VSAddress", deserialize_with = "lenient_string")]
    pub address: String,
    #[serde(rename = "VSPort", deserialize_with = "lenient_string")]
    pub port: String,
    #[serde(rename = "Protocol", deserialize_with = "lenient_string")]
    pub protocol: String,
    /// `Up`, `Down`, `Disabled`, ...
    #[serde(rename = "Status", deserialize_with = "lenient_string")]
    pub status: String,
}

/// A Virtual Service as shown by `showvs`, and the input to `addvs`/`modvs`.
///
/// `port` is the request-side port; `vs_port` is what the appliance reports
/// back. `force_l4`/`force_l7` are read-only: requests derive them from
/// `layer`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualService {
    #[serde(rename = "Index", deserialize_with = "lenient_number")]
    pub index: u32,
    #[serde(rename = "VSAddress", deserialize_with = "lenient_string")]
    pub address: String,
    #[serde(rename = "Port", deserialize_with = "lenient_string")]
    pub port: String,
    #[serde(rename = "VSPort", deserialize_with = "lenient_string")]
    pub vs_port: String,
    #[serde(rename = "NickName", deserialize_with = "lenient_string")]
    pub nickname: String,
    #[serde(rename = "VSType", alias = "VStype", deserialize_with = "lenient_string")]
    pub vs_type: String,
    #[serde(rename = "Protocol", deserialize_with = "lenient_string")]
    pub protocol: String,
    #[serde(rename = "Enable", deserialize_with = "flag_bool")]
    pub enable: bool,
    #[serde(rename = "ForceL4", deserialize_with = "flag_bool")]
    pub force_l4: bool,
    #[serde(rename = "ForceL7", deserialize_with = "flag_bool")]
    pub force_l7: bool,
    #[serde(rename = "Layer", deserialize_with = "lenient_number")]
    pub layer: u8,
    #[serde(rename = "DefaultGW", deserialize_with = "lenient_string")]
    pub default_gw: String,
    #[serde(rename = "CheckType", deserialize_with = "lenient_string")]
    pub check_type: String,
    #[serde(rename = "CheckUrl", deserialize_with = "lenient_string")]
    pub check_url: String,
    #[serde(rename = "CheckCodes", deserialize_with = "lenient_string")]
    pub check_codes: String,
    #[serde(rename = "CheckPort", deserialize_with = "lenient_string")]
    pub check_port: String,
    /// Real servers attached to this VS, as embedded in `showvs`.
    #[serde(rename = "Rs", alias = "RS")]
    pub real_servers: Vec<RealServer>,
}

impl VirtualService {
    /// `(forcel4, forcel7)` request flags: layer 4 forces L4, anything
    /// else forces L7.
    pub fn force_flags(&self) -> (u8, u8) {
        if self.layer == 4 { (1, 0) } else { (0, 1) }
    }

    /// `vs_port` as an integer, 0 when it is not numeric.
    pub fn vs_port_number(&self) -> u16 {
        self.vs_port.trim().parse().unwrap_or(0)
    }
}

// ── Real Server ──────────────────────────────────────────────────────

/// A Real Server behind a Virtual Service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealServer {
    #[serde(rename = "VSIndex", deserialize_with = "lenient_number")]
    pub vs_index: u32,
    #[serde(rename = "RsIndex", deserialize_with = "lenient_number")]
    pub rs_index: u32,
    #[serde(rename = "Addr", deserialize_with = "lenient_string")]
    pub addr: String,
    #[serde(rename = "Port", deserialize_with = "lenient_number")]
    pub port: u16,
    /// Target port for `modrs`. Never returned by the appliance.
    #[serde(skip)]
    pub new_port: Option<u16>,
    #[serde(rename = "DnsName", deserialize_with = "lenient_string")]
    pub dns_name: String,
    #[serde(rename = "Forward", deserialize_with = "lenient_string")]
    pub forward: String,
    #[serde(rename = "Weight", deserialize_with = "lenient_number")]
    pub weight: u32,
    #[serde(rename = "Limit", deserialize_with = "lenient_number")]
    pub limit: u32,
    #[serde(rename = "RateLimit", deserialize_with = "lenient_number")]
    pub rate_limit: u32,
    #[serde(rename = "Follow", deserialize_with = "lenient_number")]
    pub follow: u32,
    #[serde(rename = "Nrules", deserialize_with = "lenient_number")]
    pub nrules: u32,
    #[serde(rename = "Enable", deserialize_with = "flag_bool")]
    pub enable: bool,
}

impl RealServer {
    /// The `rs` selector for an existing server: `!{rs_index}`.
    pub(crate) fn selector(rs_index: u32) -> String {
        format!("!{rs_index}")
    }
}
