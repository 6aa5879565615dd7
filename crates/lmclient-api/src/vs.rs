// Virtual Service operations
//
// listvs / showvs / addvs / modvs / delvs. Request field names differ
// between the v1 query string and the v2 JSON body; both shapes are built
// here from the same `VirtualService`.

use serde::Serialize;
use tracing::{debug, warn};

use crate::client::LoadMasterClient;
use crate::command::{NoParams, Params, Query, is_empty, is_zero};
use crate::de::flag;
use crate::error::Error;
use crate::legacy::models::{XmlVs, XmlVsList};
use crate::models::{ApiResponse, VirtualService, VsSummary};
use crate::v2::VsList;

// ── Request shapes ───────────────────────────────────────────────────

#[derive(Serialize)]
struct VsIndex {
    #[serde(rename = "vs")]
    index: u32,
}

impl Params for VsIndex {
    fn query(&self) -> Query {
        Query::new().with("vs", self.index)
    }
}

/// Settings shared by `addvs` and `modvs`.
#[derive(Serialize)]
struct VsSettings<'a> {
    #[serde(rename = "NickName", skip_serializing_if = "is_empty")]
    nickname: &'a str,
    #[serde(rename = "VStype", skip_serializing_if = "is_empty")]
    vs_type: &'a str,
    #[serde(rename = "prot", skip_serializing_if = "is_empty")]
    protocol: &'a str,
    #[serde(rename = "Enable")]
    enable: &'static str,
    #[serde(rename = "ForceL4", skip_serializing_if = "is_zero")]
    force_l4: u8,
    #[serde(rename = "ForceL7", skip_serializing_if = "is_zero")]
    force_l7: u8,
    #[serde(rename = "DefaultGW", skip_serializing_if = "is_empty")]
    default_gw: &'a str,
    #[serde(rename = "CheckType", skip_serializing_if = "is_empty")]
    check_type: &'a str,
    #[serde(rename = "CheckUrl", skip_serializing_if = "is_empty")]
    check_url: &'a str,
    #[serde(rename = "CheckCodes", skip_serializing_if = "is_empty")]
    check_codes: &'a str,
    #[serde(rename = "CheckPort", skip_serializing_if = "is_empty")]
    check_port: &'a str,
}

impl<'a> VsSettings<'a> {
    fn new(vs: &'a VirtualService) -> Self {
        let (force_l4, force_l7) = vs.force_flags();
        Self {
            nickname: &vs.nickname,
            vs_type: &vs.vs_type,
            protocol: &vs.protocol,
            enable: flag(vs.enable),
            force_l4,
            force_l7,
            default_gw: &vs.default_gw,
            check_type: &vs.check_type,
            check_url: &vs.check_url,
            check_codes: &vs.check_codes,
            check_port: &vs.check_port,
        }
    }

    /// Legacy query keys. `addvs` and `modvs` spell the nickname and type
    /// keys differently; the force flags are always sent.
    fn append(&self, query: Query, nickname_key: &'static str, type_key: &'static str) -> Query {
        query
            .with_nonempty(nickname_key, self.nickname)
            .with_nonempty(type_key, self.vs_type)
            .with_nonempty("prot", self.protocol)
            .with("Enable", self.enable)
            .with("forcel4", self.force_l4)
            .with("forcel7", self.force_l7)
            .with_nonempty("defaultgw", self.default_gw)
            .with_nonempty("checktype", self.check_type)
            .with_nonempty("checkurl", self.check_url)
            .with_nonempty("checkcodes", self.check_codes)
            .with_nonempty("checkport", self.check_port)
    }
}

#[derive(Serialize)]
struct AddVs<'a> {
    #[serde(rename = "vs")]
    address: &'a str,
    port: &'a str,
    #[serde(flatten)]
    settings: VsSettings<'a>,
}

impl Params for AddVs<'_> {
    fn query(&self) -> Query {
        let query = Query::new().with("vs", self.address).with("port", self.port);
        self.settings.append(query, "nickname", "vstype")
    }
}

#[derive(Serialize)]
struct ModVs<'a> {
    #[serde(rename = "vs")]
    index: u32,
    #[serde(rename = "vsaddress")]
    address: &'a str,
    port: &'a str,
    #[serde(rename = "vsport")]
    vs_port: u16,
    #[serde(flatten)]
    settings: VsSettings<'a>,
}

impl Params for ModVs<'_> {
    fn query(&self) -> Query {
        let query = Query::new()
            .with("vs", self.index)
            .with("vsaddress", self.address)
            .with("port", self.port)
            .with_nonzero("vsport", u64::from(self.vs_port));
        self.settings.append(query, "NickName", "VSType")
    }
}

// ── Operations ───────────────────────────────────────────────────────

impl LoadMasterClient {
    /// List all Virtual Services.
    ///
    /// `listvs`
    pub async fn list_vs(&self) -> Result<Vec<VsSummary>, Error> {
        debug!("listing virtual services");
        self.fetch::<_, XmlVsList, VsList, _>("listvs", &NoParams {})
            .await
    }

    /// Find a Virtual Service by nickname. The first match wins.
    pub async fn get_vs_by_name(&self, nickname: &str) -> Result<VsSummary, Error> {
        self.list_vs()
            .await?
            .into_iter()
            .find(|vs| vs.nickname == nickname)
            .ok_or_else(|| Error::NotFound {
                kind: "Virtual Service",
                name: nickname.to_owned(),
            })
    }

    /// Show one Virtual Service, including its Real Servers.
    ///
    /// `showvs vs={index}`
    pub async fn get_vs(&self, index: u32) -> Result<VirtualService, Error> {
        debug!(index, "showing virtual service");
        self.fetch::<_, XmlVs, VirtualService, _>("showvs", &VsIndex { index })
            .await
    }

    /// Create a Virtual Service and return it as the appliance reports it.
    ///
    /// `addvs`, then a settle delay and a `showvs` of the new index. If the
    /// appliance does not know the new VS yet, waits a random jitter and
    /// returns the not-found error.
    pub async fn create_vs(&self, vs: &VirtualService) -> Result<VirtualService, Error> {
        debug!(address = %vs.address, port = %vs.port, "creating virtual service");
        let params = AddVs {
            address: &vs.address,
            port: &vs.port,
            settings: VsSettings::new(vs),
        };
        let created: VirtualService = self
            .fetch::<_, XmlVs, VirtualService, _>("addvs", &params)
            .await?;

        let policy = self.consistency();
        if !policy.settle_delay.is_zero() {
            tokio::time::sleep(policy.settle_delay).await;
        }

        match self.get_vs(created.index).await {
            Err(err) if err.is_not_found() => {
                warn!(index = created.index, "newly created virtual service not found");
                let jitter = policy.jitter();
                if !jitter.is_zero() {
                    tokio::time::sleep(jitter).await;
                }
                Err(err)
            }
            other => other,
        }
    }

    /// Modify a Virtual Service addressed by `vs.index`.
    ///
    /// `modvs`. Returns the VS as echoed by the appliance.
    pub async fn modify_vs(&self, vs: &VirtualService) -> Result<VirtualService, Error> {
        debug!(index = vs.index, "modifying virtual service");
        let params = ModVs {
            index: vs.index,
            address: &vs.address,
            port: &vs.port,
            vs_port: vs.vs_port_number(),
            settings: VsSettings::new(vs),
        };
        self.fetch::<_, XmlVs, VirtualService, _>("modvs", &params)
            .await
    }

    /// Delete a Virtual Service.
    ///
    /// `delvs vs={index}`
    pub async fn delete_vs(&self, index: u32) -> Result<ApiResponse, Error> {
        debug!(index, "deleting virtual service");
        self.execute("delvs", &VsIndex { index }).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn sample() -> VirtualService {
        VirtualService {
            address: "192.168.1.235".into(),
            port: "6443".into(),
            nickname: "kube".into(),
            protocol: "tcp".into(),
            enable: true,
            layer: 4,
            ..VirtualService::default()
        }
    }

    fn owned(q: &Query) -> Vec<(&str, &str)> {
        q.pairs().iter().map(|(k, v)| (*k, v.as_str())).collect()
    }

    #[test]
    fn addvs_query_uses_lowercase_keys_and_both_force_flags() {
        let vs = sample();
        let params = AddVs {
            address: &vs.address,
            port: &vs.port,
            settings: VsSettings::new(&vs),
        };
        assert_eq!(
            owned(&params.query()),
            vec![
                ("vs", "192.168.1.235"),
                ("port", "6443"),
                ("nickname", "kube"),
                ("prot", "tcp"),
                ("Enable", "Y"),
                ("forcel4", "1"),
                ("forcel7", "0"),
            ]
        );
    }

    #[test]
    fn addvs_body_omits_zero_force_flag() {
        let vs = sample();
        let params = AddVs {
            address: &vs.address,
            port: &vs.port,
            settings: VsSettings::new(&vs),
        };
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({
                "vs": "192.168.1.235",
                "port": "6443",
                "NickName": "kube",
                "prot": "tcp",
                "Enable": "Y",
                "ForceL4": 1
            })
        );
    }

    #[test]
    fn modvs_shapes() {
        let vs = VirtualService {
            index: 9,
            vs_port: "8443".into(),
            vs_type: "http".into(),
            layer: 7,
            enable: false,
            ..sample()
        };
        let params = ModVs {
            index: vs.index,
            address: &vs.address,
            port: &vs.port,
            vs_port: vs.vs_port_number(),
            settings: VsSettings::new(&vs),
        };
        assert_eq!(
            owned(&params.query()),
            vec![
                ("vs", "9"),
                ("vsaddress", "192.168.1.235"),
                ("port", "6443"),
                ("vsport", "8443"),
                ("NickName", "kube"),
                ("VSType", "http"),
                ("prot", "tcp"),
                ("Enable", "N"),
                ("forcel4", "0"),
                ("forcel7", "1"),
            ]
        );
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({
                "vs": 9,
                "vsaddress": "192.168.1.235",
                "port": "6443",
                "vsport": 8443,
                "NickName": "kube",
                "VStype": "http",
                "prot": "tcp",
                "Enable": "N",
                "ForceL7": 1
            })
        );
    }

    #[test]
    fn modvs_v2_always_sends_vsport() {
        let vs = sample();
        let params = ModVs {
            index: 1,
            address: &vs.address,
            port: &vs.port,
            vs_port: vs.vs_port_number(),
            settings: VsSettings::new(&vs),
        };
        assert_eq!(serde_json::to_value(&params).unwrap()["vsport"], json!(0));
        assert!(!owned(&params.query()).iter().any(|(k, _)| *k == "vsport"));
    }
}
