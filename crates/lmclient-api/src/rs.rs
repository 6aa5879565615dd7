// Real Server operations
//
// addrs / showrs / modrs / delrs. Existing servers are addressed by their
// parent VS index plus an `rs=!{rs_index}` selector.

use serde::Serialize;
use tracing::debug;

use crate::client::LoadMasterClient;
use crate::command::{Params, Query, is_empty, is_zero};
use crate::error::Error;
use crate::legacy::models::XmlRsList;
use crate::models::{ApiResponse, RealServer};
use crate::v2::RsList;

// ── Request shapes ───────────────────────────────────────────────────

#[derive(Serialize)]
struct AddRs<'a> {
    vs: u32,
    #[serde(rename = "rs", skip_serializing_if = "is_empty")]
    addr: &'a str,
    #[serde(rename = "rsport", skip_serializing_if = "is_zero")]
    port: u16,
}

impl Params for AddRs<'_> {
    fn query(&self) -> Query {
        Query::new()
            .with("vs", self.vs)
            .with("rs", self.addr)
            .with("rsport", self.port)
    }
}

#[derive(Serialize)]
struct RsRef {
    vs: u32,
    rs: String,
}

impl RsRef {
    fn new(vs_index: u32, rs_index: u32) -> Self {
        Self {
            vs: vs_index,
            rs: RealServer::selector(rs_index),
        }
    }
}

impl Params for RsRef {
    fn query(&self) -> Query {
        Query::new().with("vs", self.vs).with("rs", &self.rs)
    }
}

#[derive(Serialize)]
struct ModRs {
    vs: u32,
    rs: String,
    /// Empty when no new port is requested.
    newport: String,
}

impl Params for ModRs {
    fn query(&self) -> Query {
        Query::new()
            .with("vs", self.vs)
            .with("rs", &self.rs)
            .with_nonempty("newport", &self.newport)
    }
}

/// First server of an `Rs` list, or [`Error::EmptyResponse`].
fn first(cmd: &'static str, servers: Vec<RealServer>) -> Result<RealServer, Error> {
    servers
        .into_iter()
        .next()
        .ok_or(Error::EmptyResponse { cmd })
}

// ── Operations ───────────────────────────────────────────────────────

impl LoadMasterClient {
    /// Add a Real Server to the VS at `rs.vs_index`.
    ///
    /// `addrs vs={vs_index} rs={addr} rsport={port}`
    pub async fn create_rs(&self, rs: &RealServer) -> Result<RealServer, Error> {
        debug!(vs_index = rs.vs_index, addr = %rs.addr, port = rs.port, "creating real server");
        let params = AddRs {
            vs: rs.vs_index,
            addr: &rs.addr,
            port: rs.port,
        };
        let servers = self
            .fetch::<_, XmlRsList, RsList, Vec<RealServer>>("addrs", &params)
            .await?;
        first("addrs", servers)
    }

    /// Show one Real Server.
    ///
    /// `showrs vs={vs_index} rs=!{rs_index}`
    pub async fn get_rs(&self, vs_index: u32, rs_index: u32) -> Result<RealServer, Error> {
        debug!(vs_index, rs_index, "showing real server");
        let servers = self
            .fetch::<_, XmlRsList, RsList, Vec<RealServer>>(
                "showrs",
                &RsRef::new(vs_index, rs_index),
            )
            .await?;
        first("showrs", servers)
    }

    /// All Real Servers of a VS, as embedded in `showvs`.
    pub async fn list_rs(&self, vs_index: u32) -> Result<Vec<RealServer>, Error> {
        Ok(self.get_vs(vs_index).await?.real_servers)
    }

    /// Modify a Real Server. Only the port can be changed, via
    /// `rs.new_port`.
    ///
    /// `modrs vs={vs_index} rs=!{rs_index} newport={new_port}`
    pub async fn modify_rs(&self, rs: &RealServer) -> Result<ApiResponse, Error> {
        debug!(vs_index = rs.vs_index, rs_index = rs.rs_index, new_port = ?rs.new_port, "modifying real server");
        let params = ModRs {
            vs: rs.vs_index,
            rs: RealServer::selector(rs.rs_index),
            newport: rs.new_port.map(|p| p.to_string()).unwrap_or_default(),
        };
        self.execute("modrs", &params).await
    }

    /// Remove a Real Server from its VS.
    ///
    /// `delrs vs={vs_index} rs=!{rs_index}`
    pub async fn delete_rs(&self, vs_index: u32, rs_index: u32) -> Result<ApiResponse, Error> {
        debug!(vs_index, rs_index, "deleting real server");
        self.execute("delrs", &RsRef::new(vs_index, rs_index))
            .await
    }
}
