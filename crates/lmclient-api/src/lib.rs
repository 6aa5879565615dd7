//! Async client for a LoadMaster appliance's management API.
//!
//! One [`LoadMasterClient`] speaks either API generation, picked by
//! [`ApiVersion`]:
//!
//! - **v1**: `GET /access/{cmd}` with query-string parameters, API key in
//!   the query or HTTP basic auth, XML replies (possibly Latin-1).
//! - **v2**: `POST /accessv2` with a JSON body carrying the command and
//!   credentials, JSON replies.
//!
//! Both surface the same typed models ([`VirtualService`], [`VsSummary`],
//! [`RealServer`], [`ApiResponse`]) and the same [`Error`].

mod client;
mod command;
mod de;
mod legacy;
mod rs;
mod v2;
mod vs;

pub mod auth;
pub mod error;
pub mod models;
pub mod transport;

pub use auth::{ApiVersion, Credentials};
pub use client::LoadMasterClient;
pub use error::Error;
pub use models::{ApiResponse, RealServer, VirtualService, VsSummary};
pub use transport::{ConsistencyPolicy, TlsMode, TransportConfig};
