#![allow(clippy::unwrap_used)]
// Round trip against a real appliance. Runs only when `INTEGRATION` is set,
// with `LOADMASTER_SERVER` and `LOADMASTER_API_KEY` pointing at a lab unit.
// The test creates and deletes a VS with a Real Server.

use lmclient_api::{
    ApiVersion, Credentials, LoadMasterClient, RealServer, TransportConfig, VirtualService,
};

fn live_client(version: ApiVersion) -> Option<LoadMasterClient> {
    std::env::var_os("INTEGRATION")?;
    let server = std::env::var("LOADMASTER_SERVER").ok()?;
    let key = std::env::var("LOADMASTER_API_KEY").ok()?;
    let base = if server.starts_with("http") {
        server
    } else {
        format!("https://{server}")
    };
    Some(
        LoadMasterClient::new(
            &base,
            Credentials::api_key(key),
            version,
            &TransportConfig::default(),
        )
        .unwrap(),
    )
}

async fn round_trip(client: &LoadMasterClient, nickname: &str) {
    let vs = client
        .create_vs(&VirtualService {
            address: "10.254.254.254".into(),
            port: "6443".into(),
            protocol: "tcp".into(),
            nickname: nickname.into(),
            enable: true,
            layer: 4,
            ..VirtualService::default()
        })
        .await
        .unwrap();
    assert_eq!(vs.nickname, nickname);

    let found = client.get_vs_by_name(nickname).await.unwrap();
    assert_eq!(found.index, vs.index);

    let rs = client
        .create_rs(&RealServer {
            vs_index: vs.index,
            addr: "10.254.254.253".into(),
            port: 8080,
            ..RealServer::default()
        })
        .await
        .unwrap();
    assert_eq!(client.list_rs(vs.index).await.unwrap().len(), 1);

    client.delete_rs(vs.index, rs.rs_index).await.unwrap();
    client.delete_vs(vs.index).await.unwrap();

    let gone = client.get_vs(vs.index).await.unwrap_err();
    assert!(gone.is_not_found(), "got: {gone:?}");
}

#[tokio::test]
async fn live_round_trip_v2() {
    let Some(client) = live_client(ApiVersion::V2) else {
        return;
    };
    round_trip(&client, "lmclient-live-v2").await;
}

#[tokio::test]
async fn live_round_trip_v1() {
    let Some(client) = live_client(ApiVersion::V1) else {
        return;
    };
    round_trip(&client, "lmclient-live-v1").await;
}
