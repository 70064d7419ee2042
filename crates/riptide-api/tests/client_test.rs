#![allow(clippy::unwrap_used)]
// Integration tests for `TransmissionClient` using wiremock.

use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use riptide_api::{
    AddSource, Credentials, Error, QueueDirection, SESSION_ID_HEADER, TransmissionClient,
    WORKING_FIELDS,
};

// ── Helpers ─────────────────────────────────────────────────────────

const RPC: &str = "/transmission/rpc";

async fn setup() -> (MockServer, TransmissionClient) {
    let server = MockServer::start().await;
    let url = Url::parse(&format!("{}{RPC}", server.uri())).unwrap();
    let client = TransmissionClient::with_client(reqwest::Client::new(), url, None);
    (server, client)
}

fn success(arguments: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "result": "success",
        "arguments": arguments,
        "tag": 1
    }))
}

// ── Session id handshake ────────────────────────────────────────────

#[tokio::test]
async fn test_session_id_handshake_retries_once() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .and(header(SESSION_ID_HEADER, "sess-42"))
        .respond_with(success(json!({ "version": "4.0.5", "rpc-version": 17 })))
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .respond_with(ResponseTemplate::new(409).insert_header(SESSION_ID_HEADER, "sess-42"))
        .with_priority(2)
        .expect(1)
        .mount(&server)
        .await;

    let info = client.session_get(&CancellationToken::new()).await.unwrap();

    assert_eq!(info.version, "4.0.5");
    assert_eq!(info.rpc_version, 17);
    assert_eq!(client.session_id().as_deref(), Some("sess-42"));
}

#[tokio::test]
async fn test_repeated_conflict_is_a_handshake_failure() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .respond_with(ResponseTemplate::new(409).insert_header(SESSION_ID_HEADER, "again"))
        .mount(&server)
        .await;

    let result = client.session_stats(&CancellationToken::new()).await;
    assert!(
        matches!(result, Err(Error::SessionHandshake)),
        "expected SessionHandshake, got: {result:?}"
    );
}

// ── Envelope errors ─────────────────────────────────────────────────

#[tokio::test]
async fn test_non_success_result_is_rpc_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": "invalid or corrupt torrent file",
            "arguments": {}
        })))
        .mount(&server)
        .await;

    let result = client
        .torrent_add(
            &AddSource::Metainfo(b"not a torrent".to_vec()),
            None,
            false,
            &CancellationToken::new(),
        )
        .await;

    match result {
        Err(Error::Rpc { result }) => assert_eq!(result, "invalid or corrupt torrent file"),
        other => panic!("expected Rpc error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized User"))
        .mount(&server)
        .await;

    let result = client.session_get(&CancellationToken::new()).await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_basic_auth_header_is_sent() {
    let server = MockServer::start().await;
    let url = Url::parse(&format!("{}{RPC}", server.uri())).unwrap();
    let client = TransmissionClient::with_client(
        reqwest::Client::new(),
        url,
        Some(Credentials {
            username: "admin".into(),
            password: "secret".to_string().into(),
        }),
    );

    Mock::given(method("POST"))
        .and(path(RPC))
        .and(header_exists("authorization"))
        .respond_with(success(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    client
        .torrent_start(&[1], &CancellationToken::new())
        .await
        .unwrap();
}

// ── Torrent queries ─────────────────────────────────────────────────

#[tokio::test]
async fn test_torrent_get_decodes_projection() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .and(body_partial_json(json!({ "method": "torrent-get" })))
        .respond_with(success(json!({
            "torrents": [
                {
                    "id": 1,
                    "name": "ubuntu.iso",
                    "status": 4,
                    "rateDownload": 1024,
                    "rateUpload": 0,
                    "percentDone": 0.5,
                    "downloadDir": "/dl/iso",
                    "errorString": "",
                    "trackerStats": [{ "host": "t1", "lastAnnounceSucceeded": true }]
                },
                { "id": 2, "name": "idle", "status": 0, "downloadDir": "/dl/iso/" }
            ]
        })))
        .mount(&server)
        .await;

    let torrents = client
        .torrent_get(WORKING_FIELDS, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(torrents.len(), 2);
    assert_eq!(torrents[0].name.as_deref(), Some("ubuntu.iso"));
    assert_eq!(torrents[0].rate_download, Some(1024));
    assert_eq!(torrents[1].download_dir.as_deref(), Some("/dl/iso/"));
    assert!(torrents[1].tracker_stats.is_none());
}

#[tokio::test]
async fn test_queue_move_uses_direction_method() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .and(body_partial_json(
            json!({ "method": "queue-move-up", "arguments": { "ids": [3, 4] } }),
        ))
        .respond_with(success(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    client
        .queue_move(QueueDirection::Up, &[3, 4], &CancellationToken::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_torrent_add_accepts_duplicate() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .and(body_partial_json(json!({
            "method": "torrent-add",
            "arguments": { "filename": "magnet:?xt=urn:btih:abc", "paused": true }
        })))
        .respond_with(success(json!({
            "torrent-duplicate": { "id": 9, "name": "dup", "hashString": "abc" }
        })))
        .mount(&server)
        .await;

    let added = client
        .torrent_add(
            &AddSource::Link("magnet:?xt=urn:btih:abc".into()),
            None,
            true,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(added.id, 9);
    assert_eq!(added.hash_string, "abc");
}

// ── Transport classification ────────────────────────────────────────

#[tokio::test]
async fn test_unknown_host_is_name_resolution_failure() {
    let url = Url::parse("http://riptide-test.invalid:9091/transmission/rpc").unwrap();
    let client = TransmissionClient::with_client(reqwest::Client::new(), url, None);

    let result = client.session_get(&CancellationToken::new()).await;
    match result {
        Err(Error::NameResolution { host, .. }) => assert_eq!(host, "riptide-test.invalid"),
        other => panic!("expected NameResolution, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_cancelled_call_returns_cancelled() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .respond_with(success(json!({})).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let result = client.torrent_stop(&[1], &cancel).await;
    assert!(
        matches!(result, Err(Error::Cancelled)),
        "expected Cancelled, got: {result:?}"
    );
}
