//! Streaming bags of vectors against a mock service.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use optimum_cli::stream_bags;
use optimum_client::{OptimumClient, Transport, WriterConfig};
use optimum_types::{Cask, KeyPolicy};

fn client(server: &MockServer) -> OptimumClient {
    OptimumClient::new(Transport::new(server.uri(), None, Duration::from_secs(5)).unwrap())
}

fn cask() -> Cask {
    "hnsw:test".parse().unwrap()
}

async fn accept_objects(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/ds/hnsw/test/object"))
        .respond_with(ResponseTemplate::new(202))
        .mount(server)
        .await;
}

async fn bag_keys(server: &MockServer) -> Vec<Vec<String>> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| {
            let body: Value = serde_json::from_slice(&r.body).unwrap();
            body["object"]
                .as_array()
                .unwrap()
                .iter()
                .map(|v| v["id"].as_str().unwrap().to_string())
                .collect()
        })
        .collect()
}

#[tokio::test]
async fn test_stream_sends_bags_of_chunk_records() {
    let server = MockServer::start().await;
    accept_objects(&server).await;

    let input = "a 1\nb 2\nc 3\nd 4\ne 5\n";
    let (records, bags) = stream_bags(
        &client(&server),
        &cask(),
        &WriterConfig::default(),
        2,
        input.as_bytes(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!((records, bags), (5, 3));
    // "a" .. "e" in base64
    assert_eq!(
        bag_keys(&server).await,
        vec![
            vec!["YQ==".to_string(), "Yg==".to_string()],
            vec!["Yw==".to_string(), "ZA==".to_string()],
            vec!["ZQ==".to_string()],
        ]
    );
}

#[tokio::test]
async fn test_stream_empty_input_sends_nothing() {
    let server = MockServer::start().await;
    accept_objects(&server).await;

    let (records, bags) = stream_bags(
        &client(&server),
        &cask(),
        &WriterConfig::default(),
        100,
        "\n".as_bytes(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!((records, bags), (0, 0));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_stream_applies_reject_policy_before_sending() {
    let server = MockServer::start().await;
    accept_objects(&server).await;

    let config = WriterConfig {
        key_policy: KeyPolicy::Reject,
        ..WriterConfig::default()
    };
    let long_key = "k".repeat(40);
    let input = format!("a 1\n{} 2\n", long_key);

    let result = stream_bags(
        &client(&server),
        &cask(),
        &config,
        100,
        input.as_bytes(),
        &CancellationToken::new(),
    )
    .await;

    assert!(result.is_err());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_stream_stops_at_first_scan_error() {
    let server = MockServer::start().await;
    accept_objects(&server).await;

    let result = stream_bags(
        &client(&server),
        &cask(),
        &WriterConfig::default(),
        1,
        "a 1\nb oops\nc 3\n".as_bytes(),
        &CancellationToken::new(),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(bag_keys(&server).await, vec![vec!["YQ==".to_string()]]);
}
