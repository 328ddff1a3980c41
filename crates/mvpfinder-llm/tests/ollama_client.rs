//! Integration tests for `OllamaClient` against a local `wiremock` server.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mvpfinder_llm::{LlmError, OllamaClient, PullStatus};

const MODEL: &str = "llama3.2:1b";

fn client_for(server: &MockServer) -> OllamaClient {
    OllamaClient::new(&server.uri(), MODEL).expect("failed to build test OllamaClient")
}

/// A client pointed at a port nothing listens on.
fn unreachable_client() -> OllamaClient {
    OllamaClient::new("http://127.0.0.1:9", MODEL).expect("failed to build test OllamaClient")
}

async fn mount_version(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "version": "0.5.7" })))
        .mount(server)
        .await;
}

async fn mount_tags(server: &MockServer, names: &[&str]) {
    let models: Vec<serde_json::Value> = names.iter().map(|n| json!({ "name": n })).collect();
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": models })))
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// availability
// ---------------------------------------------------------------------------

#[tokio::test]
async fn is_available_true_on_version_200() {
    let server = MockServer::start().await;
    mount_version(&server).await;
    assert!(client_for(&server).is_available().await);
}

#[tokio::test]
async fn is_available_false_on_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/version"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    assert!(!client_for(&server).is_available().await);
}

#[tokio::test]
async fn is_available_ignores_non_json_version_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/version"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Ollama is running"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.is_available().await);
    assert!(client.try_ping().await.is_ok());
    assert!(matches!(
        client.try_version().await,
        Err(LlmError::Decode { .. })
    ));
}

#[tokio::test]
async fn try_ping_reports_unreachable_and_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/version"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    assert!(matches!(
        client_for(&server).try_ping().await,
        Err(LlmError::Status { status: 502, .. })
    ));
    assert!(matches!(
        unreachable_client().try_ping().await,
        Err(LlmError::Unreachable { .. })
    ));
}

#[tokio::test]
async fn try_version_distinguishes_unreachable_from_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/version"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let status_err = client_for(&server).try_version().await.unwrap_err();
    assert!(
        matches!(status_err, LlmError::Status { status: 500, ref body, .. } if body == "boom"),
        "expected Status(500), got: {status_err:?}"
    );

    let unreachable_err = unreachable_client().try_version().await.unwrap_err();
    assert!(
        matches!(unreachable_err, LlmError::Unreachable { .. }),
        "expected Unreachable, got: {unreachable_err:?}"
    );
}

#[tokio::test]
async fn is_model_available_accepts_latest_suffix() {
    let server = MockServer::start().await;
    mount_tags(&server, &["mistral:latest", "llama3.2:1b"]).await;
    let client = client_for(&server);

    assert!(client.is_model_available("mistral").await);
    assert!(client.is_model_available("llama3.2:1b").await);
    assert!(!client.is_model_available("phi3").await);
}

#[tokio::test]
async fn status_reports_ready_when_model_installed() {
    let server = MockServer::start().await;
    mount_version(&server).await;
    mount_tags(&server, &[MODEL]).await;

    let status = client_for(&server).status().await;
    assert!(status.available);
    assert!(status.model_available);
    assert!(status.ready);
    assert_eq!(status.model, MODEL);
    assert_eq!(status.host, server.uri());
}

#[tokio::test]
async fn status_not_ready_when_model_missing() {
    let server = MockServer::start().await;
    mount_version(&server).await;
    mount_tags(&server, &["other:7b"]).await;

    let status = client_for(&server).status().await;
    assert!(status.available);
    assert!(!status.model_available);
    assert!(!status.ready);
}

#[tokio::test]
async fn status_skips_model_check_when_server_down() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/version"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let status = client_for(&server).status().await;
    assert!(!status.available);
    assert!(!status.model_available);
    assert!(!status.ready);
}

// ---------------------------------------------------------------------------
// pull
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pull_model_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pull"))
        .and(body_partial_json(json!({ "name": MODEL, "stream": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client_for(&server).pull_model(MODEL).await;
    assert_eq!(outcome.status, PullStatus::Success);
    assert!(outcome.message.contains(MODEL));
}

#[tokio::test]
async fn pull_model_error_carries_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pull"))
        .respond_with(ResponseTemplate::new(500).set_body_string("pull model manifest: file does not exist"))
        .mount(&server)
        .await;

    let outcome = client_for(&server).pull_model("nope:1b").await;
    assert_eq!(outcome.status, PullStatus::Error);
    assert!(outcome.message.contains("file does not exist"));
}

#[tokio::test]
async fn pull_model_unreachable_is_error_outcome() {
    let outcome = unreachable_client().pull_model(MODEL).await;
    assert_eq!(outcome.status, PullStatus::Error);
}

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generate_sends_model_and_options() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": MODEL,
            "prompt": "hello",
            "stream": false,
            "options": { "temperature": 0.3, "num_predict": 2000 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": MODEL,
            "response": "{\"summary\": \"ok\"}",
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = client_for(&server)
        .generate("hello", Duration::from_secs(5))
        .await;
    assert_eq!(text.as_deref(), Some("{\"summary\": \"ok\"}"));
}

#[tokio::test]
async fn generate_none_on_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
        .mount(&server)
        .await;

    assert!(client_for(&server)
        .generate("hello", Duration::from_secs(5))
        .await
        .is_none());
}

#[tokio::test]
async fn generate_none_on_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "  " })))
        .mount(&server)
        .await;

    assert!(client_for(&server)
        .generate("hello", Duration::from_secs(5))
        .await
        .is_none());
}

#[tokio::test]
async fn generate_none_on_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .try_generate("hello", Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Decode { .. }), "got: {err:?}");
    assert!(client.generate("hello", Duration::from_secs(5)).await.is_none());
}

#[tokio::test]
async fn generate_none_on_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "response": "late" }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .try_generate("hello", Duration::from_millis(100))
        .await
        .unwrap_err();
    assert!(err.is_timeout(), "expected timeout, got: {err:?}");
    assert!(client
        .generate("hello", Duration::from_millis(100))
        .await
        .is_none());
}
