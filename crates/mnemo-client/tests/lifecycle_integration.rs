//! Lifecycle tests against a mock service (attach mode).

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mnemo_client::{ClientConfig, LifecycleState, RetrievalClient, RetrievalError};

fn attach_config(server: &MockServer) -> ClientConfig {
    ClientConfig::new()
        .with_base_url(server.uri().parse().unwrap())
        .with_startup_timeout(Duration::from_millis(400))
        .with_health_interval(Duration::from_millis(50))
}

fn health_body(model_loaded: bool, status: &str) -> serde_json::Value {
    serde_json::json!({
        "status": status,
        "model_loaded": model_loaded,
        "collections": [],
    })
}

#[tokio::test]
async fn test_concurrent_initialize_converges_on_one_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(health_body(true, "healthy")))
        .expect(1) // a single attempt polls health exactly once
        .mount(&server)
        .await;

    let client = RetrievalClient::new(attach_config(&server));

    let (a, b) = tokio::join!(client.initialize(), client.initialize());
    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(client.state().await, LifecycleState::Ready);
    assert!(client.is_ready());
}

#[tokio::test]
async fn test_startup_timeout_when_model_never_loads() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(health_body(false, "healthy")))
        .mount(&server)
        .await;

    let client = RetrievalClient::new(attach_config(&server));

    let err = client.initialize().await.unwrap_err();
    assert!(matches!(err, RetrievalError::StartupTimeout(_)));
    assert!(err.is_fatal());

    assert!(matches!(client.state().await, LifecycleState::Failed(_)));
    assert!(!client.is_ready());
}

#[tokio::test]
async fn test_degraded_service_fails_fast() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(health_body(false, "degraded")))
        .mount(&server)
        .await;

    let client = RetrievalClient::new(attach_config(&server));

    let err = client.initialize().await.unwrap_err();
    assert!(matches!(err, RetrievalError::Initialization(_)));
}

#[tokio::test]
async fn test_failed_initialization_can_be_retried() {
    let server = MockServer::start().await;

    // First attempt sees a degraded service; the mock then expires and the
    // healthy one underneath takes over.
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(health_body(false, "degraded")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(health_body(true, "healthy")))
        .mount(&server)
        .await;

    let client = RetrievalClient::new(attach_config(&server));

    assert!(client.initialize().await.is_err());
    assert!(matches!(client.state().await, LifecycleState::Failed(_)));

    // Retry clears the prior error and re-runs the pipeline.
    client.initialize().await.unwrap();
    assert_eq!(client.state().await, LifecycleState::Ready);
}

#[tokio::test]
async fn test_operations_before_ready_are_empty_noops() {
    // No server at all; nothing must be dialed.
    let client = RetrievalClient::new(ClientConfig::new().with_binary("/nonexistent/bin"));

    assert_eq!(client.state().await, LifecycleState::Uninitialized);

    let bundle = client.search_tools("what time is it", 3, 0.1).await;
    assert!(bundle.is_empty());

    let memories = client.relevant_memories("anything", 5).await;
    assert!(memories.is_empty());

    let indexed = client
        .index_tools(&[mnemo_types::ToolDescriptor::new("t", "a tool")])
        .await
        .unwrap();
    assert_eq!(indexed, 0);

    client
        .index_memory(mnemo_types::MemoryDocument::new("a fact"))
        .await
        .unwrap();

    client.clear_namespace("conversation_history").await.unwrap();
}

#[tokio::test]
async fn test_missing_binary_is_fatal_and_observable() {
    let client = RetrievalClient::new(ClientConfig::new().with_binary("/nonexistent/bin"));
    let mut events = client.events();

    let err = client.initialize().await.unwrap_err();
    assert!(matches!(err, RetrievalError::BinaryNotFound));
    assert!(err.is_fatal());

    match events.try_recv() {
        Ok(mnemo_client::ServiceEvent::Failed { message }) => {
            assert!(message.contains("binary not found"));
        }
        other => panic!("expected Failed event, got {other:?}"),
    }
}
