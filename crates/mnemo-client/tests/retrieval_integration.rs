//! Retrieval operation tests against a mock service.

use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mnemo_client::{ClientConfig, RetrievalClient};
use mnemo_types::{Importance, MemoryDocument, MemoryKind, ToolDescriptor};

async fn ready_client(server: &MockServer) -> RetrievalClient {
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "model_loaded": true,
            "collections": [],
        })))
        .mount(server)
        .await;

    let client = RetrievalClient::new(
        ClientConfig::new()
            .with_base_url(server.uri().parse().unwrap())
            .with_startup_timeout(Duration::from_secs(2))
            .with_health_interval(Duration::from_millis(20)),
    );
    client.initialize().await.unwrap();
    client
}

fn get_time_tool() -> ToolDescriptor {
    ToolDescriptor::new("get_time", "Get the current time")
        .with_category("system")
        .with_keywords(vec!["time".into(), "clock".into()])
}

fn web_search_tool() -> ToolDescriptor {
    ToolDescriptor::new("web_search", "Search the internet")
        .with_category("web")
        .with_keywords(vec!["search".into(), "internet".into()])
}

/// Respond to the fetch-all diff search with the given indexed tools.
async fn mount_fetch_all(server: &MockServer, tools: &[ToolDescriptor]) {
    let hits: Vec<_> = tools
        .iter()
        .map(|t| {
            let doc = t.to_document();
            json!({"id": doc.id, "text": doc.text, "score": 0.5, "context": doc.context})
        })
        .collect();

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_partial_json(json!({"top_k": 1000})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "results": [{"namespace": "tools", "hits": hits}],
        })))
        .mount(server)
        .await;
}

fn ok_index_response(count: usize) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"status": "ok", "count": count}))
}

#[tokio::test]
async fn test_index_tools_skips_unchanged_set() {
    let server = MockServer::start().await;
    let client = ready_client(&server).await;

    let tools = vec![get_time_tool(), web_search_tool()];
    mount_fetch_all(&server, &tools).await;

    // Nothing changed, so /index must never be called.
    Mock::given(method("POST"))
        .and(path("/index"))
        .respond_with(ok_index_response(0))
        .expect(0)
        .mount(&server)
        .await;

    let changed = client.index_tools(&tools).await.unwrap();
    assert_eq!(changed, 0);
}

#[tokio::test]
async fn test_index_tools_sends_only_the_changed_tool() {
    let server = MockServer::start().await;
    let client = ready_client(&server).await;

    // Indexed state has the old description for web_search.
    mount_fetch_all(&server, &[get_time_tool(), web_search_tool()]).await;

    Mock::given(method("POST"))
        .and(path("/index"))
        .respond_with(ok_index_response(1))
        .expect(1)
        .mount(&server)
        .await;

    let mut updated = web_search_tool();
    updated.description = "Search the web for current information".into();

    let changed = client.index_tools(&[get_time_tool(), updated]).await.unwrap();
    assert_eq!(changed, 1);

    // Exactly one document, and it is the changed tool.
    let requests = server.received_requests().await.unwrap();
    let index_request = requests
        .iter()
        .find(|r| r.url.path() == "/index")
        .expect("an /index request");
    let body: serde_json::Value = serde_json::from_slice(&index_request.body).unwrap();
    let docs = body["documents"].as_array().unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["id"], "web_search");
}

#[tokio::test]
async fn test_search_tools_keyword_fallback_below_min_score() {
    let server = MockServer::start().await;
    let client = ready_client(&server).await;

    // Prime the descriptor cache (empty index, both tools sent).
    mount_fetch_all(&server, &[]).await;
    Mock::given(method("POST"))
        .and(path("/index"))
        .respond_with(ok_index_response(2))
        .mount(&server)
        .await;
    client
        .index_tools(&[get_time_tool(), web_search_tool()])
        .await
        .unwrap();

    // Semantic search finds nothing above min_score.
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_partial_json(json!({"top_k": 3})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "results": [{"namespace": "tools", "hits": []}],
        })))
        .mount(&server)
        .await;

    let bundle = client.search_tools("what time is it", 3, 0.3).await;

    // get_time matched via its "time" keyword even with zero semantic hits.
    assert_eq!(bundle.tools.len(), 1);
    assert_eq!(bundle.tools[0].name, "get_time");
    assert!(bundle.descriptions.contains("get_time: Get the current time"));
    assert!(bundle.raw_prompt.contains("### get_time"));
}

#[tokio::test]
async fn test_search_tools_resolves_semantic_hits_from_cache() {
    let server = MockServer::start().await;
    let client = ready_client(&server).await;

    mount_fetch_all(&server, &[]).await;
    Mock::given(method("POST"))
        .and(path("/index"))
        .respond_with(ok_index_response(2))
        .mount(&server)
        .await;
    client
        .index_tools(&[get_time_tool(), web_search_tool()])
        .await
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_partial_json(json!({"top_k": 3})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "results": [{"namespace": "tools", "hits": [
                {"id": "web_search", "text": "ignored", "score": 0.82, "context": {}},
            ]}],
        })))
        .mount(&server)
        .await;

    let bundle = client.search_tools("find rust news online", 3, 0.1).await;

    // Semantic hit resolves to the full cached descriptor with parameters.
    assert_eq!(bundle.tools[0].name, "web_search");
    assert_eq!(bundle.tools[0].category, "web");
}

#[tokio::test]
async fn test_index_memory_routes_by_kind_and_stamps_timestamp() {
    let server = MockServer::start().await;
    let client = ready_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/index"))
        .and(body_partial_json(json!({"namespace": "llm_memories"})))
        .respond_with(ok_index_response(1))
        .expect(1)
        .mount(&server)
        .await;

    let memory = MemoryDocument::new("the user's birthday is in June")
        .with_kind(MemoryKind::LlmMemory);
    assert!(memory.context.timestamp.is_none());

    client.index_memory(memory).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let index_request = requests.iter().find(|r| r.url.path() == "/index").unwrap();
    let body: serde_json::Value = serde_json::from_slice(&index_request.body).unwrap();
    // Timestamp was stamped client-side before the request.
    assert!(body["documents"][0]["context"]["timestamp"].is_string());
}

#[tokio::test]
async fn test_index_memory_rejects_empty_text_without_network() {
    let server = MockServer::start().await;
    let client = ready_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/index"))
        .respond_with(ok_index_response(0))
        .expect(0)
        .mount(&server)
        .await;

    let err = client
        .index_memory(MemoryDocument::new("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, mnemo_client::RetrievalError::Validation(_)));
}

#[tokio::test]
async fn test_relevant_memories_boost_filter_and_order() {
    let server = MockServer::start().await;
    let client = ready_client(&server).await;

    let now = Utc::now();
    let recent = (now - chrono::Duration::minutes(30)).to_rfc3339();
    let stale = (now - chrono::Duration::days(3)).to_rfc3339();
    let past_expiry = (now - chrono::Duration::hours(1)).to_rfc3339();

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "results": [
                {"namespace": "llm_memories", "hits": [
                    // 0.7 × 1.2 recency × 1.3 importance clamps to 1.0.
                    {"id": "m1", "text": "loves rust", "score": 0.7, "context": {
                        "timestamp": recent,
                        "metadata": {"type": "llm_memory", "importance": "high"},
                    }},
                ]},
                {"namespace": "user_info", "hits": [
                    {"id": "m2", "text": "works remotely", "score": 0.8, "context": {
                        "timestamp": stale,
                        "metadata": {"type": "user_info", "importance": "normal"},
                    }},
                ]},
                {"namespace": "world_facts", "hits": []},
                {"namespace": "volatile_info", "hits": [
                    // Expired volatile entries never surface, whatever the score.
                    {"id": "m3", "text": "meeting at 3pm", "score": 0.99, "context": {
                        "timestamp": recent,
                        "is_volatile": true,
                        "expires_at": past_expiry,
                        "metadata": {"type": "volatile_info", "importance": "high"},
                    }},
                ]},
                {"namespace": "conversation_history", "hits": [
                    // Below the conversation_history floor of 0.35.
                    {"id": "m4", "text": "noise", "score": 0.2, "context": {}},
                ]},
            ],
        })))
        .mount(&server)
        .await;

    let memories = client.relevant_memories("what do I like", 10).await;

    assert_eq!(memories.len(), 2);
    assert_eq!(memories[0].id, "m1");
    assert_eq!(memories[0].relevance, 1.0);
    assert_eq!(memories[1].id, "m2");
    assert!((memories[1].relevance - 0.8).abs() < 1e-6);
    assert!(memories[0].relevance >= memories[1].relevance);
}

#[tokio::test]
async fn test_clear_protected_namespace_is_refused_locally() {
    let server = MockServer::start().await;
    let client = ready_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/clear"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(0) // never reaches the service
        .mount(&server)
        .await;

    client.clear_namespace("llm_memories").await.unwrap();
}

#[tokio::test]
async fn test_clear_unprotected_namespace_goes_through() {
    let server = MockServer::start().await;
    let client = ready_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/clear"))
        .and(body_partial_json(json!({"namespace": "conversation_history"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    client.clear_namespace("conversation_history").await.unwrap();
}
