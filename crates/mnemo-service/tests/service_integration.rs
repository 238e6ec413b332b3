//! End-to-end tests for the embedding service over its HTTP surface.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use tower::ServiceExt;

use mnemo_service::{Service, ServiceConfig};
use mnemo_types::{
    ClearResponse, Document, HealthResponse, IndexResponse, SearchResponse, StatusResponse,
};

/// A service with the hash model already warmed up.
async fn ready_service() -> Service {
    let service = Service::new(ServiceConfig::default()).unwrap();
    assert!(service.state().warm_up().await);
    service
}

async fn post_json(app: Router, uri: &str, body: String) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

fn index_body(namespace: &str, docs: &[Document]) -> String {
    serde_json::json!({ "namespace": namespace, "documents": docs }).to_string()
}

fn search_body(namespaces: &[&str], query: &str, top_k: usize, min_score: f32) -> String {
    serde_json::json!({
        "namespaces": namespaces,
        "query": query,
        "top_k": top_k,
        "min_score": min_score,
    })
    .to_string()
}

#[tokio::test]
async fn test_index_then_search() {
    let service = ready_service().await;

    let docs = vec![
        Document::new("get_time", "get_time: Get the current time"),
        Document::new("web_search", "web_search: Search the internet"),
    ];
    let (status, body) = post_json(service.router(), "/index", index_body("tools", &docs)).await;
    assert_eq!(status, StatusCode::OK);
    let resp: IndexResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(resp.count, 2);
    assert!(resp.failed.is_empty());

    let (status, body) = post_json(
        service.router(),
        "/search",
        search_body(&["tools"], "what time is it", 3, 0.0),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let resp: SearchResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(resp.results.len(), 1);
    assert_eq!(resp.results[0].namespace, "tools");

    let hits = &resp.results[0].hits;
    assert!(!hits.is_empty());
    assert_eq!(hits[0].id, "get_time");
    // Ordered by descending score.
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn test_namespace_isolation_over_http() {
    let service = ready_service().await;

    let doc = vec![Document::new("m1", "the user prefers tea over coffee")];
    post_json(service.router(), "/index", index_body("user_info", &doc)).await;

    let (_, body) = post_json(
        service.router(),
        "/search",
        search_body(&["tools"], "the user prefers tea over coffee", 10, 0.0),
    )
    .await;
    let resp: SearchResponse = serde_json::from_slice(&body).unwrap();
    // Indexed into user_info; a tools search never sees it.
    assert!(resp.results[0].hits.is_empty());
}

#[tokio::test]
async fn test_multi_namespace_results_stay_grouped() {
    let service = ready_service().await;

    post_json(
        service.router(),
        "/index",
        index_body("user_info", &[Document::new("u1", "user fact about tea")]),
    )
    .await;
    post_json(
        service.router(),
        "/index",
        index_body("world_facts", &[Document::new("w1", "world fact about tea")]),
    )
    .await;

    let (_, body) = post_json(
        service.router(),
        "/search",
        search_body(&["user_info", "world_facts", "volatile_info"], "tea", 5, 0.0),
    )
    .await;
    let resp: SearchResponse = serde_json::from_slice(&body).unwrap();

    // One entry per requested namespace, in request order.
    let names: Vec<&str> = resp.results.iter().map(|r| r.namespace.as_str()).collect();
    assert_eq!(names, vec!["user_info", "world_facts", "volatile_info"]);
    assert_eq!(resp.results[0].hits[0].id, "u1");
    assert_eq!(resp.results[1].hits[0].id, "w1");
    assert!(resp.results[2].hits.is_empty());
}

#[tokio::test]
async fn test_reindex_same_id_overwrites() {
    let service = ready_service().await;

    post_json(
        service.router(),
        "/index",
        index_body("tools", &[Document::new("t", "first version")]),
    )
    .await;
    post_json(
        service.router(),
        "/index",
        index_body("tools", &[Document::new("t", "second version")]),
    )
    .await;

    let (_, body) = get(service.router(), "/status").await;
    let status: StatusResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(status.document_counts.get("tools"), Some(&1));

    let (_, body) = post_json(
        service.router(),
        "/search",
        search_body(&["tools"], "second version", 1, 0.0),
    )
    .await;
    let resp: SearchResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(resp.results[0].hits[0].text, "second version");
}

#[tokio::test]
async fn test_partial_batch_failure_reports_ids() {
    let service = ready_service().await;

    let docs = vec![
        Document::new("good", "a perfectly fine document"),
        Document::new("bad", "   "),
    ];
    let (status, body) = post_json(service.router(), "/index", index_body("tools", &docs)).await;
    assert_eq!(status, StatusCode::OK);

    let resp: IndexResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(resp.count, 1);
    assert_eq!(resp.failed, vec!["bad".to_string()]);
}

#[tokio::test]
async fn test_clear_namespace() {
    let service = ready_service().await;

    post_json(
        service.router(),
        "/index",
        index_body("conversation_history", &[Document::new("c1", "a turn")]),
    )
    .await;

    let (status, body) = post_json(
        service.router(),
        "/clear",
        r#"{"namespace":"conversation_history"}"#.to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let _: ClearResponse = serde_json::from_slice(&body).unwrap();

    let (_, body) = get(service.router(), "/health").await;
    let health: HealthResponse = serde_json::from_slice(&body).unwrap();
    assert!(!health.collections.contains(&"conversation_history".to_string()));
}

#[tokio::test]
async fn test_invalid_namespace_is_bad_request() {
    let service = ready_service().await;

    let (status, body) = post_json(
        service.router(),
        "/index",
        index_body("Not A Namespace", &[Document::new("x", "y")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let err: mnemo_types::ErrorBody = serde_json::from_slice(&body).unwrap();
    assert_eq!(err.code, "bad_request");
}

#[tokio::test]
async fn test_health_reports_ready_after_warmup() {
    let service = ready_service().await;

    let (status, body) = get(service.router(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    let health: HealthResponse = serde_json::from_slice(&body).unwrap();
    assert!(health.model_loaded);
}

#[tokio::test]
async fn test_min_score_filters_results() {
    let service = ready_service().await;

    post_json(
        service.router(),
        "/index",
        index_body(
            "tools",
            &[
                Document::new("near", "what time is it right now"),
                Document::new("far", "unrelated browser window management"),
            ],
        ),
    )
    .await;

    let (_, body) = post_json(
        service.router(),
        "/search",
        search_body(&["tools"], "what time is it right now", 10, 0.9),
    )
    .await;
    let resp: SearchResponse = serde_json::from_slice(&body).unwrap();
    let hits = &resp.results[0].hits;
    assert!(hits.iter().all(|h| h.score >= 0.9));
    assert!(hits.iter().any(|h| h.id == "near"));
    assert!(!hits.iter().any(|h| h.id == "far"));
}
