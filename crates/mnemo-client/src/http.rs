//! Typed HTTP layer over the embedding service.

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use mnemo_types::{
    ClearRequest, ClearResponse, Document, ErrorBody, HealthResponse, IndexRequest, IndexResponse,
    SearchRequest, SearchResponse, StatusResponse,
};

use crate::error::{Result, RetrievalError};

/// Client for the service's wire contract.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct ServiceClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl ServiceClient {
    /// Create a client for a service at `base_url`.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(RetrievalError::Http)?;
        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                timeout,
            }),
        })
    }

    /// The service base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// `GET /health`.
    pub async fn health(&self) -> Result<HealthResponse> {
        self.get("health").await
    }

    /// `GET /status`.
    pub async fn status(&self) -> Result<StatusResponse> {
        self.get("status").await
    }

    /// `POST /index`.
    pub async fn index(&self, namespace: &str, documents: Vec<Document>) -> Result<IndexResponse> {
        self.post(
            "index",
            &IndexRequest {
                namespace: namespace.to_string(),
                documents,
            },
        )
        .await
    }

    /// `POST /search`.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        self.post("search", request).await
    }

    /// `POST /clear`.
    pub async fn clear(&self, namespace: &str) -> Result<ClearResponse> {
        self.post(
            "clear",
            &ClearRequest {
                namespace: namespace.to_string(),
            },
        )
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal HTTP methods
    // ─────────────────────────────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url> {
        self.inner.base_url.join(path).map_err(RetrievalError::from)
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .inner
            .http
            .get(self.url(path)?)
            .timeout(self.inner.timeout)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let response = self
            .inner
            .http
            .post(self.url(path)?)
            .json(body)
            .timeout(self.inner.timeout)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::extract_error(response).await)
        }
    }

    /// Prefer the service's structured error body over the bare status code.
    async fn extract_error(response: reqwest::Response) -> RetrievalError {
        let status = response.status().as_u16();
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => format!("{}: {}", body.code, body.message),
            Err(_) => format!("HTTP {status}"),
        };
        RetrievalError::Request { status, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ServiceClient {
        ServiceClient::new(server.uri().parse().unwrap(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_health_roundtrip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "healthy",
                "model_loaded": true,
                "collections": ["tools"],
            })))
            .mount(&server)
            .await;

        let health = client(&server).health().await.unwrap();
        assert!(health.model_loaded);
        assert_eq!(health.collections, vec!["tools"]);
    }

    #[tokio::test]
    async fn test_error_body_preferred_over_status_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
                "status": "error",
                "code": "model_not_ready",
                "message": "warming up",
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .search(&SearchRequest {
                namespaces: vec!["tools".into()],
                query: "q".into(),
                top_k: 3,
                min_score: 0.0,
            })
            .await
            .unwrap_err();

        match err {
            RetrievalError::Request { status, message } => {
                assert_eq!(status, 503);
                assert!(message.contains("model_not_ready"));
            }
            other => panic!("expected Request error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_index_sends_namespace_and_documents() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/index"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "ok",
                "count": 1,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resp = client(&server)
            .index("tools", vec![Document::new("a", "text")])
            .await
            .unwrap();
        assert_eq!(resp.count, 1);
    }
}
