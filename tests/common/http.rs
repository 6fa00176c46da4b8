/// HTTP testing utilities
use anyhow::Result;
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderMap, Request, StatusCode};
use pushproxy::http::server::build_app_routes;
use pushproxy::http::state::HttpServerState;
use pushproxy::proxy::PushPipeline;
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot` and `ready`

/// HTTP test client for making requests to our app
pub struct TestApp {
    app: axum::Router,
}

impl TestApp {
    /// Create a new test app around the given pipeline
    pub fn new(pipeline: PushPipeline) -> Self {
        Self::with_gateway_url(pipeline, None)
    }

    /// Create a test app whose `/metrics/job/...` route forwards to `gateway_url`
    pub fn with_gateway_url(pipeline: PushPipeline, gateway_url: Option<&str>) -> Self {
        let state = HttpServerState {
            name: Arc::new("PushProxy Test".to_string()),
            pipeline: Arc::new(pipeline),
            gateway_url: gateway_url.map(|url| Arc::new(url.to_string())),
        };

        // Use the shared route builder from the main server
        // This ensures tests use the exact same routes as production
        let max_body_layer = DefaultBodyLimit::max(10 * 1024 * 1024); // 10MB for tests
        let app = build_app_routes(state, max_body_layer);

        Self { app }
    }

    /// Send a POST request with JSON data
    pub async fn post_json(&self, path: &str, json_data: &str) -> Result<TestResponse> {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(json_data.to_string()))?;

        let response = self.app.clone().oneshot(request).await?;
        Ok(TestResponse::new(response).await)
    }

    /// Send a request with a plain text body
    pub async fn send_text(&self, method: &str, path: &str, text: &str) -> Result<TestResponse> {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "text/plain; version=0.0.4")
            .body(Body::from(text.to_string()))?;

        let response = self.app.clone().oneshot(request).await?;
        Ok(TestResponse::new(response).await)
    }

    /// Send a GET request
    pub async fn get(&self, path: &str) -> Result<TestResponse> {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())?;

        let response = self.app.clone().oneshot(request).await?;
        Ok(TestResponse::new(response).await)
    }
}

/// Test response wrapper for easier assertions
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl TestResponse {
    async fn new(response: axum::response::Response) -> Self {
        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default()
            .to_vec();
        let body = String::from_utf8_lossy(&body_bytes).to_string();

        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Parse response body as JSON
    pub fn json<T>(&self) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_str(&self.body).map_err(Into::into)
    }

    /// Assert status code
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected status {}, got {}. Body: {}",
            expected, self.status, self.body
        );
        self
    }

    /// Assert response body contains text
    pub fn assert_body_contains(&self, text: &str) -> &Self {
        assert!(
            self.body.contains(text),
            "Expected body to contain '{}', got: {}",
            text,
            self.body
        );
        self
    }
}
