//! Shared test utilities for integration tests.
//!
//! `TestClient` wraps a fresh, empty session and drives it through HTTP
//! requests the way a browser would.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use moneyflow::config::Config;
use moneyflow::handlers;
use moneyflow::server;
use moneyflow::state::AppState;
use moneyflow::xsrf::{XSRF_FORM_FIELD, XSRF_HEADER};
use tower::ServiceExt;

const BOUNDARY: &str = "----moneyflow-test-boundary";

/// The reference transactions: one income, a Food purchase and refund, and
/// an uncategorized expense that must not count.
pub const REFERENCE_CSV: &str = "\
date,name,amount,status,category,type,account,excluded
2024-03-01,Employer,-1000.00,cleared,Paycheck,income,Checking,false
2024-03-02,Grocery Store,200.00,cleared,Food,regular,Credit Card,false
2024-03-03,Grocery Store,-50.00,cleared,Food,regular,Credit Card,false
2024-03-04,Mystery,30.00,cleared,,regular,Checking,false
";

/// A test client that simulates a browser session, allowing sequential requests
/// against the application.
pub struct TestClient {
    state: AppState,
}

impl TestClient {
    /// Create a new test client with nothing uploaded yet.
    pub fn new() -> Self {
        let config = Config {
            host: "127.0.0.1".into(),
            ..Config::default()
        };
        Self {
            state: AppState::new(config),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn xsrf_token(&self) -> String {
        self.state.xsrf_token.value().to_string()
    }

    /// Handlers only, without the middleware stack.
    pub fn router(&self) -> Router {
        handlers::routes().with_state(self.state.clone())
    }

    /// The production router: XSRF checks, error pages, body limit.
    pub fn app(&self) -> Router {
        server::app_router(self.state.clone())
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, String) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&body).to_string())
    }

    /// Make a GET request and return status and body.
    pub async fn get(&self, uri: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        Self::send(self.router(), request).await
    }

    /// GET through the full middleware stack.
    pub async fn get_app(&self, uri: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        Self::send(self.app(), request).await
    }

    /// Get JSON from an endpoint and parse it.
    pub async fn get_json(&self, uri: &str) -> (StatusCode, Option<serde_json::Value>) {
        let (status, body) = self.get(uri).await;
        let parsed = serde_json::from_str(&body).ok();
        (status, parsed)
    }

    /// POST form data through the full stack, adding the XSRF field.
    pub async fn post_form(&self, uri: &str, form_data: &[(&str, &str)]) -> (StatusCode, String) {
        let token = self.xsrf_token();
        let mut pairs: Vec<(&str, &str)> = form_data.to_vec();
        pairs.push((XSRF_FORM_FIELD, token.as_str()));
        self.post_form_raw(uri, &pairs).await
    }

    /// POST form data through the full stack exactly as given.
    pub async fn post_form_raw(&self, uri: &str, form_data: &[(&str, &str)]) -> (StatusCode, String) {
        let body = form_data
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        Self::send(self.app(), request).await
    }

    /// Upload a CSV through the full stack with the token in the query string,
    /// as the dashboard form does.
    pub async fn upload_csv(&self, file_name: &str, content: &str) -> (StatusCode, String) {
        let uri = format!("/upload?{}={}", XSRF_FORM_FIELD, self.xsrf_token());
        self.post_multipart(&uri, "file", file_name, content.as_bytes(), None)
            .await
    }

    /// Upload a CSV with the token in the `X-XSRF-Token` header.
    pub async fn upload_csv_with_header(&self, file_name: &str, content: &str) -> (StatusCode, String) {
        let token = self.xsrf_token();
        self.post_multipart("/upload", "file", file_name, content.as_bytes(), Some(token.as_str()))
            .await
    }

    /// Upload without any XSRF token.
    pub async fn upload_csv_without_xsrf(&self, file_name: &str, content: &str) -> (StatusCode, String) {
        self.post_multipart("/upload", "file", file_name, content.as_bytes(), None)
            .await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        field: &str,
        file_name: &str,
        content: &[u8],
        header_token: Option<&str>,
    ) -> (StatusCode, String) {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: text/csv\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        let mut builder = Request::builder().method("POST").uri(uri).header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
        if let Some(token) = header_token {
            builder = builder.header(XSRF_HEADER, token);
        }

        Self::send(self.app(), builder.body(Body::from(body)).unwrap()).await
    }

    /// Upload the reference CSV and assert the redirect back to the dashboard.
    pub async fn load_reference(&self) {
        let (status, body) = self.upload_csv("reference.csv", REFERENCE_CSV).await;
        assert_eq!(status, StatusCode::SEE_OTHER, "upload failed: {}", body);
    }
}
