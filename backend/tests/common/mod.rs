// Not every helper is used in every test file
#![allow(dead_code)]

use std::sync::Arc;

use axum::{body::Body, http::Request, response::Response, Router};
use backend::{server, types::Environment};
use http_body_util::BodyExt;
use report_storage::{store::mock::InMemoryObjectStore, ReportStorage, StorageConfig};
use tower::ServiceExt;

pub const TEST_ACCESS_KEY_ID: &str = "test-access-key";
pub const TEST_ACCESS_KEY_SECRET: &str = "test-secret";
pub const TEST_BUCKET: &str = "qq-reports-test";
pub const TEST_ENDPOINT: &str = "oss-cn-hangzhou.aliyuncs.com";

/// Router wired to an in-memory object store
pub struct TestContext {
    pub router: Router,
    pub store: Arc<InMemoryObjectStore>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_store(Arc::new(InMemoryObjectStore::new()), Environment::Development)
    }

    pub fn with_store(store: Arc<InMemoryObjectStore>, environment: Environment) -> Self {
        // Initialize tracing for tests
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .try_init()
            .ok();

        let config = StorageConfig::new(
            TEST_ACCESS_KEY_ID,
            TEST_ACCESS_KEY_SECRET,
            TEST_ENDPOINT,
            TEST_BUCKET,
        )
        .expect("valid test config");
        let report_storage = Arc::new(ReportStorage::new(config, store.clone()));

        Self {
            router: server::router(environment, report_storage),
            store,
        }
    }

    pub async fn send_post_request(&self, route: &str, payload: serde_json::Value) -> Response {
        let request = Request::builder()
            .uri(route)
            .method("POST")
            .header("Content-Type", "application/json")
            .body(Body::from(payload.to_string()))
            .expect("valid request");

        self.router.clone().oneshot(request).await.expect("infallible")
    }

    pub async fn send_get_request(&self, route: &str) -> Response {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .body(Body::empty())
            .expect("valid request");

        self.router.clone().oneshot(request).await.expect("infallible")
    }

    pub async fn send_delete_request(&self, route: &str) -> Response {
        let request = Request::builder()
            .uri(route)
            .method("DELETE")
            .body(Body::empty())
            .expect("valid request");

        self.router.clone().oneshot(request).await.expect("infallible")
    }
}

/// Parse response body to JSON
pub async fn parse_response_body(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
