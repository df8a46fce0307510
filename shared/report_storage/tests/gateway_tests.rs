use std::error::Error as _;
use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use report_storage::{
    policy, store::mock::InMemoryObjectStore, ReportStorage, StorageConfig, StorageError,
};
use tempfile::TempDir;

const SECRET: &str = "integration-secret";

/// Test context holding the gateway, its backing store and a scratch directory
struct TestContext {
    storage: ReportStorage,
    store: Arc<InMemoryObjectStore>,
    dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self::with_store(Arc::new(InMemoryObjectStore::new()))
    }

    fn with_store(store: Arc<InMemoryObjectStore>) -> Self {
        let config = StorageConfig::new(
            "integration-id",
            SECRET,
            "oss-cn-hangzhou.aliyuncs.com",
            "qq-reports-bucket",
        )
        .expect("valid config");

        Self {
            storage: ReportStorage::new(config, store.clone()),
            store,
            dir: tempfile::tempdir().expect("temp dir"),
        }
    }

    fn write_file(&self, name: &str, contents: &str) -> std::path::PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).expect("write fixture");
        path
    }
}

#[tokio::test]
async fn test_upload_json_stores_under_prefixed_key() {
    let ctx = TestContext::new();
    let path = ctx.write_file("chat.json", r#"{"messages":[]}"#);

    let key = ctx.storage.upload_json(&path, "chat.json").await.unwrap();

    assert!(key.starts_with("qq-reports/json/"));
    assert!(key.ends_with("_chat.json"));
    assert!(key.contains("chat.json"));

    let stored = ctx.store.object(&key).expect("object stored");
    assert_eq!(stored.body, br#"{"messages":[]}"#);
    assert_eq!(stored.content_type, "application/json");
}

#[tokio::test]
async fn test_upload_json_missing_local_file() {
    let ctx = TestContext::new();
    let path = ctx.dir.path().join("does-not-exist.json");

    let err = ctx.storage.upload_json(&path, "x.json").await.unwrap_err();

    assert!(matches!(err, StorageError::Io { .. }));
    assert!(ctx.store.is_empty());
}

#[tokio::test]
async fn test_download_json_writes_local_file() {
    let ctx = TestContext::new();
    ctx.store
        .insert("qq-reports/json/a.json", "[1,2,3]", "application/json");
    let target = ctx.dir.path().join("downloaded.json");

    ctx.storage
        .download_json("qq-reports/json/a.json", &target)
        .await
        .unwrap();

    assert_eq!(std::fs::read_to_string(&target).unwrap(), "[1,2,3]");
}

#[tokio::test]
async fn test_download_json_not_found() {
    let ctx = TestContext::new();
    let target = ctx.dir.path().join("missing.json");

    let err = ctx
        .storage
        .download_json("qq-reports/json/missing.json", &target)
        .await
        .unwrap_err();

    assert!(
        matches!(err, StorageError::NotFound { ref key } if key == "qq-reports/json/missing.json")
    );
    assert!(!target.exists());
}

#[tokio::test]
async fn test_upload_result_html_is_idempotent() {
    let ctx = TestContext::new();
    let first = ctx.write_file("first.html", "<p>first</p>");
    let second = ctx.write_file("second.html", "<p>second</p>");

    let key_a = ctx.storage.upload_result_html(&first, "r-42").await.unwrap();
    let key_b = ctx.storage.upload_result_html(&second, "r-42").await.unwrap();

    assert_eq!(key_a, "qq-reports/results/r-42.html");
    assert_eq!(key_a, key_b);
    assert_eq!(ctx.store.len(), 1);

    let stored = ctx.store.object(&key_a).unwrap();
    assert_eq!(stored.body, b"<p>second</p>");
    assert_eq!(stored.content_type, "text/html; charset=utf-8");
}

#[tokio::test]
async fn test_get_file_url_default_and_custom_expiry() {
    let ctx = TestContext::new();

    let url = ctx.storage.get_file_url("a/b.html", None).await.unwrap();
    assert_eq!(url, "memory://objects/a/b.html?expires=3600");

    let url = ctx
        .storage
        .get_file_url("a/b.html", Some(Duration::from_secs(60)))
        .await
        .unwrap();
    assert_eq!(url, "memory://objects/a/b.html?expires=60");
}

#[tokio::test]
async fn test_delete_file_removes_object() {
    let ctx = TestContext::new();
    ctx.store.insert("qq-reports/results/x.html", "x", "text/html");

    ctx.storage
        .delete_file("qq-reports/results/x.html")
        .await
        .unwrap();

    assert!(ctx.store.object("qq-reports/results/x.html").is_none());
}

#[tokio::test]
async fn test_backend_failures_are_wrapped_with_cause() {
    let ctx = TestContext::with_store(Arc::new(InMemoryObjectStore::failing()));
    let path = ctx.write_file("chat.json", "{}");

    let err = ctx.storage.upload_json(&path, "chat.json").await.unwrap_err();
    assert!(matches!(err, StorageError::Transport { .. }));
    assert!(err.to_string().starts_with("Failed to upload JSON to object storage"));
    assert!(err
        .source()
        .is_some_and(|source| source.to_string().contains("simulated backend outage")));

    let err = ctx.storage.delete_file("k").await.unwrap_err();
    assert!(matches!(err, StorageError::Transport { .. }));

    let err = ctx.storage.get_file_url("k", None).await.unwrap_err();
    assert!(matches!(err, StorageError::Transport { .. }));

    let err = ctx
        .storage
        .download_json("k", ctx.dir.path().join("k.json"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Transport { .. }));
}

#[test]
fn test_upload_signature_verifies() {
    let ctx = TestContext::new();
    let before = Utc::now().timestamp();

    let signature = ctx.storage.generate_upload_signature("report.json").unwrap();

    let after = Utc::now().timestamp();
    assert!(signature.expire >= before + 3599 && signature.expire <= after + 3601);

    assert!(signature.key.starts_with("qq-reports/json/"));
    assert!(signature.key.ends_with("_report.json"));
    assert_eq!(signature.access_key_id, "integration-id");
    assert_eq!(
        signature.host,
        "https://qq-reports-bucket.oss-cn-hangzhou.aliyuncs.com"
    );

    let decoded: serde_json::Value =
        serde_json::from_slice(&STANDARD.decode(&signature.policy).unwrap()).unwrap();
    let conditions = decoded["conditions"].as_array().unwrap();
    assert!(conditions.contains(&serde_json::json!(["content-length-range", 0, 104_857_600])));
    assert!(conditions.contains(&serde_json::json!(["eq", "$key", signature.key])));

    assert_eq!(
        policy::sign(SECRET, &signature.policy).unwrap(),
        signature.signature
    );
}

#[test]
fn test_upload_signature_rejects_path_like_filename() {
    let ctx = TestContext::new();

    let err = ctx
        .storage
        .generate_upload_signature("../../escape.json")
        .unwrap_err();

    assert!(matches!(err, StorageError::InvalidInput(_)));
}
