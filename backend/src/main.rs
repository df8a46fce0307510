use std::sync::Arc;

use backend::{server, types::Environment};
use report_storage::{ReportStorage, StorageConfig};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(environment.default_log_level().to_string()));

    // JSON logs for staging/production, human-readable logs for development
    if environment.json_logs() {
        fmt().json().with_env_filter(env_filter).init();
    } else {
        fmt().with_env_filter(env_filter).init();
    }

    let config = StorageConfig::from_env()?;
    tracing::debug!("Loaded storage configuration: {config:?}");

    let report_storage = Arc::new(ReportStorage::from_config(config));

    server::start(environment, report_storage).await
}
