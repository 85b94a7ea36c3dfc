mod config;
mod error;
mod handlers;
mod response;
mod storage;

use crate::config::{Config, CredentialsConfig, UploadConfig};
use crate::storage::{http::HttpStorage, StorageBackend};
use anyhow::Context;
use axum::{routing::any, Extension, Router};
use envconfig::Envconfig;
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::init_from_env().context("Failed to load config")?;

    let upload_config = config.upload_config();
    if let CredentialsConfig::Missing(missing) = &upload_config.credentials {
        warn!("Storage credentials not configured ({missing}), uploads will fail");
    }

    let backend: Arc<dyn StorageBackend> = Arc::new(
        HttpStorage::new(
            &config.storage_api_url,
            config.storage_display_name.clone(),
            upload_config.timeout,
        )
        .context("Failed to build storage client")?,
    );

    let app = router(backend, upload_config);
    let address = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("Listening on {address}");

    axum::Server::bind(&address)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

pub fn router(backend: Arc<dyn StorageBackend>, upload_config: UploadConfig) -> Router {
    Router::new()
        .route("/upload", any(handlers::upload))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(backend))
        .layer(Extension(upload_config))
}
