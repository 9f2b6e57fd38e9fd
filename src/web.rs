//! Preview server for an exported site

use std::path::Path;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

/// Router serving the files under `root`
pub fn router(root: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .fallback_service(ServeDir::new(root).append_index_html_on_directories(true))
        .layer(cors)
}

pub async fn run(root: &Path, port: u16) -> Result<()> {
    if !root.is_dir() {
        anyhow::bail!(
            "{} does not exist; run `tripmap export` first",
            root.display()
        );
    }

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Serving {} at http://localhost:{}", root.display(), port);
    axum::serve(listener, router(root))
        .await
        .context("Web server stopped unexpectedly")
}
