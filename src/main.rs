//! Server binary: loads settings, opens the database, creates the schema and serves the API.

use axum::{extract::Request, ServiceExt};
use movie_catalog::{apply_schema, app, catalog, open_pool_from_settings, AppState, Catalog, Settings};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("movie_catalog=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let catalog = Arc::new(Catalog::resolve(catalog::entities())?);
    let pool = open_pool_from_settings(&settings).await?;
    apply_schema(&pool, &catalog).await?;

    let state = AppState { pool, catalog };
    let app = app(state, &settings);

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
