//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST gateway on its own.
//!
//! ## Intended use
//! Useful for development and debugging when you only want the REST server (with
//! OpenAPI/Swagger UI). The workspace's main `hlc-run` binary runs both gRPC and REST
//! concurrently over one host.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{build_router, AppState};
use hlc_core::config::{channel_id_from_env_value, seed_file_from_env_value};
use hlc_core::{default_host, CoreConfig};

/// Main entry point for the HLC REST API server
///
/// # Environment Variables
/// - `HLC_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `HLC_CHANNEL_ID`: Channel served by the host (default: "healthchannel")
/// - `HLC_SEED_FILE`: Optional JSON seed loaded at startup
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the seed file cannot be loaded,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("hlc_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("HLC_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = Arc::new(CoreConfig::new(
        channel_id_from_env_value(std::env::var("HLC_CHANNEL_ID").ok()),
        seed_file_from_env_value(std::env::var("HLC_SEED_FILE").ok()),
    )?);
    let host = Arc::new(default_host(cfg)?);

    tracing::info!("-- Starting HLC REST API on {}", addr);

    let app = build_router(AppState::new(host));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
