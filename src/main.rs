use std::net::SocketAddr;
use std::sync::Arc;
use tonic::transport::Server;
use tonic_reflection::server::Builder;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_grpc::{GatewayService, auth_interceptor, pb::gateway_server::GatewayServer};
use api_rest::{AppState, build_router};
use api_shared::FILE_DESCRIPTOR_SET;
use hlc_core::config::{channel_id_from_env_value, seed_file_from_env_value};
use hlc_core::{CoreConfig, default_host};

/// Main entry point for the HLC application
///
/// Starts both gRPC and REST gateways concurrently over one shared contract host:
/// - gRPC server on port 50051 (configurable via HLC_ADDR)
/// - REST server on port 3000 (configurable via HLC_REST_ADDR)
///
/// The gRPC server requires authentication via x-api-key header.
///
/// # Environment Variables
/// - `HLC_ADDR`: gRPC server address (default: "0.0.0.0:50051")
/// - `HLC_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `HLC_CHANNEL_ID`: Channel served by the host (default: "healthchannel")
/// - `HLC_SEED_FILE`: Optional JSON seed loaded into the ledger at startup
/// - `HLC_ENABLE_REFLECTION`: Set to "true" to enable gRPC reflection
/// - `API_KEY`: API key for gRPC authentication
///
/// # Returns
/// * `Ok(())` - If servers start and run successfully
/// * `Err(anyhow::Error)` - If server startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hlc_core=info".parse()?)
                .add_directive("hlc_run=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let grpc_addr: SocketAddr = std::env::var("HLC_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:50051".into())
        .parse()?;
    let rest_addr = std::env::var("HLC_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = Arc::new(CoreConfig::new(
        channel_id_from_env_value(std::env::var("HLC_CHANNEL_ID").ok()),
        seed_file_from_env_value(std::env::var("HLC_SEED_FILE").ok()),
    )?);
    let host = Arc::new(default_host(cfg)?);

    tracing::info!("++ Starting HLC gRPC on {}", grpc_addr);
    tracing::info!("++ Starting HLC REST on {}", rest_addr);

    let rest_app = build_router(AppState::new(host.clone()));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    let rest_server = tokio::spawn(async move { axum::serve(listener, rest_app).await });

    let mut grpc_router = Server::builder().add_service(GatewayServer::with_interceptor(
        GatewayService::new(host),
        auth_interceptor,
    ));
    if std::env::var("HLC_ENABLE_REFLECTION").unwrap_or_else(|_| "false".to_string()) == "true" {
        let reflection_service = Builder::configure()
            .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
            .build_v1()?;
        grpc_router = grpc_router.add_service(reflection_service);
        tracing::info!("gRPC server reflection enabled");
    }
    let grpc_server = grpc_router.serve(grpc_addr);

    // Run both
    let (rest_result, grpc_result) = tokio::join!(rest_server, grpc_server);
    rest_result??;
    grpc_result?;

    Ok(())
}
