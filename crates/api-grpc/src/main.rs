//! Standalone gRPC gateway binary.

use std::net::SocketAddr;
use std::sync::Arc;
use tonic::transport::Server;
use tonic_reflection::server::Builder;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_grpc::{auth_interceptor, pb::gateway_server::GatewayServer, GatewayService};
use api_shared::FILE_DESCRIPTOR_SET;
use hlc_core::config::{channel_id_from_env_value, seed_file_from_env_value};
use hlc_core::{default_host, CoreConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hlc_core=info".parse()?)
                .add_directive("api_grpc=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr: SocketAddr = std::env::var("HLC_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:50051".into())
        .parse()?;

    let cfg = Arc::new(CoreConfig::new(
        channel_id_from_env_value(std::env::var("HLC_CHANNEL_ID").ok()),
        seed_file_from_env_value(std::env::var("HLC_SEED_FILE").ok()),
    )?);
    let host = Arc::new(default_host(cfg)?);

    tracing::info!("-- Starting HLC gRPC on {}", addr);

    let mut server_builder = Server::builder().add_service(GatewayServer::with_interceptor(
        GatewayService::new(host),
        auth_interceptor,
    ));

    if std::env::var("HLC_ENABLE_REFLECTION").unwrap_or_else(|_| "false".to_string()) == "true" {
        let reflection_service = Builder::configure()
            .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
            .build_v1()?;
        server_builder = server_builder.add_service(reflection_service);
        tracing::info!("gRPC server reflection enabled");
    } else {
        tracing::info!("gRPC server reflection disabled");
    }

    server_builder.serve(addr).await?;

    Ok(())
}
