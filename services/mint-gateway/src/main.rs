use ab_chain_client::WalletProvider;
use ab_chain_evm::JsonRpcProvider;
use ab_network_registry::NetworkRegistry;
use ab_wallet_core::{Bridge, BridgeConfig, FlowConfig};
use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

mod config;
mod flows;
mod networks;

use config::ServiceConfig;

#[derive(Debug, Serialize)]
struct HealthResponse {
    service: &'static str,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct VersionResponse {
    service: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    error: String,
}

pub(crate) type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) bridge: Arc<Bridge>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ServiceConfig::from_env()?;
    let rpc = JsonRpcProvider::new(Some(config.rpc_url.clone()));
    info!("using wallet provider at {}", rpc.endpoint());
    let provider: Arc<dyn WalletProvider> = Arc::new(rpc);

    let state = AppState {
        bridge: Arc::new(Bridge::new(
            provider,
            Arc::new(NetworkRegistry::builtin()),
            BridgeConfig {
                flow: FlowConfig {
                    receipt_poll_interval: config.receipt_poll_interval,
                },
                network_poll_interval: config.network_poll_interval,
            },
        )),
    };

    let app = router(state);

    info!("mint-gateway listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/networks", get(networks::networks))
        .route("/account", post(flows::account))
        .route("/approve", post(flows::approve))
        .route("/mint", post(flows::mint))
        .route("/port", post(flows::port))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        service: "mint-gateway",
        status: "ok",
    })
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        service: "mint-gateway",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub(crate) fn bad_request(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_owned(),
        }),
    )
}
