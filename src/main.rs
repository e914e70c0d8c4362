//! This project is split in 2 main modules:
//!
//! - [gateway] (Midtrans Snap and Core API client)
//! - [relay] (HTTP surface the storefront talks to)
#![doc = include_str!("../README.md")]

use std::{
    net::{Ipv4Addr, SocketAddrV4},
    sync::Arc,
};

use anyhow::Context;
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

mod config;
/// Midtrans integration
///
/// This module defines the types and methods to communicate with Midtrans: Snap for hosted
/// checkout sessions and the Core API for transaction status.
mod gateway;
/// Storefront-facing endpoints
///
/// Request validation, mapping to Midtrans parameters and mapping of Midtrans answers back to
/// HTTP responses.
mod relay;
mod state;

fn app(state: state::AppState) -> Router {
    Router::new()
        .merge(relay::api::router())
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_ansi(false)
        .init();

    match dotenvy::dotenv() {
        Ok(p) => tracing::info!(path = %p.display(), "Loaded environment variables from .env file"),
        Err(e) => tracing::warn!("Failed to load environment variables from .env: {e}"),
    };
    let config = config::Config::from_env()?;
    let gateway = gateway::MidtransGateway::new(&config.midtrans)?;
    let state = state::AppState::new(Arc::new(gateway));

    let listener =
        tokio::net::TcpListener::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, config.port))
            .await
            .with_context(|| format!("failed to bind port {}", config.port))?;

    tracing::info!(
        port = config.port,
        production = config.midtrans.is_production,
        "Serving on port {}",
        config.port
    );
    tracing::info!("GET  /                    - Health check");
    tracing::info!("POST /create-transaction  - Create payment");
    tracing::info!("POST /check-status        - Check payment status");
    tracing::info!("POST /notification        - Webhook from Midtrans");
    tracing::info!("GET  /status/{{orderId}}    - Manual status check");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
