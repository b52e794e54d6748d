//! Warden authorizer HTTP service entry point.
//!
//! # Purpose
//! Loads configuration, wires the decision engine to its key-set and secret
//! sources, and serves the gateway-facing `/authorize` endpoint.

use anyhow::Result;
use authorizer::app::{build_router, build_state};
use authorizer::config::AuthorizerConfig;
use authorizer::observability;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AuthorizerConfig::from_env_or_yaml()?;
    observability::init_tracing();

    let state = build_state(&config)?;
    let app = build_router(state);

    let addr = config.bind_addr;
    tracing::info!(%addr, "authorizer listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
