mod api;
mod auth;
mod client;
mod config;
mod models;
mod normalize;
mod proxy;
#[cfg(test)]
mod testkit;
mod upstream;
mod views;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tracing::info;

use crate::{
    auth::SessionStore,
    client::BackendClient,
    config::EdgeConfig,
    upstream::{HttpUpstream, Upstream},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EdgeConfig>,
    pub upstream: Arc<dyn Upstream>,
    pub backend: BackendClient,
    pub sessions: SessionStore,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Arc::new(EdgeConfig::load()?);

    let upstream =
        HttpUpstream::new(config.upstream_timeout()).context("failed to build upstream client")?;
    let backend =
        BackendClient::from_config(&config).context("failed to build backend client")?;

    let state = AppState {
        config: config.clone(),
        upstream: Arc::new(upstream),
        backend,
        sessions: SessionStore::default(),
    };

    let app = api::router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid host/port")?;

    info!(%addr, backend = %config.backend_url, "vault-edge listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();
}
