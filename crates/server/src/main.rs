//! shellcache server entry point.
//!
//! Boots a worker registration from configuration and serves it as MCP tools
//! on stdio. Logging goes to stderr; stdout carries the JSON-RPC protocol.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use shellcache_client::{FetchClient, FetchConfig, Fetcher, Registration};
use shellcache_core::{CacheDb, WorkerConfig};
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = WorkerConfig::load().context("loading configuration")?;
    tracing::info!(
        cache_name = %config.cache_name,
        scope = %config.scope,
        activation = ?config.activation,
        "starting shellcache on stdio transport"
    );

    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("opening cache store at {}", config.db_path.display()))?;
    let network: Arc<dyn Fetcher> = Arc::new(FetchClient::new(FetchConfig::from(&config))?);

    let (registration, outcome) = Registration::start(&config, db, network).await?;
    tracing::info!(
        generation = %outcome.generation,
        state = %outcome.state,
        seeded = outcome.seeds.stored.len(),
        "worker registered"
    );

    let handler = handler::ShellcacheServer::new(Arc::new(registration));
    let server = serve_server(handler, stdio()).await?;
    server.waiting().await?;

    Ok(())
}
