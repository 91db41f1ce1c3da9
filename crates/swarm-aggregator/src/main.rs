//! Aggregator binary.
//!
//! A stateless presentation server that fans every request out to the
//! configured agent URLs and merges the replies. Recognized environment:
//! `AGGREGATOR_PORT` (3000) and `AGENT_URLS` (comma-separated agent base
//! URLs).

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use swarm_net::{build_aggregator_router, serve, AggregatorState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let port: u16 = std::env::var("AGGREGATOR_PORT")
        .unwrap_or_else(|_| String::from("3000"))
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid AGGREGATOR_PORT: {e}"))?;

    let agent_urls: Vec<String> = std::env::var("AGENT_URLS")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.trim_end_matches('/').to_owned())
        .collect();

    info!(port, agents = agent_urls.len(), "swarm-aggregator starting");

    let state = Arc::new(AggregatorState::new(agent_urls));
    let router = build_aggregator_router(state);

    tokio::select! {
        result = serve(port, router) => result?,
        _ = tokio::signal::ctrl_c() => info!("shutdown signal received"),
    }

    Ok(())
}
