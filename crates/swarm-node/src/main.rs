//! Agent node binary.
//!
//! One process per agent. Startup wires config, identity, store, channel,
//! and the HTTP surface together, then drives the gossip-tick loop:
//!
//! 1. Pull `/pheromones` from every peer (3 s deadlines, settled).
//! 2. Integrate unknown signals into the local channel.
//! 3. Run one tick of the agent loop.
//! 4. Publish the read-API snapshot.
//! 5. Push emitted signals to every peer.
//! 6. Sleep the step interval (or exit on `SIGINT`/`MAX_STEPS`).
//!
//! Fatal errors exist only at startup (port bind, bad config); after that
//! the loop degrades, it never dies.

use std::pin::pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use swarm_channel::SignalChannel;
use swarm_core::{AgentRuntime, Config};
use swarm_net::{build_router, serve, AppState, GossipClient};
use swarm_store::SwarmStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = Config::from_env()?;
    info!(
        agent = config.agent_id(),
        name = config.agent_name(),
        port = config.agent_port,
        peers = config.peer_urls.len(),
        engineering = config.engineering_enabled(),
        "swarm-node starting"
    );

    let store = match &config.db_path {
        Some(path) => Some(SwarmStore::open(path).await?),
        None => None,
    };

    let channel = Arc::new(Mutex::new(SignalChannel::new(config.channel_config())));
    let (mut runtime, mut outbound_rx) =
        AgentRuntime::new(config, Arc::clone(&channel), store)?;
    runtime.restore_from_store().await;

    // HTTP surface on its own task; a bind failure is fatal.
    let app_state = Arc::new(AppState::new(runtime.snapshot(), channel));
    let router = build_router(Arc::clone(&app_state));
    let port = runtime.config().agent_port;
    tokio::spawn(async move {
        if let Err(e) = serve(port, router).await {
            error!(error = %e, "http surface failed");
            std::process::exit(1);
        }
    });

    let gossip = GossipClient::new(runtime.config().peer_urls.clone());
    let interval = Duration::from_millis(runtime.config().step_interval_ms());
    let max_steps = runtime.config().max_steps;

    let mut shutdown = pin!(tokio::signal::ctrl_c());
    loop {
        // Pull and integrate: unknown ids only, dedup inside the channel.
        let pulled = gossip.pull_all().await;
        if !pulled.is_empty() {
            match app_state.channel.lock() {
                Ok(mut guard) => {
                    for signal in pulled {
                        guard.deposit(signal);
                    }
                }
                Err(_) => warn!("channel lock poisoned; pull skipped"),
            }
        }

        let outcome = runtime.run_tick().await;
        info!(
            step = outcome.step,
            mode = ?outcome.mode,
            density = format!("{:.3}", outcome.density),
            emitted = outcome.emitted,
            transitioned = outcome.transitioned,
            "tick complete"
        );

        app_state.publish(runtime.snapshot()).await;

        // Push on emit (includes DA commitment re-gossip when enabled).
        while let Ok(signal) = outbound_rx.try_recv() {
            gossip.push_all(&signal).await;
        }

        if max_steps > 0 && outcome.step >= max_steps {
            info!(max_steps, "step limit reached");
            break;
        }

        tokio::select! {
            () = tokio::time::sleep(interval) => {}
            _ = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    runtime.flush().await;
    info!("swarm-node stopped");
    Ok(())
}
