//! Shared application state for the per-agent HTTP surface.
//!
//! Read endpoints serve from an [`AgentSnapshot`] the tick loop publishes
//! once per tick (so responses may be one tick stale); only the inbound
//! `POST /pheromone` handler touches live state, and it goes through the
//! same mutex the loop uses for every channel mutation.

use std::sync::Arc;

use tokio::sync::RwLock;

use swarm_core::{AgentSnapshot, SharedChannel};

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// The snapshot the read endpoints serve (updated each tick).
    pub snapshot: Arc<RwLock<AgentSnapshot>>,
    /// The live channel, shared with the tick loop for inbound deposits.
    pub channel: SharedChannel,
}

impl AppState {
    /// Create the application state from an initial snapshot and the
    /// loop's channel handle.
    pub fn new(initial: AgentSnapshot, channel: SharedChannel) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(initial)),
            channel,
        }
    }

    /// Publish a fresh snapshot (called by the tick driver).
    pub async fn publish(&self, snapshot: AgentSnapshot) {
        *self.snapshot.write().await = snapshot;
    }
}
