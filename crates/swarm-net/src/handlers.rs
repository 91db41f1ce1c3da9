//! REST handlers for the per-agent HTTP surface.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/state` | Full agent snapshot |
//! | `GET` | `/pheromones` | Current channel signals |
//! | `POST` | `/pheromone` | Accept one gossiped signal |
//! | `GET` | `/thoughts` | Last 50 thoughts, newest first |
//! | `GET` | `/identity` | Identity material |
//! | `GET` | `/attestation` | Identity + latest signed signal + verification |
//! | `GET` | `/collective` | Collective memories |
//! | `GET` | `/health` | Liveness probe |

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use tracing::debug;

use swarm_types::Signal;

use crate::error::NetError;
use crate::state::AppState;

/// `GET /state` -- the full per-tick snapshot.
pub async fn get_state(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;
    Json(snapshot.clone())
}

/// `GET /pheromones` -- the live channel contents.
///
/// Reads the live channel (not the snapshot) so gossip pulls always see
/// the freshest unpruned set.
pub async fn get_pheromones(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, NetError> {
    let signals = state
        .channel
        .lock()
        .map_err(|_| NetError::ChannelUnavailable)?
        .snapshot();
    Ok(Json(signals))
}

/// `POST /pheromone` -- accept one signal; no-op when the id is already
/// known.
///
/// No signature verification happens here: integration is tolerant and
/// verification is the advisory verifier's concern.
pub async fn post_pheromone(
    State(state): State<Arc<AppState>>,
    Json(signal): Json<Signal>,
) -> Result<impl IntoResponse, NetError> {
    let inserted = state
        .channel
        .lock()
        .map_err(|_| NetError::ChannelUnavailable)?
        .deposit(signal);
    if !inserted {
        debug!("duplicate signal ignored");
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// `GET /thoughts` -- the last 50 thoughts, newest first.
pub async fn get_thoughts(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;
    Json(snapshot.thoughts.clone())
}

/// `GET /identity` -- public identity material.
pub async fn get_identity(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;
    Json(snapshot.identity.clone())
}

/// `GET /attestation` -- identity, the latest signed signal, compute/DA
/// metadata, and an advisory verification of that signal.
pub async fn get_attestation(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;

    let verification = snapshot.latest_signal.as_ref().map(|signal| {
        swarm_identity::verify_attestation(
            &signal.attestation,
            &signal.content,
            &signal.producer_id,
            signal.timestamp,
        )
    });

    Json(serde_json::json!({
        "identity": snapshot.identity,
        "latestSignal": snapshot.latest_signal,
        "verification": verification,
        "compute": {
            "backend": snapshot.backend,
            "tokensUsed": snapshot.tokens_used,
            "tokenBudget": snapshot.token_budget,
        },
        "da": {
            "enabled": snapshot.da_enabled,
            "commitment": snapshot
                .latest_signal
                .as_ref()
                .and_then(|s| s.da_commitment.clone()),
        },
    }))
}

/// `GET /collective` -- all collective memories this process has
/// synthesized.
pub async fn get_collective(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;
    Json(snapshot.collective.clone())
}

/// `GET /health` -- liveness probe.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;
    Json(serde_json::json!({
        "ok": true,
        "agent": snapshot.id,
        "step": snapshot.step,
    }))
}
