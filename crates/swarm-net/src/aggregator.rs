//! The aggregator: a read-only fan-out over independent agent surfaces.
//!
//! The aggregator holds no state of its own. Every request fans out to all
//! configured agent URLs with per-request deadlines, merges the replies
//! (deduplicating by `id` where ids exist), and returns the merged view.
//! `POST /api/inject` is the single write path: it synthesizes a
//! `producerId = "human"` signal and broadcasts it to every agent.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::future::join_all;
use serde::Deserialize;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

use swarm_types::{AgentId, Signal, SignalId};

use crate::gossip::PEER_DEADLINE;

/// Aggregator state: the agent URL set and one shared HTTP client.
pub struct AggregatorState {
    client: reqwest::Client,
    agent_urls: Vec<String>,
}

impl AggregatorState {
    /// Create aggregator state over the given agent base URLs.
    pub fn new(agent_urls: Vec<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            agent_urls,
        }
    }

    /// Fan a GET out to every agent, returning the successful JSON bodies.
    async fn fan_out(&self, path: &str) -> Vec<Value> {
        let fetches = self.agent_urls.iter().map(|base| {
            let url = format!("{base}{path}");
            async move {
                let response = self
                    .client
                    .get(&url)
                    .timeout(PEER_DEADLINE)
                    .send()
                    .await
                    .map_err(|e| debug!(url, error = %e, "aggregator fetch failed"))
                    .ok()?;
                if !response.status().is_success() {
                    return None;
                }
                response.json::<Value>().await.ok()
            }
        });
        join_all(fetches).await.into_iter().flatten().collect()
    }

    /// Fan out a path whose replies are arrays, flattening and optionally
    /// deduplicating elements by their `id` field.
    async fn fan_out_arrays(&self, path: &str, dedup: bool) -> Vec<Value> {
        let mut merged = Vec::new();
        let mut seen: Vec<String> = Vec::new();
        for reply in self.fan_out(path).await {
            let Value::Array(items) = reply else {
                continue;
            };
            for item in items {
                if dedup {
                    if let Some(id) = item.get("id").and_then(Value::as_str) {
                        if seen.iter().any(|s| s == id) {
                            continue;
                        }
                        seen.push(id.to_owned());
                    }
                }
                merged.push(item);
            }
        }
        merged
    }
}

/// Build the aggregator router.
pub fn build_aggregator_router(state: Arc<AggregatorState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/state", get(api_state))
        .route("/api/agents", get(api_agents))
        .route("/api/pheromones", get(api_pheromones))
        .route("/api/thoughts", get(api_thoughts))
        .route("/api/collective", get(api_collective))
        .route("/api/report", get(api_report))
        .route("/api/attestations", get(api_attestations))
        .route("/api/identities", get(api_identities))
        .route("/api/inject", post(api_inject))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `GET /api/state` -- merged swarm overview.
async fn api_state(State(state): State<Arc<AggregatorState>>) -> impl IntoResponse {
    let agents = state.fan_out("/state").await;
    let transitioned = agents.iter().any(|a| {
        a.get("phaseTransitionOccurred")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    });
    let synced = agents
        .iter()
        .filter(|a| {
            a.get("synchronized")
                .and_then(Value::as_bool)
                .unwrap_or(false)
        })
        .count();
    Json(serde_json::json!({
        "agents": agents,
        "agentCount": state.agent_urls.len(),
        "reachable": agents.len(),
        "phaseTransitionOccurred": transitioned,
        "synchronizedCount": synced,
    }))
}

/// `GET /api/agents` -- each agent's snapshot, unmerged.
async fn api_agents(State(state): State<Arc<AggregatorState>>) -> impl IntoResponse {
    Json(state.fan_out("/state").await)
}

/// `GET /api/pheromones` -- union of all channels, deduplicated by id.
async fn api_pheromones(State(state): State<Arc<AggregatorState>>) -> impl IntoResponse {
    Json(state.fan_out_arrays("/pheromones", true).await)
}

/// `GET /api/thoughts` -- all agents' recent thoughts.
async fn api_thoughts(State(state): State<Arc<AggregatorState>>) -> impl IntoResponse {
    Json(state.fan_out_arrays("/thoughts", true).await)
}

/// `GET /api/collective` -- all collective memories, deduplicated by id.
async fn api_collective(State(state): State<Arc<AggregatorState>>) -> impl IntoResponse {
    Json(state.fan_out_arrays("/collective", true).await)
}

/// `GET /api/report` -- the freshest collective report (or plaintext
/// synthesis when no structured report exists).
async fn api_report(State(state): State<Arc<AggregatorState>>) -> impl IntoResponse {
    let mut memories = state.fan_out_arrays("/collective", true).await;
    memories.sort_by(|a, b| {
        let a_key = a.get("createdAt").and_then(Value::as_str).unwrap_or("");
        let b_key = b.get("createdAt").and_then(Value::as_str).unwrap_or("");
        b_key.cmp(a_key)
    });
    let latest = memories.first().cloned();
    let report = latest
        .as_ref()
        .and_then(|m| m.get("report").cloned())
        .filter(|r| !r.is_null());
    Json(serde_json::json!({
        "memory": latest,
        "report": report,
    }))
}

/// `GET /api/attestations` -- each agent's attestation view.
async fn api_attestations(State(state): State<Arc<AggregatorState>>) -> impl IntoResponse {
    Json(state.fan_out("/attestation").await)
}

/// `GET /api/identities` -- each agent's identity material.
async fn api_identities(State(state): State<Arc<AggregatorState>>) -> impl IntoResponse {
    Json(state.fan_out("/identity").await)
}

/// Body for `POST /api/inject`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InjectRequest {
    /// Domain tag for the injected signal.
    pub topic: Option<String>,
    /// Signal content; a default guidance line when absent.
    pub content: Option<String>,
}

/// `POST /api/inject` -- synthesize a human signal and broadcast it.
async fn api_inject(
    State(state): State<Arc<AggregatorState>>,
    Json(request): Json<InjectRequest>,
) -> impl IntoResponse {
    let signal = Signal {
        id: SignalId::new(),
        producer_id: AgentId::human(),
        content: request
            .content
            .unwrap_or_else(|| String::from("operator guidance")),
        domain: request.topic.unwrap_or_else(|| String::from("guidance")),
        confidence: 0.9,
        strength: 0.9,
        connections: Vec::new(),
        timestamp: Signal::now_timestamp(),
        // Human injections are unsigned; verification is advisory and will
        // simply mark them unverified.
        attestation: String::from("unsigned"),
        producer_pubkey: None,
        da_commitment: None,
    };

    let pushes = state.agent_urls.iter().map(|base| {
        let url = format!("{base}/pheromone");
        let signal = signal.clone();
        let client = state.client.clone();
        async move {
            client
                .post(&url)
                .timeout(PEER_DEADLINE)
                .json(&signal)
                .send()
                .await
                .map(|r| r.status().is_success())
                .unwrap_or(false)
        }
    });
    let delivered = join_all(pushes).await.into_iter().filter(|ok| *ok).count();

    Json(serde_json::json!({
        "ok": true,
        "id": signal.id,
        "delivered": delivered,
    }))
}
