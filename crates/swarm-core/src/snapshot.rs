//! Read-model projections served over HTTP.
//!
//! The tick loop owns the live [`AgentState`](swarm_agents::AgentState);
//! read endpoints never touch it. Instead the loop publishes an
//! [`AgentSnapshot`] once per tick, so everything a handler returns may be
//! up to one tick stale by design.

use serde::{Deserialize, Serialize};

use swarm_agents::Vec2;
use swarm_ledger::CreditSnapshot;
use swarm_types::{AgentRole, CollectiveMemory, Decision, Signal, Thought};

/// Identity material exposed on `/identity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityInfo {
    /// Opaque agent id.
    pub agent_id: String,
    /// Display name.
    pub name: String,
    /// Hex-encoded Ed25519 public key.
    pub public_key: String,
    /// First 16 hex chars of `sha256(public_key)`.
    pub fingerprint: String,
    /// When the keypair was generated (RFC 3339).
    pub created_at: String,
    /// Whether key generation was delegated to a hardware enclave.
    pub tee_mode: bool,
}

/// Per-tick projection of one agent's state for the read API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSnapshot {
    /// Opaque agent id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Seed role.
    pub role: AgentRole,
    /// Specialization label.
    pub specialization: String,
    /// Ticks completed.
    pub step: u64,
    /// Channel density at snapshot time.
    pub density: f64,
    /// Configured critical density threshold.
    pub critical_threshold: f64,
    /// Whether the transition latch is set.
    pub phase_transition_occurred: bool,
    /// Step at which the latch was set, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_step: Option<u64>,
    /// Agent-local synchronization flag.
    pub synchronized: bool,
    /// Energy in `[0, 1]`.
    pub energy: f64,
    /// World position.
    pub position: Vec2,
    /// Successful analyses and correlations.
    pub discoveries: u32,
    /// Reasoning tokens consumed.
    pub tokens_used: u64,
    /// Reasoning-token budget.
    pub token_budget: u64,
    /// Total thoughts formed.
    pub thought_count: usize,
    /// The most recent thought.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_thought: Option<Thought>,
    /// The last 50 thoughts, newest first.
    pub thoughts: Vec<Thought>,
    /// The last 20 resolved decisions, newest first.
    pub decisions: Vec<Decision>,
    /// Signals currently in the local channel.
    pub channel_signals: usize,
    /// Credit ledger snapshot.
    pub credits: CreditSnapshot,
    /// Identity material.
    pub identity: IdentityInfo,
    /// Collective memories synthesized so far.
    pub collective: Vec<CollectiveMemory>,
    /// The most recently emitted (signed) signal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_signal: Option<Signal>,
    /// Reasoning backend label.
    pub backend: String,
    /// Whether DA dispersal is configured.
    pub da_enabled: bool,
}
