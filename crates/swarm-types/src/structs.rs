//! Core value objects produced and exchanged by agents.
//!
//! [`Signal`] is the only type that crosses process boundaries on the gossip
//! path; its serde representation is the wire format and rejects unknown
//! fields at the edge. The remaining types are per-agent value objects that
//! surface on the read API and in the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::DecisionStatus;
use crate::ids::{AgentId, DecisionId, MemoryId, SignalId, ThoughtId};
use crate::AgentAction;

// ---------------------------------------------------------------------------
// Signal (pheromone)
// ---------------------------------------------------------------------------

/// A signed, decaying knowledge token gossiped between agents.
///
/// `confidence` is the producer's self-assessment and never changes;
/// `strength` is the mutable vitality that decays each tick and is boosted
/// when peers absorb the signal. Channels prune signals once strength falls
/// to 0.05 or below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Signal {
    /// Globally unique identifier; the dedup key across the gossip network.
    pub id: SignalId,
    /// The producing agent's identity.
    pub producer_id: AgentId,
    /// Opaque text payload (treated as bytes for signing).
    pub content: String,
    /// Free-form categorical tag used for grouping and routing.
    pub domain: String,
    /// Producer's self-assessed certainty in `[0, 1]`. Immutable.
    pub confidence: f64,
    /// Mutable vitality in `[0, 1]`; decays each tick, boosted on absorption.
    pub strength: f64,
    /// Ids of the signals this one derives from.
    pub connections: Vec<SignalId>,
    /// Producer wall-clock at emission, epoch milliseconds.
    pub timestamp: i64,
    /// `"ed25519:<sig>:<pubkey>"` over `content|producerId|timestamp`.
    pub attestation: String,
    /// Hex-encoded producer public key, when the producer chose to expose it
    /// outside the attestation string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub producer_pubkey: Option<String>,
    /// Opaque data-availability commitment, set asynchronously after
    /// dispersal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub da_commitment: Option<String>,
}

impl Signal {
    /// Current wall-clock in the wire timestamp unit (epoch milliseconds).
    pub fn now_timestamp() -> i64 {
        Utc::now().timestamp_millis()
    }
}

// ---------------------------------------------------------------------------
// Thought
// ---------------------------------------------------------------------------

/// A structured reasoning artifact produced by a deep step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thought {
    /// Unique identifier.
    pub id: ThoughtId,
    /// The thinking agent.
    pub producer_id: AgentId,
    /// What prompted the thought (absorbed signals, a dataset, an anomaly).
    pub trigger: String,
    /// The raw observation being reasoned about.
    pub observation: String,
    /// The reasoning chain.
    pub reasoning: String,
    /// The conclusion drawn.
    pub conclusion: String,
    /// Free-text follow-up actions; normalized to canonical topics by the
    /// decision engine.
    pub suggested_actions: Vec<String>,
    /// Self-assessed confidence in `[0, 1]`.
    pub confidence: f64,
    /// When the thought was formed.
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// A scored, selected action with its lifecycle state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    /// Unique identifier.
    pub id: DecisionId,
    /// The deciding agent.
    pub agent_id: AgentId,
    /// The action to execute.
    pub action: AgentAction,
    /// Final score out of the decision engine.
    pub priority: f64,
    /// Estimated reasoning-token cost at generation time.
    pub estimated_tokens: u64,
    /// Estimated execution time in milliseconds.
    pub estimated_ms: u64,
    /// Lifecycle state.
    pub status: DecisionStatus,
    /// When the decision was selected.
    pub created_at: DateTime<Utc>,
    /// When execution completed or failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Artifact
// ---------------------------------------------------------------------------

/// A concrete output of a successful action execution.
///
/// Executors emit a signal only when at least one artifact was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// Artifact kind (`analysis`, `finding`, `correlation`, `survey`).
    pub kind: String,
    /// Short human-readable label.
    pub label: String,
    /// The artifact body text.
    pub body: String,
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// A cached dataset fetched from the external data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    /// Canonical topic this dataset belongs to.
    pub topic: String,
    /// Dataset title.
    pub title: String,
    /// One-paragraph summary.
    pub summary: String,
    /// Notable individual facts, used by light steps.
    pub highlights: Vec<String>,
    /// Where the dataset came from.
    pub source_url: String,
    /// When the dataset was fetched.
    pub fetched_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Collective synthesis
// ---------------------------------------------------------------------------

/// Structured report produced by the reasoning backend at synthesis time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectiveReport {
    /// One-paragraph overview of the swarm's findings.
    pub overview: String,
    /// The key findings, one per line.
    pub key_findings: Vec<String>,
    /// Divergent or dissenting opinions across contributors.
    pub opinions: String,
    /// Suggested improvements or follow-ups.
    pub improvements: Vec<String>,
    /// Final verdict sentence.
    pub verdict: String,
}

/// An immutable record of a completed collective synthesis.
///
/// Created at most once per synthesis interval after a phase transition.
/// `synthesis` is the plaintext fallback payload; `report` is present only
/// when the reasoning backend was reachable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectiveMemory {
    /// Unique identifier.
    pub id: MemoryId,
    /// The densest signal domain at synthesis time.
    pub topic: String,
    /// Plaintext synthesis (contributor conclusions, trimmed to 6).
    pub synthesis: String,
    /// Distinct contributing producers (at least 2).
    pub contributors: Vec<AgentId>,
    /// The rich signals the synthesis drew from.
    pub signal_ids: Vec<SignalId>,
    /// Mean contributor confidence.
    pub confidence: f64,
    /// Attestation by the synthesizing agent.
    pub attestation: String,
    /// When the memory was created.
    pub created_at: DateTime<Utc>,
    /// Structured report, when the backend produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<CollectiveReport>,
}

// ---------------------------------------------------------------------------
// Personality
// ---------------------------------------------------------------------------

/// Immutable personality vector assigned at agent creation.
///
/// Each trait is in `[0, 1]`. Personality weights decision scoring and the
/// think/synthesize split but never changes over the agent's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Personality {
    /// Appetite for new topics and unanalyzed datasets.
    pub curiosity: f64,
    /// Preference for methodical, repeated analysis.
    pub diligence: f64,
    /// Willingness to act on low-confidence information.
    pub boldness: f64,
    /// Preference for sharing and synthesizing over solo work.
    pub sociability: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_signal() -> Signal {
        Signal {
            id: SignalId::new(),
            producer_id: AgentId::new("agent-0"),
            content: String::from("mars surface pressure trending down"),
            domain: String::from("mars_weather"),
            confidence: 0.8,
            strength: 0.74,
            connections: vec![SignalId::new()],
            timestamp: Signal::now_timestamp(),
            attestation: String::from("ed25519:00:00"),
            producer_pubkey: None,
            da_commitment: None,
        }
    }

    #[test]
    fn signal_wire_format_is_camel_case() {
        let signal = sample_signal();
        let json = serde_json::to_value(&signal).unwrap_or_default();
        assert!(json.get("producerId").is_some());
        assert!(json.get("connections").is_some());
        // Absent options are omitted entirely.
        assert!(json.get("daCommitment").is_none());
    }

    #[test]
    fn signal_rejects_unknown_fields() {
        let mut json = serde_json::to_value(sample_signal()).unwrap_or_default();
        if let Some(obj) = json.as_object_mut() {
            obj.insert(String::from("surprise"), serde_json::json!(1));
        }
        let parsed: Result<Signal, _> = serde_json::from_value(json);
        assert!(parsed.is_err());
    }

    #[test]
    fn signal_roundtrip() {
        let signal = sample_signal();
        let json = serde_json::to_string(&signal).unwrap_or_default();
        let back: Result<Signal, _> = serde_json::from_str(&json);
        assert_eq!(back.ok().as_ref(), Some(&signal));
    }

    #[test]
    fn decision_resolved_at_omitted_when_none() {
        let decision = Decision {
            id: DecisionId::new(),
            agent_id: AgentId::new("agent-1"),
            action: AgentAction::ExploreTopic {
                topic: String::from("exoplanets"),
            },
            priority: 0.6,
            estimated_tokens: 2_000,
            estimated_ms: 10_000,
            status: DecisionStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
        };
        let json = serde_json::to_value(&decision).unwrap_or_default();
        assert!(json.get("resolvedAt").is_none());
        assert_eq!(json.get("status").and_then(|v| v.as_str()), Some("pending"));
    }
}
