//! Collective synthesis at the phase transition.
//!
//! When a process latches its transition it assembles what the swarm
//! appears to have converged on: rich signals are grouped by domain, the
//! densest domain becomes the topic, and an evidence bundle of local
//! thoughts plus peer signals is handed to the reasoning backend for a
//! structured report. The plaintext synthesis is always produced, so the
//! memory stands even when the backend is unreachable.

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{debug, info};

use swarm_agents::AgentState;
use swarm_identity::AgentKeypair;
use swarm_reasoning::{GatedReasoner, PromptEngine, ReasonOptions};
use swarm_types::{AgentId, CollectiveMemory, MemoryId, Signal, SignalId};

use crate::parse;

/// Minimum strength for a signal to count as rich evidence.
const RICH_STRENGTH: f64 = 0.3;

/// Minimum content length for a signal to count as rich evidence.
const RICH_CONTENT_LEN: usize = 40;

/// Distinct producers required before a synthesis is attempted.
const MIN_CONTRIBUTORS: usize = 2;

/// Contributor conclusions kept in the plaintext synthesis.
const SYNTHESIS_TRIM: usize = 6;

/// The outcome of a synthesis attempt.
pub struct SynthesisOutcome {
    /// The memory produced.
    pub memory: CollectiveMemory,
    /// Tokens charged by the report call (zero when skipped or failed).
    pub tokens_used: u64,
}

/// Attempt a collective synthesis over the given channel snapshot.
///
/// Returns `None` when fewer than two distinct producers contributed rich
/// signals. Never errors: an unreachable backend simply omits the
/// structured report.
pub async fn synthesize(
    signals: &[Signal],
    state: &AgentState,
    keypair: &AgentKeypair,
    reasoner: &GatedReasoner,
    prompts: &PromptEngine,
) -> Option<SynthesisOutcome> {
    let rich: Vec<&Signal> = signals
        .iter()
        .filter(|s| {
            s.strength >= RICH_STRENGTH
                && s.content.len() > RICH_CONTENT_LEN
                && s.domain != "meta"
                && s.domain != "distress"
        })
        .collect();

    // Densest domain wins the topic.
    let mut by_domain: BTreeMap<&str, usize> = BTreeMap::new();
    for signal in &rich {
        let count = by_domain.entry(signal.domain.as_str()).or_insert(0);
        *count = count.saturating_add(1);
    }
    let topic = by_domain
        .iter()
        .max_by_key(|(_, count)| **count)
        .map(|(domain, _)| (*domain).to_owned())?;

    let mut contributors: Vec<AgentId> = Vec::new();
    for signal in &rich {
        if !contributors.contains(&signal.producer_id) {
            contributors.push(signal.producer_id.clone());
        }
    }
    if contributors.len() < MIN_CONTRIBUTORS {
        debug!(
            contributors = contributors.len(),
            "synthesis aborted: not enough distinct producers"
        );
        return None;
    }

    // Evidence bundle: own best thoughts plus the strongest peer signals.
    let mut bundle: Vec<serde_json::Value> = Vec::new();
    let mut own_thoughts: Vec<_> = state.thoughts.iter().collect();
    own_thoughts.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    for thought in own_thoughts.iter().take(3) {
        bundle.push(serde_json::json!({
            "producerName": state.name,
            "specialization": state.specialization,
            "observation": thought.observation,
            "reasoning": thought.reasoning,
            "conclusion": thought.conclusion,
            "confidence": thought.confidence,
        }));
    }
    let mut strongest: Vec<&&Signal> = rich.iter().collect();
    strongest.sort_by(|a, b| b.strength.total_cmp(&a.strength));
    for signal in strongest.iter().take(6) {
        if signal.producer_id == state.id {
            continue;
        }
        bundle.push(serde_json::json!({
            "producerName": signal.producer_id.as_str(),
            "specialization": "peer signal",
            "observation": signal.content,
            "reasoning": "gossiped evidence",
            "conclusion": signal.content,
            "confidence": signal.confidence,
        }));
    }

    // Structured report, tier-gated like any other reasoning call.
    let mut tokens_used = 0u64;
    let report = match prompts.render_collective_report(&topic, &state.topics_studied, &bundle)
    {
        Ok(user) => {
            let system = prompts
                .render_system(&state.name, &state.specialization, &state.personality)
                .unwrap_or_default();
            let gated = reasoner
                .reason(
                    state.credits.tier(),
                    &system,
                    &user,
                    ReasonOptions {
                        max_tokens: 2_048,
                        ..ReasonOptions::default()
                    },
                )
                .await;
            tokens_used = gated.reply.tokens_used;
            parse::parse_report(&gated.reply.content)
        }
        Err(_) => None,
    };

    // Plaintext synthesis: contributor conclusions, trimmed.
    let synthesis = strongest
        .iter()
        .take(SYNTHESIS_TRIM)
        .map(|s| s.content.as_str())
        .collect::<Vec<_>>()
        .join("; ");

    let total_confidence: f64 = rich.iter().map(|s| s.confidence).sum();
    let confidence = total_confidence / rich_len_f(rich.len());

    let created_at = Utc::now();
    let attestation = keypair.sign_attestation(
        &synthesis,
        &state.id,
        created_at.timestamp_millis(),
    );

    let signal_ids: Vec<SignalId> = rich.iter().map(|s| s.id).collect();
    info!(
        topic,
        contributors = contributors.len(),
        signals = signal_ids.len(),
        with_report = report.is_some(),
        "collective memory synthesized"
    );

    Some(SynthesisOutcome {
        memory: CollectiveMemory {
            id: MemoryId::new(),
            topic,
            synthesis,
            contributors,
            signal_ids,
            confidence,
            attestation,
            created_at,
            report,
        },
        tokens_used,
    })
}

/// Rich-signal counts are tiny; the `u32 -> f64` widening is exact.
fn rich_len_f(n: usize) -> f64 {
    f64::from(u32::try_from(n.max(1)).unwrap_or(u32::MAX))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use swarm_ledger::CreditLedger;
    use swarm_reasoning::ReasoningBackend;
    use swarm_types::AgentRole;

    use super::*;

    fn make_state() -> AgentState {
        let mut rng = SmallRng::seed_from_u64(61);
        AgentState::new(
            AgentId::new("agent-0"),
            String::from("Mira"),
            AgentRole::Synthesizer,
            String::from("aa"),
            String::from("bb"),
            50_000,
            CreditLedger::default(),
            &mut rng,
        )
    }

    fn rich_signal(producer: &str, domain: &str, strength: f64) -> Signal {
        Signal {
            id: SignalId::new(),
            producer_id: AgentId::new(producer),
            content: format!(
                "a sufficiently long finding about {domain} exceeding forty characters"
            ),
            domain: domain.to_owned(),
            confidence: 0.8,
            strength,
            connections: Vec::new(),
            timestamp: Signal::now_timestamp(),
            attestation: String::new(),
            producer_pubkey: None,
            da_commitment: None,
        }
    }

    fn fixtures() -> (AgentState, AgentKeypair, GatedReasoner, PromptEngine) {
        (
            make_state(),
            AgentKeypair::from_secret_bytes(&[9u8; 32]),
            GatedReasoner::new(ReasoningBackend::Disabled),
            PromptEngine::new().unwrap(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn synthesis_requires_two_producers() {
        let (state, keypair, reasoner, prompts) = fixtures();
        let signals = vec![
            rich_signal("agent-1", "solar_activity", 0.6),
            rich_signal("agent-1", "solar_activity", 0.5),
        ];
        let outcome = synthesize(&signals, &state, &keypair, &reasoner, &prompts).await;
        assert!(outcome.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn synthesis_picks_densest_domain() {
        let (state, keypair, reasoner, prompts) = fixtures();
        let signals = vec![
            rich_signal("agent-1", "solar_activity", 0.6),
            rich_signal("agent-2", "solar_activity", 0.5),
            rich_signal("agent-2", "exoplanets", 0.9),
        ];
        let outcome = synthesize(&signals, &state, &keypair, &reasoner, &prompts)
            .await
            .unwrap();
        assert_eq!(outcome.memory.topic, "solar_activity");
        assert_eq!(outcome.memory.contributors.len(), 2);
        assert_eq!(outcome.memory.signal_ids.len(), 3);
        // Disabled backend: no structured report, but the plaintext stands.
        assert!(outcome.memory.report.is_none());
        assert!(!outcome.memory.synthesis.is_empty());
        assert_eq!(outcome.tokens_used, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn weak_or_short_signals_are_not_evidence() {
        let (state, keypair, reasoner, prompts) = fixtures();
        let mut weak = rich_signal("agent-1", "solar_activity", 0.1);
        weak.strength = 0.1;
        let mut short = rich_signal("agent-2", "solar_activity", 0.6);
        short.content = String::from("tiny");
        let outcome = synthesize(&[weak, short], &state, &keypair, &reasoner, &prompts).await;
        assert!(outcome.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn attestation_binds_the_synthesis() {
        let (state, keypair, reasoner, prompts) = fixtures();
        let signals = vec![
            rich_signal("agent-1", "mars_weather", 0.6),
            rich_signal("agent-2", "mars_weather", 0.5),
        ];
        let outcome = synthesize(&signals, &state, &keypair, &reasoner, &prompts)
            .await
            .unwrap();
        let verification = swarm_identity::verify_attestation(
            &outcome.memory.attestation,
            &outcome.memory.synthesis,
            &state.id,
            outcome.memory.created_at.timestamp_millis(),
        );
        assert!(verification.valid);
    }
}
