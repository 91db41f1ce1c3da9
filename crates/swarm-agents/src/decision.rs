//! The decision engine: candidate generation, scoring, and selection.
//!
//! Candidates come from recent thoughts (normalized to canonical topics),
//! cached datasets, and personality-gated share/correlate opportunities.
//! Scoring combines a static base priority, budget efficiency, novelty
//! against the recent action history, a personality fit term, and a swarm
//! bonus for post-transition correlation. Selection is softmax over
//! priority; temperature zero degenerates to argmax with first-wins
//! tie-breaking.

use std::collections::BTreeMap;

use chrono::Utc;
use rand::Rng;

use swarm_types::{
    normalize_topic, ActionKind, AgentAction, AgentId, Dataset, Decision, DecisionId,
    DecisionStatus, CANONICAL_TOPICS,
};

use crate::state::AgentState;

/// How many recent thoughts feed candidate generation.
const THOUGHT_WINDOW: usize = 5;

/// How many recent decisions feed the novelty check.
const NOVELTY_WINDOW: usize = 8;

/// Probability of proposing a re-analysis of a cached dataset.
const REANALYZE_P: f64 = 0.3;

/// A scored candidate action.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// The proposed action.
    pub action: AgentAction,
    /// Final score; the softmax input.
    pub priority: f64,
    /// Estimated reasoning-token cost.
    pub estimated_tokens: u64,
    /// Estimated execution time in milliseconds.
    pub estimated_ms: u64,
}

impl Candidate {
    /// Promote the candidate into a pending [`Decision`] for an agent.
    pub fn into_decision(self, agent_id: AgentId) -> Decision {
        Decision {
            id: DecisionId::new(),
            agent_id,
            action: self.action,
            priority: self.priority,
            estimated_tokens: self.estimated_tokens,
            estimated_ms: self.estimated_ms,
            status: DecisionStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }
}

/// Generate and score candidate actions for the current step.
///
/// Candidates whose estimated token cost exceeds the remaining budget are
/// dropped before scoring; a successful action can therefore never be
/// recorded beyond the budget known at generation time.
pub fn generate_candidates(
    state: &AgentState,
    channel_signal_count: usize,
    datasets: &BTreeMap<String, Dataset>,
    transitioned: bool,
    rng: &mut impl Rng,
) -> Vec<Candidate> {
    let mut actions: Vec<AgentAction> = Vec::new();

    // 1-2. Topics suggested by recent thoughts, normalized, not yet studied.
    let mut suggested: Vec<&'static str> = Vec::new();
    for thought in state.recent_thoughts(THOUGHT_WINDOW) {
        for suggestion in &thought.suggested_actions {
            if let Some(topic) = normalize_topic(suggestion) {
                if !suggested.contains(&topic) {
                    suggested.push(topic);
                }
            }
        }
    }
    for topic in &suggested {
        if !state.has_studied(topic) {
            actions.push(AgentAction::AnalyzeDataset {
                topic: (*topic).to_owned(),
            });
        }
    }

    // 3. Occasionally revisit a cached dataset.
    if !datasets.is_empty() && rng.random_bool(REANALYZE_P) {
        let keys: Vec<&String> = datasets.keys().collect();
        let idx = rng.random_range(0..keys.len());
        if let Some(topic) = keys.get(idx) {
            actions.push(AgentAction::AnalyzeDataset {
                topic: (*topic).clone(),
            });
        }
    }

    // 4. Share the best finding, for social agents with an audience.
    if !state.thoughts.is_empty()
        && state.personality.sociability > 0.4
        && channel_signal_count > 2
    {
        let best = state
            .thoughts
            .iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence));
        if let Some(thought) = best {
            actions.push(AgentAction::ShareFinding {
                finding: thought.conclusion.clone(),
                topic: normalize_topic(&thought.observation).map(ToOwned::to_owned),
            });
        }
    }

    // 5. Correlate two cached datasets, for curious agents.
    if datasets.len() >= 2 && state.personality.curiosity > 0.5 {
        let keys: Vec<&String> = datasets.keys().collect();
        let first = rng.random_range(0..keys.len());
        let mut second = rng.random_range(0..keys.len());
        if second == first {
            second = (second + 1) % keys.len();
        }
        if let (Some(a), Some(b)) = (keys.get(first), keys.get(second)) {
            actions.push(AgentAction::CorrelateFindings {
                topics: vec![(*a).clone(), (*b).clone()],
            });
        }
    }

    // 6. Never return empty-handed: fall back to exploration.
    if actions.is_empty() {
        let unstudied: Vec<&&str> = CANONICAL_TOPICS
            .iter()
            .filter(|t| !state.has_studied(t))
            .collect();
        let topic = if unstudied.is_empty() {
            let idx = rng.random_range(0..CANONICAL_TOPICS.len());
            CANONICAL_TOPICS.get(idx).copied().unwrap_or("exoplanets")
        } else {
            let idx = rng.random_range(0..unstudied.len());
            unstudied.get(idx).copied().copied().unwrap_or("exoplanets")
        };
        actions.push(AgentAction::ExploreTopic {
            topic: topic.to_owned(),
        });
    }

    // 7. Budget guard, then scoring.
    let remaining = state.remaining_budget();
    let recent = recent_kinds(state);
    let proposed = actions.len();
    let affordable: Vec<AgentAction> = actions
        .into_iter()
        .filter(|action| action.kind().token_estimate() <= remaining)
        .collect();
    if affordable.len() < proposed {
        tracing::debug!(
            proposed,
            affordable = affordable.len(),
            remaining,
            "budget guard dropped candidates"
        );
    }
    affordable
        .into_iter()
        .map(|action| {
            let kind = action.kind();
            Candidate {
                priority: score(kind, state, &recent, transitioned),
                estimated_tokens: kind.token_estimate(),
                estimated_ms: kind.time_estimate_ms(),
                action,
            }
        })
        .collect()
}

/// Score one action kind for the given agent.
///
/// ```text
/// base        = priority_base * 0.25
/// efficiency  = max(0, 1 - cost/remaining) * 0.25
/// novelty     = 0.15 if kind not in last 8 decisions
/// fit         = personality-weighted * 0.15
/// swarm bonus = 0.10 for correlate after the transition
/// ```
pub fn score(kind: ActionKind, state: &AgentState, recent: &[ActionKind], transitioned: bool) -> f64 {
    let base = kind.priority_base() * 0.25;

    let remaining = state.remaining_budget();
    let efficiency = if remaining == 0 {
        0.0
    } else {
        let cost_ratio = token_f(kind.token_estimate()) / token_f(remaining);
        (1.0 - cost_ratio).max(0.0) * 0.25
    };

    let novelty = if recent.contains(&kind) { 0.0 } else { 0.15 };

    let p = &state.personality;
    let fit = match kind {
        ActionKind::Analyze | ActionKind::Explore => p.curiosity * 0.15,
        ActionKind::Share => p.sociability * 0.15,
        ActionKind::Correlate => ((p.curiosity + p.diligence) / 2.0) * 0.15,
    };

    let swarm_bonus = if transitioned && kind == ActionKind::Correlate {
        0.10
    } else {
        0.0
    };

    base + efficiency + novelty + fit + swarm_bonus
}

/// Select a candidate via softmax over priority.
///
/// With `temperature <= 0` the selection is deterministic argmax and ties
/// break toward the first candidate. Otherwise weights are
/// `exp((p_i - max p) / T)` and the draw is proportional.
pub fn select_decision(
    candidates: &[Candidate],
    temperature: f64,
    rng: &mut impl Rng,
) -> Option<Candidate> {
    if candidates.is_empty() {
        return None;
    }

    if temperature <= 0.0 {
        let mut best: Option<&Candidate> = None;
        for candidate in candidates {
            match best {
                Some(current) if candidate.priority > current.priority => {
                    best = Some(candidate);
                }
                None => best = Some(candidate),
                Some(_) => {}
            }
        }
        return best.cloned();
    }

    let max_p = candidates
        .iter()
        .map(|c| c.priority)
        .fold(f64::NEG_INFINITY, f64::max);
    let weights: Vec<f64> = candidates
        .iter()
        .map(|c| ((c.priority - max_p) / temperature).exp())
        .collect();
    let total: f64 = weights.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return candidates.first().cloned();
    }

    let mut draw = rng.random_range(0.0..total);
    for (candidate, weight) in candidates.iter().zip(&weights) {
        if draw < *weight {
            return Some(candidate.clone());
        }
        draw -= weight;
    }
    candidates.last().cloned()
}

/// Whether the agent should abandon its current track and re-decide.
///
/// Always switches when the budget is exhausted or no decision is in
/// flight; otherwise switches with probability 0.25 after success and 0.7
/// after failure.
pub fn should_switch(state: &AgentState, last_success: bool, rng: &mut impl Rng) -> bool {
    if state.tokens_used >= state.token_budget || state.current_decision.is_none() {
        return true;
    }
    let p = if last_success { 0.25 } else { 0.7 };
    rng.random_bool(p)
}

/// Kinds of the last eight resolved decisions.
fn recent_kinds(state: &AgentState) -> Vec<ActionKind> {
    let start = state.decisions.len().saturating_sub(NOVELTY_WINDOW);
    state
        .decisions
        .get(start..)
        .unwrap_or(&[])
        .iter()
        .map(|d| d.action.kind())
        .collect()
}

/// Token counts as f64; budgets are far inside `u32` so the widening is
/// exact.
fn token_f(n: u64) -> f64 {
    f64::from(u32::try_from(n).unwrap_or(u32::MAX))
}
