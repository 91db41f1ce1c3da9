//! The per-agent mutable state container.
//!
//! Each agent process exclusively owns one [`AgentState`]; nothing outside
//! the owning loop writes to it. Read endpoints see a projected snapshot
//! taken once per tick.

use std::collections::BTreeSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use swarm_ledger::CreditLedger;
use swarm_types::{AgentId, AgentRole, Decision, Personality, Signal, SignalId, Thought};

use crate::personality;

/// Maximum absorbed signals remembered as knowledge.
const KNOWLEDGE_CAP: usize = 100;

/// A 2D point or vector in world coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal component.
    pub x: f64,
    /// Vertical component.
    pub y: f64,
}

impl Vec2 {
    /// Construct from components.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Mutable state owned by exactly one agent loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    /// Opaque agent identity.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Immutable personality vector.
    pub personality: Personality,
    /// The seed role.
    pub role: AgentRole,
    /// Human-readable specialization label derived from the role.
    pub specialization: String,
    /// Position in the world rectangle.
    pub position: Vec2,
    /// Velocity, damped each tick.
    pub velocity: Vec2,
    /// Energy in `[0, 1]`; grows on absorption, reset on synchronization.
    pub energy: f64,
    /// Agent-local synchronization flag (distinct from the channel-wide
    /// transition latch).
    pub synchronized: bool,
    /// Producers whose signals this agent has absorbed this cycle.
    pub synced_with: BTreeSet<AgentId>,
    /// Ids of signals absorbed this cycle.
    pub absorbed: BTreeSet<SignalId>,
    /// Absorbed signals retained as knowledge (bounded).
    pub knowledge: Vec<Signal>,
    /// Thoughts produced by deep steps.
    pub thoughts: Vec<Thought>,
    /// Resolved decisions.
    pub decisions: Vec<Decision>,
    /// The decision currently executing, if any.
    pub current_decision: Option<Decision>,
    /// Canonical topics this agent has analyzed.
    pub topics_studied: Vec<String>,
    /// Reasoning-backend tokens consumed so far.
    pub tokens_used: u64,
    /// Reasoning-token budget for the whole run.
    pub token_budget: u64,
    /// The credit ledger gating reasoning calls.
    pub credits: CreditLedger,
    /// Hex-encoded public key (identity lives with the loop; only public
    /// material is stored here).
    pub public_key: String,
    /// Identity fingerprint.
    pub fingerprint: String,
    /// Ticks completed.
    pub step_count: u64,
    /// Count of successful analyses and correlations.
    pub discoveries: u32,
    /// Count of collective memories this agent contributed to.
    pub contributions_to_collective: u32,
}

impl AgentState {
    /// Create a fresh agent at a random position with a role-seeded,
    /// jittered personality.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: AgentId,
        name: String,
        role: AgentRole,
        public_key: String,
        fingerprint: String,
        token_budget: u64,
        credits: CreditLedger,
        rng: &mut impl Rng,
    ) -> Self {
        Self {
            id,
            name,
            personality: personality::seeded(role, rng),
            role,
            specialization: String::from(role.specialization()),
            position: Vec2::new(rng.random_range(20.0..80.0), rng.random_range(20.0..80.0)),
            velocity: Vec2::default(),
            energy: 0.6,
            synchronized: false,
            synced_with: BTreeSet::new(),
            absorbed: BTreeSet::new(),
            knowledge: Vec::new(),
            thoughts: Vec::new(),
            decisions: Vec::new(),
            current_decision: None,
            topics_studied: Vec::new(),
            tokens_used: 0,
            token_budget,
            credits,
            public_key,
            fingerprint,
            step_count: 0,
            discoveries: 0,
            contributions_to_collective: 0,
        }
    }

    /// Remaining reasoning-token budget.
    pub const fn remaining_budget(&self) -> u64 {
        self.token_budget.saturating_sub(self.tokens_used)
    }

    /// Charge tokens against both the budget counter and the credit ledger.
    pub fn charge_tokens(&mut self, tokens: u64) {
        self.tokens_used = self.tokens_used.saturating_add(tokens);
        self.credits.debit_tokens(tokens);
    }

    /// Record an absorbed signal: remember the id, the producer, and the
    /// signal itself (bounded), and gain a little energy.
    pub fn record_absorption(&mut self, signal: Signal) {
        self.absorbed.insert(signal.id);
        self.synced_with.insert(signal.producer_id.clone());
        self.energy = (self.energy + 0.05).min(1.0);
        self.knowledge.push(signal);
        if self.knowledge.len() > KNOWLEDGE_CAP {
            let overflow = self.knowledge.len().saturating_sub(KNOWLEDGE_CAP);
            self.knowledge.drain(..overflow);
        }
    }

    /// Agent-local synchronization check.
    ///
    /// Fires once per cycle when density has reached the critical threshold,
    /// at least three signals have been absorbed, and energy exceeds 0.5.
    /// On synchronization, energy snaps to 1.
    pub fn check_sync(&mut self, density: f64, critical_threshold: f64) -> bool {
        if self.synchronized {
            return false;
        }
        if density >= critical_threshold && self.absorbed.len() >= 3 && self.energy > 0.5 {
            self.synchronized = true;
            self.energy = 1.0;
            return true;
        }
        false
    }

    /// Cycle reset: clear synchronization and absorption state and reseed
    /// energy into `[0.3, 0.5]`. The channel reset happens separately.
    pub fn reset_cycle(&mut self, rng: &mut impl Rng) {
        self.synchronized = false;
        self.synced_with.clear();
        self.absorbed.clear();
        self.energy = rng.random_range(0.3..=0.5);
    }

    /// Whether the topic has already been analyzed.
    pub fn has_studied(&self, topic: &str) -> bool {
        self.topics_studied.iter().any(|t| t == topic)
    }

    /// Record a studied topic exactly once.
    pub fn record_studied(&mut self, topic: &str) {
        if !self.has_studied(topic) {
            self.topics_studied.push(topic.to_owned());
        }
    }

    /// The most recent thoughts, newest last, bounded by `n`.
    pub fn recent_thoughts(&self, n: usize) -> &[Thought] {
        let start = self.thoughts.len().saturating_sub(n);
        self.thoughts.get(start..).unwrap_or(&[])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;

    fn make_state() -> AgentState {
        let mut rng = SmallRng::seed_from_u64(5);
        AgentState::new(
            AgentId::new("agent-0"),
            String::from("Vela"),
            AgentRole::Analyst,
            String::from("ab".repeat(32)),
            String::from("0123456789abcdef"),
            50_000,
            CreditLedger::default(),
            &mut rng,
        )
    }

    fn make_signal(producer: &str, strength: f64) -> Signal {
        Signal {
            id: SignalId::new(),
            producer_id: AgentId::new(producer),
            content: String::from("x"),
            domain: String::from("exoplanets"),
            confidence: 0.7,
            strength,
            connections: Vec::new(),
            timestamp: Signal::now_timestamp(),
            attestation: String::new(),
            producer_pubkey: None,
            da_commitment: None,
        }
    }

    #[test]
    fn charge_tokens_updates_budget_and_credits() {
        let mut state = make_state();
        state.charge_tokens(2_000);
        assert_eq!(state.tokens_used, 2_000);
        assert_eq!(state.remaining_budget(), 48_000);
        assert_eq!(state.credits.spent(), rust_decimal::Decimal::from(2_000u64));
    }

    #[test]
    fn absorption_gains_energy_and_tracks_producer() {
        let mut state = make_state();
        state.energy = 0.5;
        state.record_absorption(make_signal("agent-1", 0.8));
        assert!((state.energy - 0.55).abs() < 1e-12);
        assert_eq!(state.absorbed.len(), 1);
        assert!(state.synced_with.contains(&AgentId::new("agent-1")));
        assert_eq!(state.knowledge.len(), 1);
    }

    #[test]
    fn knowledge_is_bounded() {
        let mut state = make_state();
        for _ in 0..150 {
            state.record_absorption(make_signal("agent-1", 0.8));
        }
        assert_eq!(state.knowledge.len(), 100);
    }

    #[test]
    fn sync_requires_all_three_conditions() {
        let mut state = make_state();
        state.energy = 0.9;
        for _ in 0..3 {
            state.record_absorption(make_signal("agent-1", 0.8));
        }

        assert!(!state.check_sync(0.4, 0.55));
        assert!(state.check_sync(0.6, 0.55));
        assert!(state.synchronized);
        assert!((state.energy - 1.0).abs() < f64::EPSILON);
        // Already synchronized: no re-fire.
        assert!(!state.check_sync(0.9, 0.55));
    }

    #[test]
    fn sync_needs_enough_absorbed() {
        let mut state = make_state();
        state.energy = 0.9;
        state.record_absorption(make_signal("agent-1", 0.8));
        assert!(!state.check_sync(0.9, 0.55));
    }

    #[test]
    fn cycle_reset_reseeds_energy() {
        let mut state = make_state();
        let mut rng = SmallRng::seed_from_u64(9);
        state.synchronized = true;
        state.energy = 1.0;
        for _ in 0..4 {
            state.record_absorption(make_signal("agent-1", 0.8));
        }

        state.reset_cycle(&mut rng);
        assert!(!state.synchronized);
        assert!(state.absorbed.is_empty());
        assert!(state.synced_with.is_empty());
        assert!((0.3..=0.5).contains(&state.energy));
    }

    #[test]
    fn studied_topics_dedup() {
        let mut state = make_state();
        state.record_studied("mars_weather");
        state.record_studied("mars_weather");
        assert_eq!(state.topics_studied.len(), 1);
        assert!(state.has_studied("mars_weather"));
    }

    #[test]
    fn recent_thoughts_returns_tail() {
        let state = make_state();
        assert!(state.recent_thoughts(5).is_empty());
    }
}
