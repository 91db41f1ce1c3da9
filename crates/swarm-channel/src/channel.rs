//! The per-process signal view and its derived density.
//!
//! A channel never talks to the network: the gossip layer deposits inbound
//! signals, the agent loop decays and reads, and the transition trigger is
//! evaluated locally. All operations are infallible; the only rejection is
//! the dedup-by-id check at deposit time. Signature verification is the
//! verifier's concern, never the channel's.

use std::collections::BTreeSet;

use tracing::info;

use swarm_types::{Signal, SignalId};

use crate::config::ChannelConfig;

/// A per-process view over signals with a derived density scalar.
///
/// Insertion order is preserved for trace output; it carries no semantics.
#[derive(Debug, Clone)]
pub struct SignalChannel {
    config: ChannelConfig,
    signals: Vec<Signal>,
    known: BTreeSet<SignalId>,
    density: f64,
    phase_transition_occurred: bool,
    transition_step: Option<u64>,
}

impl SignalChannel {
    /// Create an empty channel with the given tuning parameters.
    pub const fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            signals: Vec::new(),
            known: BTreeSet::new(),
            density: 0.0,
            phase_transition_occurred: false,
            transition_step: None,
        }
    }

    /// The channel's tuning parameters.
    pub const fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Append a signal if its id is not already present.
    ///
    /// Returns `true` when the signal was inserted, `false` on a duplicate.
    pub fn deposit(&mut self, signal: Signal) -> bool {
        if !self.known.insert(signal.id) {
            return false;
        }
        self.signals.push(signal);
        true
    }

    /// Whether a signal with this id is present.
    pub fn contains(&self, id: &SignalId) -> bool {
        self.known.contains(id)
    }

    /// Decay every signal once, then prune those at or below the minimum
    /// strength.
    pub fn decay(&mut self) {
        let factor = 1.0 - self.config.decay_rate;
        for signal in &mut self.signals {
            signal.strength *= factor;
        }
        let min_strength = self.config.min_strength;
        let known = &mut self.known;
        self.signals.retain(|s| {
            if s.strength > min_strength {
                true
            } else {
                known.remove(&s.id);
                false
            }
        });
    }

    /// Boost a signal's strength (absorption positive feedback), capped at 1.
    pub fn boost_strength(&mut self, id: &SignalId, amount: f64) {
        if let Some(signal) = self.signals.iter_mut().find(|s| s.id == *id) {
            signal.strength = (signal.strength + amount).min(1.0);
        }
    }

    /// Record a data-availability commitment on the local copy of a signal.
    ///
    /// Only used when commitment write-back is enabled; peers that already
    /// hold the signal dedup the re-gossip by id and keep their copy.
    pub fn set_da_commitment(&mut self, id: &SignalId, commitment: String) -> Option<Signal> {
        let signal = self.signals.iter_mut().find(|s| s.id == *id)?;
        signal.da_commitment = Some(commitment);
        Some(signal.clone())
    }

    /// Recompute and cache the density scalar for the current signal set.
    ///
    /// ```text
    /// active       = signals with strength > active_strength
    /// avg          = mean active strength (0 when no active signals)
    /// connectivity = total connections / max(1, |active| * agent_count)
    /// raw          = (|active| / (agent_count * saturation)) * avg * (1 + 2*connectivity)
    /// density      = min(1, raw)
    /// ```
    ///
    /// The `1 + 2*connectivity` term gives a super-linear response to
    /// cross-referenced signals, which is what produces the sharp sigmoidal
    /// rise toward the transition.
    pub fn recompute_density(&mut self, agent_count: usize) -> f64 {
        let active: Vec<&Signal> = self
            .signals
            .iter()
            .filter(|s| s.strength > self.config.active_strength)
            .collect();

        if active.is_empty() || agent_count == 0 {
            self.density = 0.0;
            return self.density;
        }

        let active_n = approx_f64(active.len());
        let agent_n = approx_f64(agent_count);

        let total_strength: f64 = active.iter().map(|s| s.strength).sum();
        let avg_strength = total_strength / active_n;

        let total_connections: usize = active.iter().map(|s| s.connections.len()).sum();
        let connectivity = approx_f64(total_connections) / (active_n * agent_n).max(1.0);

        let raw = (active_n / (agent_n * self.config.saturation_per_agent))
            * avg_strength
            * (1.0 + 2.0 * connectivity);
        self.density = raw.min(1.0);
        self.density
    }

    /// The most recently computed density.
    pub const fn density(&self) -> f64 {
        self.density
    }

    /// Number of signals stronger than the strong-signal threshold.
    pub fn strong_signal_count(&self) -> usize {
        self.signals
            .iter()
            .filter(|s| s.strength > self.config.strong_strength)
            .count()
    }

    /// Gossip-variant transition trigger: density at threshold and at least
    /// `strong_count` strong signals, while unlatched.
    pub fn should_transition(&self) -> bool {
        !self.phase_transition_occurred
            && self.density >= self.config.critical_threshold
            && self.strong_signal_count() >= self.config.strong_count
    }

    /// Orchestrated-variant transition trigger: density at threshold and a
    /// synchronization quorum of at least half the agents, while unlatched.
    pub const fn should_transition_with_quorum(
        &self,
        synced_count: usize,
        agent_count: usize,
    ) -> bool {
        !self.phase_transition_occurred
            && self.density >= self.config.critical_threshold
            && synced_count >= agent_count.div_ceil(2)
    }

    /// Latch the phase transition at the given step.
    ///
    /// Idempotent: once latched, further calls are ignored until [`reset`]
    /// (the latch flips false to true at most once per cycle).
    ///
    /// [`reset`]: SignalChannel::reset
    pub fn mark_transition(&mut self, step: u64) {
        if self.phase_transition_occurred {
            return;
        }
        self.phase_transition_occurred = true;
        self.transition_step = Some(step);
        info!(step, density = self.density, "phase transition latched");
    }

    /// Whether the transition latch is set for the current cycle.
    pub const fn phase_transition_occurred(&self) -> bool {
        self.phase_transition_occurred
    }

    /// The step at which the latch was set, if it is set.
    pub const fn transition_step(&self) -> Option<u64> {
        self.transition_step
    }

    /// Clear signals, density, and the latch (cycle reset).
    pub fn reset(&mut self) {
        self.signals.clear();
        self.known.clear();
        self.density = 0.0;
        self.phase_transition_occurred = false;
        self.transition_step = None;
    }

    /// Borrow the signal list (insertion order).
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Owned copy of the signal list, for read endpoints and gossip replies.
    pub fn snapshot(&self) -> Vec<Signal> {
        self.signals.clone()
    }

    /// Number of signals currently held.
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Whether the channel holds no signals.
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

impl Default for SignalChannel {
    fn default() -> Self {
        Self::new(ChannelConfig::default())
    }
}

/// Lossless-enough count conversion for density math.
///
/// Counts here are bounded by channel sizes (thousands at most), far inside
/// `u32`, so the `u32 -> f64` widening is exact.
fn approx_f64(n: usize) -> f64 {
    f64::from(u32::try_from(n).unwrap_or(u32::MAX))
}
