//! Channel tuning parameters.

use serde::{Deserialize, Serialize};

/// Tuning parameters for a [`SignalChannel`](crate::SignalChannel).
///
/// All values are plain scalars; the defaults match the substrate's
/// environment defaults (`PHEROMONE_DECAY` 0.12, `CRITICAL_DENSITY` 0.55).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Fraction of strength lost per decay pass.
    pub decay_rate: f64,
    /// Signals at or below this strength are pruned after decay.
    pub min_strength: f64,
    /// Signals above this strength count as active for density.
    pub active_strength: f64,
    /// Density at or above which a phase transition may trigger.
    pub critical_threshold: f64,
    /// Saturation denominator: density saturates around
    /// `agent_count * saturation_per_agent` active signals.
    pub saturation_per_agent: f64,
    /// Strength above which a signal counts as strong for the gossip
    /// transition trigger.
    pub strong_strength: f64,
    /// Minimum number of strong signals the gossip trigger requires.
    pub strong_count: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            decay_rate: 0.12,
            min_strength: 0.05,
            active_strength: 0.1,
            critical_threshold: 0.55,
            saturation_per_agent: 8.0,
            strong_strength: 0.4,
            strong_count: 3,
        }
    }
}
