//! Agent movement within the world rectangle.
//!
//! Movement is presentation-level state: it feeds the read API and nothing
//! else. Pre-transition agents wander with Brownian jitter, perturbed toward
//! the bearings of strong foreign signals they have not absorbed yet.
//! Post-transition the swarm collapses into an orbit around the world
//! center. Velocity is damped by 0.85 per axis each tick and position is
//! clamped to the configured rectangle.

use rand::Rng;

use swarm_types::Signal;

use crate::state::{AgentState, Vec2};

/// Brownian jitter magnitude per axis.
const JITTER: f64 = 0.8;

/// Velocity damping factor applied each tick, per axis.
const DAMPING: f64 = 0.85;

/// Pull strength toward the center after the transition.
const CENTER_PULL: f64 = 0.02;

/// Tangential (orbital) strength after the transition.
const ORBIT_PULL: f64 = 0.015;

/// Per-signal perturbation scale before the transition.
const SIGNAL_PULL: f64 = 0.05;

/// The rectangle agents are confined to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    /// Minimum x coordinate.
    pub min_x: f64,
    /// Minimum y coordinate.
    pub min_y: f64,
    /// Maximum x coordinate.
    pub max_x: f64,
    /// Maximum y coordinate.
    pub max_y: f64,
}

impl WorldBounds {
    /// The rectangle's center point.
    pub const fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 100.0,
            max_y: 100.0,
        }
    }
}

/// Advance one movement step.
///
/// `strong_signals` should already be filtered to foreign, unabsorbed
/// signals with strength above 0.5 (the caller owns that filter since it
/// also owns the absorption bookkeeping).
pub fn step(
    state: &mut AgentState,
    strong_signals: &[Signal],
    transitioned: bool,
    bounds: &WorldBounds,
    rng: &mut impl Rng,
) {
    if transitioned {
        orbital_step(state, bounds);
    } else {
        brownian_step(state, strong_signals, rng);
    }

    state.velocity.x *= DAMPING;
    state.velocity.y *= DAMPING;
    state.position.x = (state.position.x + state.velocity.x).clamp(bounds.min_x, bounds.max_x);
    state.position.y = (state.position.y + state.velocity.y).clamp(bounds.min_y, bounds.max_y);
}

/// Brownian wander, nudged toward the bearing of each strong signal.
fn brownian_step(state: &mut AgentState, strong_signals: &[Signal], rng: &mut impl Rng) {
    state.velocity.x += rng.random_range(-JITTER..=JITTER);
    state.velocity.y += rng.random_range(-JITTER..=JITTER);

    for signal in strong_signals {
        let (dx, dy) = bearing(signal);
        state.velocity.x += dx * signal.strength * SIGNAL_PULL;
        state.velocity.y += dy * signal.strength * SIGNAL_PULL;
    }
}

/// Pull toward the center with a mild orbital tangent.
fn orbital_step(state: &mut AgentState, bounds: &WorldBounds) {
    let center = bounds.center();
    let to_center_x = center.x - state.position.x;
    let to_center_y = center.y - state.position.y;

    state.velocity.x += to_center_x * CENTER_PULL;
    state.velocity.y += to_center_y * CENTER_PULL;

    // Perpendicular of the center vector, for the orbital component.
    let magnitude = (to_center_x * to_center_x + to_center_y * to_center_y).sqrt();
    if magnitude > 1e-6 {
        state.velocity.x += (-to_center_y / magnitude) * ORBIT_PULL * magnitude.min(10.0);
        state.velocity.y += (to_center_x / magnitude) * ORBIT_PULL * magnitude.min(10.0);
    }
}

/// A stable unit bearing derived from the signal id.
///
/// Signals carry no coordinates, so each id is hashed onto a fixed compass
/// bearing; agents perturbed by the same signal drift the same way, which is
/// enough coherence for the visualization.
fn bearing(signal: &Signal) -> (f64, f64) {
    let bytes = signal.id.into_inner().into_bytes();
    let seed = bytes
        .iter()
        .take(8)
        .fold(0u64, |acc, b| acc.rotate_left(8) ^ u64::from(*b));
    // Map the hash onto [0, 2π).
    let milli_turns = u32::try_from(seed % 62_832).unwrap_or(0);
    let angle = f64::from(milli_turns) / 10_000.0;
    (angle.cos(), angle.sin())
}
