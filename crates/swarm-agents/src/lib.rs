//! Agent state and behavior for the Swarm coordination substrate.
//!
//! One agent process owns exactly one [`AgentState`]; this crate holds the
//! pure, per-tick pieces of agent behavior that touch no I/O:
//!
//! - [`personality`] -- role-seeded, jittered personality generation
//! - [`state`] -- the mutable state container and its bookkeeping helpers
//! - [`movement`] -- Brownian/orbital movement inside the world rectangle
//! - [`absorb`] -- probabilistic absorption with channel positive feedback
//! - [`decision`] -- candidate generation, scoring, and softmax selection
//!
//! The async loop that sequences these (and all network and reasoning I/O)
//! lives in `swarm-core`.

pub mod absorb;
pub mod decision;
pub mod movement;
pub mod personality;
pub mod state;

pub use absorb::{absorb, strong_unabsorbed};
pub use decision::{generate_candidates, select_decision, should_switch, Candidate};
pub use movement::WorldBounds;
pub use state::{AgentState, Vec2};
