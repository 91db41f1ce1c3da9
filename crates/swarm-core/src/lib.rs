//! Core runtime for the Swarm coordination substrate.
//!
//! Ties the pure agent behavior (`swarm-agents`), the channel
//! (`swarm-channel`), the reasoning stack (`swarm-reasoning`), and the
//! store (`swarm-store`) into the per-tick pipeline of one agent process.
//!
//! # Modules
//!
//! - [`config`] -- the single env-built [`Config`](config::Config)
//! - [`runtime`] -- [`AgentRuntime`](runtime::AgentRuntime) and the tick
//!   pipeline
//! - [`collective`] -- post-transition collective synthesis
//! - [`parse`] -- lenient parsing of reasoning replies
//! - [`snapshot`] -- read-model projections served over HTTP

pub mod collective;
pub mod config;
pub mod error;
pub mod parse;
pub mod runtime;
pub mod snapshot;

pub use config::Config;
pub use error::CoreError;
pub use runtime::{AgentRuntime, SharedChannel, StepMode, TickOutcome};
pub use snapshot::{AgentSnapshot, IdentityInfo};
