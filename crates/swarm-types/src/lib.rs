//! Shared type definitions for the Swarm coordination substrate.
//!
//! This crate is the single source of truth for the value objects exchanged
//! between agents and exposed on the read APIs.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe identifier wrappers
//! - [`enums`] -- Enumeration types (credit tiers, decision status, roles)
//! - [`actions`] -- The candidate-action sum type and its static cost tables
//! - [`structs`] -- Core value objects (signals, thoughts, decisions, memories)
//! - [`topics`] -- Canonical topic table and the free-text normalizer

pub mod actions;
pub mod enums;
pub mod ids;
pub mod structs;
pub mod topics;

// Re-export all public types at crate root for convenience.
pub use actions::{ActionKind, AgentAction};
pub use enums::{AgentRole, CreditTier, DecisionStatus};
pub use ids::{AgentId, DecisionId, MemoryId, SignalId, ThoughtId};
pub use structs::{
    Artifact, CollectiveMemory, CollectiveReport, Dataset, Decision, Personality, Signal,
    Thought,
};
pub use topics::{is_canonical, normalize_topic, CANONICAL_TOPICS};
