//! Enumeration types shared across the workspace.

use serde::{Deserialize, Serialize};

/// Discrete credit state derived from an agent's balance.
///
/// Tiers gate reasoning-backend calls: `Critical` and `Dead` skip the call
/// entirely, `LowCompute` requests a cheaper model variant when one is
/// configured, `Normal` proceeds unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditTier {
    /// Balance above the upper threshold; reasoning calls proceed unchanged.
    Normal,
    /// Balance between the thresholds; cheaper model variant requested.
    LowCompute,
    /// Balance positive but below the lower threshold; reasoning skipped.
    Critical,
    /// Balance at or below zero; reasoning skipped.
    Dead,
}

impl CreditTier {
    /// Whether this tier permits a reasoning-backend call at all.
    pub const fn allows_reasoning(self) -> bool {
        matches!(self, Self::Normal | Self::LowCompute)
    }
}

/// Lifecycle state of a [`Decision`](crate::Decision).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    /// Selected but not yet dispatched.
    Pending,
    /// Currently being executed.
    Executing,
    /// Execution finished successfully.
    Completed,
    /// Execution finished unsuccessfully.
    Failed,
}

/// Seed role assigned to an agent at startup.
///
/// The role selects a personality preset (see `swarm-agents`); it has no
/// runtime behavior of its own beyond the specialization label exposed over
/// the read API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// High curiosity, low diligence: ranges across topics.
    Explorer,
    /// High diligence: works datasets methodically.
    Analyst,
    /// High sociability: shares and combines findings.
    Synthesizer,
    /// Balanced, boldness-leaning: correlates across domains.
    Connector,
    /// Low boldness, high diligence: re-examines existing findings.
    Skeptic,
}

impl AgentRole {
    /// All roles in assignment order. Agent `i` takes role `i % len`.
    pub const ALL: [Self; 5] = [
        Self::Explorer,
        Self::Analyst,
        Self::Synthesizer,
        Self::Connector,
        Self::Skeptic,
    ];

    /// Human-readable specialization label for the read API.
    pub const fn specialization(self) -> &'static str {
        match self {
            Self::Explorer => "broad survey and topic discovery",
            Self::Analyst => "dataset analysis and measurement",
            Self::Synthesizer => "cross-agent synthesis and reporting",
            Self::Connector => "cross-domain correlation",
            Self::Skeptic => "finding verification and re-analysis",
        }
    }
}
