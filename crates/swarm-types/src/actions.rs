//! Candidate actions and their static cost tables.
//!
//! [`AgentAction`] is the closed set of things an agent can decide to do in
//! a deep step. The decision engine scores candidates over these variants and
//! the executor matches on them exhaustively; there is no dynamic dispatch
//! or reflection anywhere in the pipeline.

use serde::{Deserialize, Serialize};

/// A candidate action proposed by the decision engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentAction {
    /// Fetch and analyze a dataset for a canonical topic.
    AnalyzeDataset {
        /// Canonical topic to analyze.
        topic: String,
    },
    /// Share an existing finding with the swarm.
    ShareFinding {
        /// The finding text (typically a thought conclusion).
        finding: String,
        /// Optional topic tag for routing.
        topic: Option<String>,
    },
    /// Correlate findings across two or more analyzed topics.
    CorrelateFindings {
        /// The topics to correlate.
        topics: Vec<String>,
    },
    /// Explore a topic without a cached dataset.
    ExploreTopic {
        /// The topic to explore.
        topic: String,
    },
}

impl AgentAction {
    /// Stable kind label used for novelty tracking and persistence.
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::AnalyzeDataset { .. } => ActionKind::Analyze,
            Self::ShareFinding { .. } => ActionKind::Share,
            Self::CorrelateFindings { .. } => ActionKind::Correlate,
            Self::ExploreTopic { .. } => ActionKind::Explore,
        }
    }
}

/// The four action kinds, used as keys into the static cost tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// `analyze_dataset`
    Analyze,
    /// `share_finding`
    Share,
    /// `correlate_findings`
    Correlate,
    /// `explore_topic`
    Explore,
}

impl ActionKind {
    /// Base priority before scoring adjustments.
    pub const fn priority_base(self) -> f64 {
        match self {
            Self::Analyze => 0.95,
            Self::Share => 0.85,
            Self::Correlate => 0.75,
            Self::Explore => 0.60,
        }
    }

    /// Estimated reasoning-backend token cost.
    pub const fn token_estimate(self) -> u64 {
        match self {
            Self::Analyze => 2_500,
            Self::Share => 1_200,
            Self::Correlate => 3_500,
            Self::Explore => 2_000,
        }
    }

    /// Estimated wall-clock execution time in milliseconds.
    pub const fn time_estimate_ms(self) -> u64 {
        match self {
            Self::Analyze => 12_000,
            Self::Share => 6_000,
            Self::Correlate => 18_000,
            Self::Explore => 10_000,
        }
    }

    /// Stable string label (matches the serde tag of [`AgentAction`]).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Analyze => "analyze_dataset",
            Self::Share => "share_finding",
            Self::Correlate => "correlate_findings",
            Self::Explore => "explore_topic",
        }
    }
}

impl core::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_serde_tags() {
        let action = AgentAction::AnalyzeDataset {
            topic: String::from("mars_weather"),
        };
        let json = serde_json::to_value(&action).unwrap_or_default();
        assert_eq!(json.get("type").and_then(|v| v.as_str()), Some("analyze_dataset"));
    }

    #[test]
    fn kind_matches_variant() {
        let action = AgentAction::CorrelateFindings {
            topics: vec![String::from("exoplanets"), String::from("solar_activity")],
        };
        assert_eq!(action.kind(), ActionKind::Correlate);
        assert_eq!(action.kind().as_str(), "correlate_findings");
    }

    #[test]
    fn analyze_outranks_explore() {
        assert!(ActionKind::Analyze.priority_base() > ActionKind::Explore.priority_base());
    }

    #[test]
    fn correlate_is_most_expensive() {
        for kind in [ActionKind::Analyze, ActionKind::Share, ActionKind::Explore] {
            assert!(ActionKind::Correlate.token_estimate() > kind.token_estimate());
        }
    }
}
