//! Type-safe identifier wrappers.
//!
//! Value objects minted by an agent (signals, thoughts, decisions, collective
//! memories) carry strongly-typed UUID v7 identifiers so the compiler rejects
//! accidental mixing. Agent identifiers are opaque strings: they must survive
//! process restarts and the aggregator's synthetic `"human"` producer, so a
//! UUID wrapper would be the wrong shape.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a signal. The primary dedup key across the
    /// gossip network.
    SignalId
}

define_id! {
    /// Unique identifier for a thought produced by a deep step.
    ThoughtId
}

define_id! {
    /// Unique identifier for a decision produced by the decision engine.
    DecisionId
}

define_id! {
    /// Unique identifier for a collective memory.
    MemoryId
}

/// Opaque string identifier for an agent.
///
/// Stable across restarts (derived from the agent index at startup) and
/// permitted to carry non-UUID values such as the aggregator's `"human"`
/// injection producer.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct AgentId(pub String);

impl AgentId {
    /// Create an agent identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier used for operator-injected signals.
    pub fn human() -> Self {
        Self(String::from("human"))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for AgentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AgentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for AgentId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let signal = SignalId::new();
        let thought = ThoughtId::new();
        // These are different types -- the compiler enforces no mixing.
        assert_ne!(signal.into_inner(), Uuid::nil());
        assert_ne!(thought.into_inner(), Uuid::nil());
    }

    #[test]
    fn id_roundtrip_serde() {
        let original = SignalId::new();
        let json = serde_json::to_string(&original).ok();
        assert!(json.is_some());
        let restored: Result<SignalId, _> =
            serde_json::from_str(json.as_deref().unwrap_or(""));
        assert!(restored.is_ok());
    }

    #[test]
    fn agent_id_accepts_opaque_strings() {
        let human = AgentId::human();
        assert_eq!(human.as_str(), "human");
        let indexed = AgentId::new("agent-3");
        assert_eq!(indexed.to_string(), "agent-3");
    }
}
