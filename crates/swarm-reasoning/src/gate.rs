//! Credit-tier gating around the reasoning backend.
//!
//! The gate is the only path through which agent code reaches the backend.
//! `Critical` and `Dead` tiers never touch the network: the reply is a
//! canned low-confidence stub with zero tokens, so a starved agent keeps
//! stepping without spending. `LowCompute` asks for the cheaper model
//! variant when one is configured.

use tracing::debug;

use swarm_types::CreditTier;

use crate::backend::{ReasonOptions, ReasoningBackend, Reply};

/// A reply annotated with how the gate handled the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatedReply {
    /// The backend reply (canned and empty-of-cost when skipped).
    pub reply: Reply,
    /// True when the credit tier short-circuited the call.
    pub skipped: bool,
}

/// Canned content returned for starved tiers, shaped like a minimal
/// thought payload so downstream JSON parsing still finds its fields.
const CANNED_REPLY: &str = r#"{"observation":"reasoning capacity exhausted","reasoning":"credits depleted; running on reserve heuristics","conclusion":"conserving compute until credits recover","suggestedActions":[],"confidence":0.2}"#;

/// Gatekeeper owning the backend handle.
pub struct GatedReasoner {
    backend: ReasoningBackend,
}

impl GatedReasoner {
    /// Wrap a backend.
    pub const fn new(backend: ReasoningBackend) -> Self {
        Self { backend }
    }

    /// The wrapped backend's display name.
    pub const fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Whether a real backend is configured at all.
    pub const fn is_enabled(&self) -> bool {
        self.backend.is_enabled()
    }

    /// Run a reasoning call under the agent's current credit tier.
    pub async fn reason(
        &self,
        tier: CreditTier,
        system: &str,
        user: &str,
        mut opts: ReasonOptions,
    ) -> GatedReply {
        match tier {
            CreditTier::Critical | CreditTier::Dead => {
                debug!(?tier, "reasoning call skipped by credit gate");
                GatedReply {
                    reply: Reply {
                        content: String::from(CANNED_REPLY),
                        tokens_used: 0,
                    },
                    skipped: true,
                }
            }
            CreditTier::LowCompute => {
                opts.cheap = true;
                GatedReply {
                    reply: self.backend.reason(system, user, opts).await,
                    skipped: false,
                }
            }
            CreditTier::Normal => GatedReply {
                reply: self.backend.reason(system, user, opts).await,
                skipped: false,
            },
        }
    }
}
