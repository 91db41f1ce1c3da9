//! Reasoning backend and external collaborator clients.
//!
//! Everything an agent talks to besides its peers lives here, each behind
//! the narrow contract the rest of the workspace consumes:
//!
//! - [`backend`] -- `reason(system, user, opts) -> Reply` with deadline,
//!   retry, and degrade-to-empty semantics
//! - [`gate`] -- credit-tier gating in front of the backend
//! - [`prompt`] -- embedded minijinja prompt templates
//! - [`datasource`] -- `fetch_dataset(topic) -> Option<Dataset>` with caching
//! - [`da`] -- `disperse(blob) -> Option<commitment>` fire-and-forget sink

pub mod backend;
pub mod da;
pub mod datasource;
pub mod error;
pub mod gate;
pub mod prompt;

pub use backend::{BackendConfig, ReasonOptions, ReasoningBackend, Reply};
pub use da::DaSink;
pub use datasource::DataSource;
pub use error::ReasoningError;
pub use gate::{GatedReasoner, GatedReply};
pub use prompt::{PromptEngine, RenderedPrompt};
