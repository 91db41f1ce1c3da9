//! Error types for the core runtime.

/// Errors that can occur while assembling or driving an agent runtime.
///
/// Only startup paths surface these; once the loop is running, every
/// fallible call inside a tick is caught and reduced to a degraded result
/// (no error crosses a tick boundary).
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A configuration value could not be parsed.
    #[error("config error: {0}")]
    Config(String),

    /// The reasoning stack failed to initialize.
    #[error("reasoning init error: {source}")]
    Reasoning {
        /// The underlying reasoning error.
        #[from]
        source: swarm_reasoning::ReasoningError,
    },

    /// The persistence layer failed to open.
    #[error("store init error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: swarm_store::StoreError,
    },
}
