//! Error types for the persistence layer.

/// Errors that can occur in the persistence layer.
///
/// Callers inside the tick treat every variant as non-fatal: the failure is
/// logged and the step continues (state may be lost on crash).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A `SQLite` operation failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration error (bad path, bad options).
    #[error("store config error: {0}")]
    Config(String),
}
