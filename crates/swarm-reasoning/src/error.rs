//! Error types for the reasoning and collaborator clients.

/// Errors from the reasoning backend and its collaborators.
///
/// These never cross a tick boundary: the retry wrapper reduces them to a
/// degraded (empty) reply, and data-source/DA failures collapse to `None`.
#[derive(Debug, thiserror::Error)]
pub enum ReasoningError {
    /// The backend HTTP call failed or returned a non-success status.
    #[error("reasoning backend error: {0}")]
    Backend(String),

    /// The backend response could not be parsed.
    #[error("reasoning response parse error: {0}")]
    Parse(String),

    /// A prompt template failed to render.
    #[error("prompt template error: {0}")]
    Template(String),

    /// Invalid backend configuration.
    #[error("reasoning config error: {0}")]
    Config(String),
}
