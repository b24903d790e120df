use thiserror::Error;

pub type Result<T> = std::result::Result<T, FlowError>;

/// Errors raised by the lifecycle machinery.
#[derive(Debug, Error)]
pub enum FlowError {
    /// A required value was missing or malformed in the session context.
    #[error("context error: {0}")]
    ContextError(String),

    /// A stage failed. The message is exactly what the caller should
    /// surface; diagnostics belong in the log, not here.
    #[error("{0}")]
    StageFailed(String),

    #[error("stage not found: {0}")]
    StageNotFound(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),
}
