use async_trait::async_trait;

use crate::{context::Context, error::Result};

/// Outcome of a single stage execution.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    /// Proceed to the next stage in the pipeline.
    Continue {
        /// Progress note recorded on the session.
        status_message: Option<String>,
    },
    /// The lifecycle settled here; nothing further runs.
    Done {
        /// Response handed back to the caller.
        response: Option<String>,
        status_message: Option<String>,
    },
}

impl StageOutcome {
    pub fn advance(status_message: Option<String>) -> Self {
        Self::Continue { status_message }
    }

    pub fn done(response: Option<String>, status_message: Option<String>) -> Self {
        Self::Done {
            response,
            status_message,
        }
    }
}

/// One step of a request lifecycle, run against the shared session context.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Unique identifier for this stage within a pipeline.
    fn id(&self) -> &str;

    async fn run(&self, context: &Context) -> Result<StageOutcome>;
}
