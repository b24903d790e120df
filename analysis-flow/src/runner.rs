use std::sync::Arc;

use crate::{
    error::{FlowError, Result},
    pipeline::{Pipeline, RunReport},
    session::SessionStorage,
};

/// High-level helper for the common _load → run → save_ pattern.
///
/// Create one at startup and share it across requests; it is two `Arc`
/// clones wide.
#[derive(Clone)]
pub struct PipelineRunner {
    pipeline: Arc<Pipeline>,
    storage: Arc<dyn SessionStorage>,
}

impl PipelineRunner {
    pub fn new(pipeline: Arc<Pipeline>, storage: Arc<dyn SessionStorage>) -> Self {
        Self { pipeline, storage }
    }

    /// Run the pipeline for `session_id` to settlement and persist the
    /// session back.
    ///
    /// The session is saved even when the run fails, so the failing stage
    /// and status message survive for subsequent status reads.
    pub async fn run(&self, session_id: &str) -> Result<RunReport> {
        let mut session = self
            .storage
            .get(session_id)
            .await?
            .ok_or_else(|| FlowError::SessionNotFound(session_id.to_string()))?;

        let outcome = self.pipeline.run(&mut session).await;

        self.storage.save(session).await?;

        outcome
    }
}
