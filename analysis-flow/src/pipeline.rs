use std::sync::Arc;
use tracing::debug;

use crate::{
    context::Context,
    error::{FlowError, Result},
    session::Session,
    stage::{Stage, StageOutcome},
};

/// Context key holding the busy flag while a pipeline run is in flight.
pub const BUSY_KEY: &str = "busy";

/// Sets the busy flag for the duration of a run and clears it when dropped,
/// no matter how the run exits.
struct BusyGuard {
    context: Context,
}

impl BusyGuard {
    fn engage(context: &Context) -> Self {
        context.set(BUSY_KEY, true);
        Self {
            context: context.clone(),
        }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.context.set(BUSY_KEY, false);
    }
}

/// Report returned once a pipeline run settles successfully.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Response from the stage that settled the lifecycle, if any.
    pub response: Option<String>,
    /// Identifier of the last stage that ran.
    pub settled_stage_id: String,
}

/// An ordered list of stages executed sequentially over a session.
pub struct Pipeline {
    pub id: String,
    stages: Vec<Arc<dyn Stage>>,
}

impl Pipeline {
    pub fn start_stage_id(&self) -> Option<&str> {
        self.stages.first().map(|stage| stage.id())
    }

    fn position_of(&self, stage_id: &str) -> Option<usize> {
        self.stages.iter().position(|stage| stage.id() == stage_id)
    }

    /// Run stages sequentially from the session's current stage until one
    /// settles the lifecycle or the list is exhausted.
    ///
    /// The session's busy flag is true for exactly the duration of this
    /// call and is released on every exit path, including error
    /// propagation. On failure the session stays pointed at the stage that
    /// failed, which is what status reads should report.
    pub async fn run(&self, session: &mut Session) -> Result<RunReport> {
        let start = self
            .position_of(&session.current_stage_id)
            .ok_or_else(|| FlowError::StageNotFound(session.current_stage_id.clone()))?;

        let _busy = BusyGuard::engage(&session.context);

        for stage in &self.stages[start..] {
            session.current_stage_id = stage.id().to_string();
            debug!(pipeline = %self.id, stage = stage.id(), "running stage");

            match stage.run(&session.context).await? {
                StageOutcome::Continue { status_message } => {
                    session.status_message = status_message;
                }
                StageOutcome::Done {
                    response,
                    status_message,
                } => {
                    session.status_message = status_message;
                    return Ok(RunReport {
                        response,
                        settled_stage_id: stage.id().to_string(),
                    });
                }
            }
        }

        Ok(RunReport {
            response: None,
            settled_stage_id: session.current_stage_id.clone(),
        })
    }
}

/// Builder for pipelines.
pub struct PipelineBuilder {
    pipeline: Pipeline,
}

impl PipelineBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            pipeline: Pipeline {
                id: id.into(),
                stages: Vec::new(),
            },
        }
    }

    pub fn add_stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.pipeline.stages.push(stage);
        self
    }

    pub fn build(self) -> Pipeline {
        self.pipeline
    }
}
