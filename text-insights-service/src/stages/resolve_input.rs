use analysis_flow::{Context, FlowError, Result, Stage, StageOutcome};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use super::fail;
use crate::error::AnalysisError;
use crate::locale::Localizer;
use crate::models::{AnalysisJob, InputMode, JOB_KEY};

/// Validates the submitted input and records which source feeds the
/// lifecycle. Exactly one of the two sources is consulted, chosen by the
/// job's input mode: text mode resolves immediately, file mode defers to
/// the extraction stage.
pub struct ResolveInputStage {
    locale: Arc<Localizer>,
}

impl ResolveInputStage {
    pub fn new(locale: Arc<Localizer>) -> Self {
        Self { locale }
    }
}

#[async_trait]
impl Stage for ResolveInputStage {
    fn id(&self) -> &str {
        "resolve_input"
    }

    async fn run(&self, context: &Context) -> Result<StageOutcome> {
        let mut job: AnalysisJob = context
            .get(JOB_KEY)
            .ok_or_else(|| FlowError::ContextError("Analysis job not found in context".to_string()))?;

        match job.mode {
            InputMode::Text => {
                let text = job.input_text.as_deref().unwrap_or("");
                if text.trim().is_empty() {
                    warn!(job = %job.id, "text mode with blank input");
                    return Err(fail(AnalysisError::EmptyText, &self.locale));
                }
                info!(job = %job.id, chars = text.len(), "input resolved from direct text");
                job.source_text = Some(text.to_string());
            }
            InputMode::File => {
                let selected = job.file_path.as_deref().map(str::trim).unwrap_or("");
                if selected.is_empty() {
                    warn!(job = %job.id, "file mode with no file selected");
                    return Err(fail(AnalysisError::MissingFile, &self.locale));
                }
                info!(job = %job.id, path = selected, "input will be extracted from file");
            }
        }

        context.set(JOB_KEY, &job);
        Ok(StageOutcome::advance(Some("input resolved".to_string())))
    }
}
