use analysis_flow::{Context, FlowError, Result, Stage, StageOutcome};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::fail;
use crate::client::AnalysisClient;
use crate::error::AnalysisError;
use crate::locale::Localizer;
use crate::models::{AnalysisJob, JOB_KEY};

/// Sends the resolved text to the remote analysis client and publishes the
/// structured result, clearing any prior error.
pub struct AnalyzeStage {
    client: Arc<dyn AnalysisClient>,
    locale: Arc<Localizer>,
}

impl AnalyzeStage {
    pub fn new(client: Arc<dyn AnalysisClient>, locale: Arc<Localizer>) -> Self {
        Self { client, locale }
    }
}

#[async_trait]
impl Stage for AnalyzeStage {
    fn id(&self) -> &str {
        "analyze"
    }

    async fn run(&self, context: &Context) -> Result<StageOutcome> {
        let mut job: AnalysisJob = context
            .get(JOB_KEY)
            .ok_or_else(|| FlowError::ContextError("Analysis job not found in context".to_string()))?;

        let source = job.source_text.clone().ok_or_else(|| {
            FlowError::ContextError("Source text missing for analysis".to_string())
        })?;

        info!(job = %job.id, chars = source.len(), "requesting remote analysis");

        let result = match self.client.analyze(&source).await {
            Ok(result) => result,
            Err(e) => return Err(fail(AnalysisError::Client(e.to_string()), &self.locale)),
        };

        info!(job = %job.id, keywords = result.keywords.len(), "analysis completed");

        let response = result.summary.clone();
        job.publish_result(result);
        context.set(JOB_KEY, &job);

        Ok(StageOutcome::done(
            Some(response),
            Some("analysis completed successfully".to_string()),
        ))
    }
}
