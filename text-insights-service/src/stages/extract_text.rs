use analysis_flow::{Context, FlowError, Result, Stage, StageOutcome};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use super::fail;
use crate::error::AnalysisError;
use crate::extract::{ExtractError, TextExtractor};
use crate::locale::Localizer;
use crate::models::{AnalysisJob, InputMode, JOB_KEY};

/// Runs the document extractor for file-mode jobs. Classified
/// file-processing errors surface as the generic localized file-read
/// message; other extractor failures keep their own text. A document that
/// yields only whitespace fails here, before the analysis client is ever
/// invoked.
pub struct ExtractTextStage {
    extractor: Arc<dyn TextExtractor>,
    locale: Arc<Localizer>,
}

impl ExtractTextStage {
    pub fn new(extractor: Arc<dyn TextExtractor>, locale: Arc<Localizer>) -> Self {
        Self { extractor, locale }
    }
}

#[async_trait]
impl Stage for ExtractTextStage {
    fn id(&self) -> &str {
        "extract_text"
    }

    async fn run(&self, context: &Context) -> Result<StageOutcome> {
        let mut job: AnalysisJob = context
            .get(JOB_KEY)
            .ok_or_else(|| FlowError::ContextError("Analysis job not found in context".to_string()))?;

        if job.mode == InputMode::Text {
            // Direct text was resolved by the previous stage.
            return Ok(StageOutcome::advance(None));
        }

        let path = job.file_path.clone().ok_or_else(|| {
            FlowError::ContextError("File path missing for file-mode job".to_string())
        })?;

        info!(job = %job.id, path = %path, "extracting document text");

        // Parsing is blocking CPU/IO work; keep it off the async scheduler.
        let extractor = Arc::clone(&self.extractor);
        let target = PathBuf::from(&path);
        let extracted = match tokio::task::spawn_blocking(move || extractor.extract(&target)).await
        {
            Ok(outcome) => outcome,
            Err(join_err) => Err(ExtractError::Parse {
                format: "document",
                message: format!("extraction task failed: {join_err}"),
            }),
        };

        let text = match extracted {
            Ok(text) => text,
            Err(e) if e.is_file_processing() => {
                return Err(fail(AnalysisError::FileProcessing(e), &self.locale));
            }
            Err(e) => return Err(fail(AnalysisError::Client(e.to_string()), &self.locale)),
        };

        if text.trim().is_empty() {
            warn!(job = %job.id, path = %path, "document produced no text");
            return Err(fail(AnalysisError::EmptyExtraction, &self.locale));
        }

        info!(job = %job.id, chars = text.len(), "document text extracted");
        job.source_text = Some(text);
        context.set(JOB_KEY, &job);
        Ok(StageOutcome::advance(Some(
            "document text extracted".to_string(),
        )))
    }
}
