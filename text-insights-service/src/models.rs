use serde::{Deserialize, Serialize};

use crate::locale::{Language, TextDirection};

/// Context key the analysis job is carried under.
pub const JOB_KEY: &str = "job";

/// Which source an analysis attempt reads its input from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    Text,
    File,
}

/// Structured output of the remote analysis call. Immutable once received;
/// replaced wholesale by the next request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub keywords: Vec<String>,
}

/// Per-session analysis state, carried in the session context under
/// [`JOB_KEY`].
///
/// `result` and `error` are mutually exclusive: publishing one clears the
/// other, so a status read can never see both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisJob {
    pub id: String,
    pub mode: InputMode,
    /// Direct text entry; consulted only in text mode.
    pub input_text: Option<String>,
    /// Selected document; consulted only in file mode.
    pub file_path: Option<String>,
    /// Text the analysis client actually receives, once resolved.
    pub source_text: Option<String>,
    pub result: Option<AnalysisResult>,
    pub error: Option<String>,
}

impl AnalysisJob {
    pub fn new(id: impl Into<String>, mode: InputMode) -> Self {
        Self {
            id: id.into(),
            mode,
            input_text: None,
            file_path: None,
            source_text: None,
            result: None,
            error: None,
        }
    }

    pub fn publish_result(&mut self, result: AnalysisResult) {
        self.result = Some(result);
        self.error = None;
    }

    pub fn publish_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.result = None;
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub mode: InputMode,
    pub text: Option<String>,
    pub file_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetLanguageRequest {
    pub language: Language,
}

/// What a status read returns: the loading/error/success state of one
/// analysis session plus the localization state a front end mirrors.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisStateResponse {
    pub session_id: String,
    pub status: String,
    pub loading: bool,
    pub current_stage: Option<String>,
    pub status_message: Option<String>,
    pub summary: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub error: Option<String>,
    pub language: Language,
    pub direction: TextDirection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_and_error_are_mutually_exclusive() {
        let mut job = AnalysisJob::new("j1", InputMode::Text);

        job.publish_error("first failure");
        assert!(job.result.is_none());
        assert_eq!(job.error.as_deref(), Some("first failure"));

        job.publish_result(AnalysisResult {
            summary: "a summary".to_string(),
            keywords: vec!["one".to_string()],
        });
        assert!(job.error.is_none());
        assert!(job.result.is_some());

        job.publish_error("second failure");
        assert!(job.result.is_none());
        assert_eq!(job.error.as_deref(), Some("second failure"));
    }

    #[test]
    fn input_mode_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&InputMode::Text).unwrap(), "\"text\"");
        assert_eq!(
            serde_json::from_str::<InputMode>("\"file\"").unwrap(),
            InputMode::File
        );
    }
}
