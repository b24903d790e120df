use thiserror::Error;

use crate::extract::ExtractError;
use crate::locale::Localizer;

/// Failure kinds of a single analysis attempt.
///
/// Discrimination is by variant, never by inspecting message text. Every
/// failure surfaces as exactly one user-facing message; the mapping lives
/// in [`AnalysisError::user_message`].
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Text mode with a blank entry.
    #[error("no text entered")]
    EmptyText,

    /// File mode with no file selected.
    #[error("no file selected")]
    MissingFile,

    /// The extractor failed with a classified file-processing error.
    #[error("file processing failed: {0}")]
    FileProcessing(#[source] ExtractError),

    /// Extraction produced only whitespace.
    #[error("no text extracted from document")]
    EmptyExtraction,

    /// Remote analysis (or anything else downstream) failed.
    #[error("analysis failed: {0}")]
    Client(String),
}

impl AnalysisError {
    fn locale_key(&self) -> Option<&'static str> {
        match self {
            Self::EmptyText => Some("error.no_text"),
            Self::MissingFile => Some("error.no_file"),
            Self::FileProcessing(_) => Some("error.file_read"),
            Self::EmptyExtraction => Some("error.no_text_extracted"),
            Self::Client(_) => None,
        }
    }

    /// The single message shown to the user for this failure.
    ///
    /// Classified kinds resolve through the catalog, so a file-processing
    /// error never leaks the underlying parser text. Client errors surface
    /// their own message, with the localized generic failure as the
    /// fallback for a blank one.
    pub fn user_message(&self, locale: &Localizer) -> String {
        match self.locale_key() {
            Some(key) => locale.translate(key),
            None => match self {
                Self::Client(message) if !message.trim().is_empty() => message.clone(),
                _ => locale.translate("error.analysis_failed"),
            },
        }
    }
}
