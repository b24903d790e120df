pub mod analyze;
pub mod extract_text;
pub mod resolve_input;

pub use analyze::AnalyzeStage;
pub use extract_text::ExtractTextStage;
pub use resolve_input::ResolveInputStage;

use analysis_flow::FlowError;

use crate::error::AnalysisError;
use crate::locale::Localizer;

/// Convert a lifecycle failure into the stage error whose message is what
/// the user sees. The underlying diagnostic is logged here; only the
/// localized message travels up.
pub(crate) fn fail(error: AnalysisError, locale: &Localizer) -> FlowError {
    tracing::error!(error = ?error, "analysis stage failed");
    FlowError::StageFailed(error.user_message(locale))
}
