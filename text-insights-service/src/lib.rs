pub mod client;
pub mod error;
pub mod extract;
pub mod locale;
pub mod models;
pub mod service;
pub mod stages;
pub mod workflow;

pub use error::AnalysisError;
pub use locale::{Language, Localizer, TextDirection};
pub use models::*;
pub use service::{AppState, create_app};
pub use workflow::{build_analysis_pipeline, create_analysis_session, run_analysis};
