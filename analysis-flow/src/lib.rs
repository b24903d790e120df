pub mod context;
pub mod error;
pub mod pipeline;
pub mod runner;
pub mod session;
pub mod stage;

// Re-export commonly used types
pub use context::Context;
pub use error::{FlowError, Result};
pub use pipeline::{BUSY_KEY, Pipeline, PipelineBuilder, RunReport};
pub use runner::PipelineRunner;
pub use session::{InMemorySessionStorage, Session, SessionStorage};
pub use stage::{Stage, StageOutcome};
