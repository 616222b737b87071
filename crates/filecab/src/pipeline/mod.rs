pub mod error;
pub mod progress;
pub mod runner;

pub use error::PipelineError;
pub use progress::{
    BroadcastProgress, IngestEvent, IngestPhase, NoopProgress, ProgressEvent, ProgressReporter,
};
pub use runner::{Pipeline, PASTED_JSON_ORIGIN};
