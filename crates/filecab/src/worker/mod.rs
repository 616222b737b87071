pub mod job;
pub mod pool;

pub use job::{IngestOutcome, IngestPayload, IngestRequest};
pub use pool::WorkerPool;
