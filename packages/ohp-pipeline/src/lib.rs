//! Stage worker implementations and the per-stage bounded-concurrency
//! scheduler that drives them against the Store.

pub mod error;
pub mod scheduler;
pub mod workers;

pub use error::FatalError;
pub use scheduler::{Scheduler, SchedulerConfig, StageConfig};
pub use workers::{EvaluationWorker, StageWorker, TranscriptionWorker, TranslationWorker, WorkerResult};
