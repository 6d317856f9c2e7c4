//! Submitting a record: payload, dispatch, progress and reconciliation

mod pipeline;
mod progress;

pub use self::pipeline::{SubmissionPhase, SubmissionPipeline};
pub use self::progress::{ProgressListener, ProgressTracker};
