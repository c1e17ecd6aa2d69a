//! Job error taxonomy
//!
//! Every variant ends the job with exactly one `print-failed` outcome.
//! None of them stop the intake loop.

use rc_printer::{CommError, RasterError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    /// A required job field is missing or blank (no transport attempt)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Payload carried a job id but did not match the job schema
    #[error("Malformed print job: {0}")]
    Malformed(String),

    /// Ticket could not be encoded (no transport attempt)
    #[error("Render error: {0}")]
    Render(#[from] RasterError),

    /// Transport failed after an attempt; the resource has been released
    #[error(transparent)]
    Comm(#[from] CommError),

    /// Anything that escaped classification
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl JobError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

pub type JobResult<T> = Result<T, JobError>;
