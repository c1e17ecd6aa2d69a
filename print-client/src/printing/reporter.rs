//! Job result reporting
//!
//! The reporter is the only path from the worker back to the job source.

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::error::JobResult;
use crate::transport::OutboundEvent;

/// Final status of one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Completed,
    Failed(String),
}

/// Outcome reported once per job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub job_id: i64,
    pub status: JobStatus,
}

impl JobOutcome {
    pub fn completed(job_id: i64) -> Self {
        Self {
            job_id,
            status: JobStatus::Completed,
        }
    }

    pub fn failed(job_id: i64, message: impl Into<String>) -> Self {
        Self {
            job_id,
            status: JobStatus::Failed(message.into()),
        }
    }

    /// Build the outcome for a finished job; the message is the error text
    pub fn from_result(job_id: i64, result: &JobResult<()>) -> Self {
        match result {
            Ok(()) => Self::completed(job_id),
            Err(e) => Self::failed(job_id, e.to_string()),
        }
    }
}

impl From<JobOutcome> for OutboundEvent {
    fn from(outcome: JobOutcome) -> Self {
        match outcome.status {
            JobStatus::Completed => OutboundEvent::PrintCompleted {
                print_job_id: outcome.job_id,
            },
            JobStatus::Failed(error_message) => OutboundEvent::PrintFailed {
                print_job_id: outcome.job_id,
                error_message,
            },
        }
    }
}

/// Sends job outcomes to the outbound event stream
#[derive(Debug, Clone)]
pub struct JobResultReporter {
    tx: mpsc::Sender<OutboundEvent>,
}

impl JobResultReporter {
    pub fn new(tx: mpsc::Sender<OutboundEvent>) -> Self {
        Self { tx }
    }

    /// Report the outcome of one job
    ///
    /// A closed outbound stream is logged; the outcome is then lost.
    pub async fn report(&self, outcome: JobOutcome) {
        match &outcome.status {
            JobStatus::Completed => info!(job_id = outcome.job_id, "Print job completed"),
            JobStatus::Failed(msg) => warn!(job_id = outcome.job_id, error = %msg, "Print job failed"),
        }

        let job_id = outcome.job_id;
        if self.tx.send(outcome.into()).await.is_err() {
            error!(job_id, "Outbound stream closed, outcome not delivered");
        }
    }
}
