//! Print Worker
//!
//! Receives raw job payloads, renders them and dispatches the bytes to the
//! printer, strictly one job at a time. Every job with a readable id gets
//! exactly one reported outcome.

use std::panic::{self, AssertUnwindSafe};

use rc_printer::PrinterSink;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::error::{JobError, JobResult};
use super::job::PrintJob;
use super::renderer::TicketRenderer;
use super::reporter::{JobOutcome, JobResultReporter};

/// Sequential print worker
///
/// Owns the only handle to the sink, so transports never see concurrent use.
pub struct PrintWorker {
    renderer: TicketRenderer,
    sink: PrinterSink,
    reporter: JobResultReporter,
}

impl PrintWorker {
    pub fn new(renderer: TicketRenderer, sink: PrinterSink, reporter: JobResultReporter) -> Self {
        Self {
            renderer,
            sink,
            reporter,
        }
    }

    /// Run the worker (blocks until the channel closes or shutdown fires)
    ///
    /// A job in progress is finished before shutdown is observed.
    pub async fn run(self, mut job_rx: mpsc::Receiver<Value>, shutdown: CancellationToken) {
        tracing::info!(printer = %self.sink.describe(), "Print worker started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Print worker received shutdown signal");
                    break;
                }
                payload = job_rx.recv() => {
                    let Some(payload) = payload else {
                        tracing::info!("Job channel closed, print worker stopping");
                        break;
                    };
                    self.handle(payload).await;
                }
            }
        }
    }

    /// Handle one raw payload and report its outcome
    ///
    /// Returns `None` when the payload has no readable job id; such a
    /// payload cannot be reported and is dropped.
    pub async fn handle(&self, payload: Value) -> Option<JobOutcome> {
        let Some(job_id) = job_id_of(&payload) else {
            tracing::error!(%payload, "Print job without a readable printJobId, dropped");
            return None;
        };

        let result = self.process(job_id, payload).await;
        let outcome = JobOutcome::from_result(job_id, &result);
        self.reporter.report(outcome.clone()).await;
        Some(outcome)
    }

    #[tracing::instrument(skip(self, payload))]
    async fn process(&self, job_id: i64, payload: Value) -> JobResult<()> {
        let job = PrintJob::from_value(payload)?;
        job.log_summary();

        let ticket = self.render(&job)?;
        tracing::debug!(bytes = ticket.len(), "Ticket rendered");

        self.sink.send(&ticket).await?;
        Ok(())
    }

    /// Render with panics contained to this job
    fn render(&self, job: &PrintJob) -> JobResult<Vec<u8>> {
        panic::catch_unwind(AssertUnwindSafe(|| self.renderer.render(job)))
            .map_err(|cause| JobError::Unexpected(panic_message(cause.as_ref())))?
    }
}

fn job_id_of(payload: &Value) -> Option<i64> {
    payload.get("printJobId").and_then(Value::as_i64)
}

fn panic_message(cause: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = cause.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = cause.downcast_ref::<String>() {
        s.clone()
    } else {
        "render panicked".to_string()
    }
}
