//! Ticket Printing Module
//!
//! Each received job goes through the same steps:
//! - Parse and validate the payload into a [`PrintJob`]
//! - Render it into ESC/POS bytes with [`TicketRenderer`]
//! - Send the bytes to the configured printer sink
//! - Report exactly one outcome through [`JobResultReporter`]

pub mod error;
pub mod job;
pub mod renderer;
pub mod reporter;
pub mod worker;

pub use error::{JobError, JobResult};
pub use job::{JobExtra, Material, PrintJob, PrintJobPayload, TicketKind};
pub use renderer::{RenderConfig, TicketRenderer, format_money};
pub use reporter::{JobOutcome, JobResultReporter, JobStatus};
pub use worker::PrintWorker;
