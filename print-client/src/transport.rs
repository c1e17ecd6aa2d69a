//! Line-delimited JSON event transport
//!
//! Each line is one envelope `{"event": <name>, "data": <payload>}`.
//! Inbound events are read from stdin, outbound events are written to
//! stdout. Logs never go to stdout.

use std::io::BufRead;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Events received from the job source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum InboundEvent {
    /// Raw job payload, parsed by the worker
    PrintJob(Value),
    PrinterRegistered {
        #[serde(rename = "printerId")]
        printer_id: Option<i64>,
        #[serde(rename = "printerNaam")]
        printer_naam: Option<String>,
    },
    PrintAck {
        #[serde(rename = "printJobId")]
        print_job_id: Option<i64>,
        status: Option<String>,
    },
    PrintStatusUpdate(Value),
    Error {
        message: Option<String>,
    },
}

/// Events sent back to the job source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum OutboundEvent {
    RegisterPrinter {
        #[serde(rename = "printerNaam")]
        printer_naam: String,
    },
    PrintCompleted {
        #[serde(rename = "printJobId")]
        print_job_id: i64,
    },
    PrintFailed {
        #[serde(rename = "printJobId")]
        print_job_id: i64,
        #[serde(rename = "errorMessage")]
        error_message: String,
    },
}

/// Parse one inbound line and return the job payload it carries, if any
///
/// Non-job events are logged here. Blank and unparseable lines yield `None`.
pub fn route_line(line: &str) -> Option<Value> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let event = match serde_json::from_str::<InboundEvent>(line) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "Skipping unparseable inbound line");
            return None;
        }
    };

    match event {
        InboundEvent::PrintJob(payload) => Some(payload),
        InboundEvent::PrinterRegistered {
            printer_id,
            printer_naam,
        } => {
            info!(?printer_id, ?printer_naam, "Printer registered");
            None
        }
        InboundEvent::PrintAck {
            print_job_id,
            status,
        } => {
            debug!(?print_job_id, ?status, "Print acknowledged");
            None
        }
        InboundEvent::PrintStatusUpdate(data) => {
            debug!(%data, "Print status update");
            None
        }
        InboundEvent::Error { message } => {
            error!(message = message.as_deref().unwrap_or("unknown"), "Server error");
            None
        }
    }
}

/// Read inbound lines from `reader` and forward job payloads to `jobs`
///
/// Returns at end of input, on a read error, or once the receiving side
/// of `jobs` is gone.
pub fn read_events<R: BufRead>(reader: R, jobs: mpsc::Sender<Value>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "Inbound stream read failed");
                return;
            }
        };
        let Some(payload) = route_line(&line) else {
            continue;
        };
        if jobs.blocking_send(payload).is_err() {
            debug!("Job channel closed, reader stopping");
            return;
        }
    }
    info!("Inbound stream closed");
}

/// Spawn a thread reading inbound events from stdin
///
/// A plain thread is used so a pending stdin read never holds up runtime
/// shutdown.
pub fn spawn_stdin_reader(jobs: mpsc::Sender<Value>) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || read_events(std::io::stdin().lock(), jobs))
}

/// Write outbound events to `writer`, one JSON line each, until all
/// senders are dropped
pub async fn write_events<W>(mut rx: mpsc::Receiver<OutboundEvent>, mut writer: W) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(event) = rx.recv().await {
        let mut line = serde_json::to_vec(&event).map_err(std::io::Error::other)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outbound_wire_format() {
        let completed = serde_json::to_value(OutboundEvent::PrintCompleted { print_job_id: 5 }).unwrap();
        assert_eq!(completed, json!({"event": "print-completed", "data": {"printJobId": 5}}));

        let failed = serde_json::to_value(OutboundEvent::PrintFailed {
            print_job_id: 6,
            error_message: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(
            failed,
            json!({"event": "print-failed", "data": {"printJobId": 6, "errorMessage": "boom"}})
        );

        let register = serde_json::to_value(OutboundEvent::RegisterPrinter {
            printer_naam: "Printer-01".to_string(),
        })
        .unwrap();
        assert_eq!(
            register,
            json!({"event": "register-printer", "data": {"printerNaam": "Printer-01"}})
        );
    }

    #[test]
    fn test_route_print_job() {
        let payload = route_line(r#"{"event":"print-job","data":{"printJobId":1,"volgnummer":"A-1"}}"#);
        assert_eq!(payload, Some(json!({"printJobId": 1, "volgnummer": "A-1"})));
    }

    #[test]
    fn test_route_other_events() {
        assert_eq!(
            route_line(r#"{"event":"printer-registered","data":{"printerId":3,"printerNaam":"P"}}"#),
            None
        );
        assert_eq!(route_line(r#"{"event":"print-ack","data":{"printJobId":3}}"#), None);
        assert_eq!(route_line(r#"{"event":"print-status-update","data":[1,2]}"#), None);
        assert_eq!(route_line(r#"{"event":"error","data":{}}"#), None);
    }

    #[test]
    fn test_route_garbage() {
        assert_eq!(route_line(""), None);
        assert_eq!(route_line("   "), None);
        assert_eq!(route_line("not json"), None);
        assert_eq!(route_line(r#"{"event":"reboot","data":{}}"#), None);
    }

    #[test]
    fn test_inbound_parse() {
        let event: InboundEvent =
            serde_json::from_str(r#"{"event":"print-ack","data":{"printJobId":9,"status":"ok"}}"#).unwrap();
        assert_eq!(
            event,
            InboundEvent::PrintAck {
                print_job_id: Some(9),
                status: Some("ok".to_string()),
            }
        );
    }

    #[test]
    fn test_read_events_forwards_jobs_in_order() {
        let input = concat!(
            r#"{"event":"print-job","data":{"printJobId":1}}"#,
            "\n\nnoise\n",
            r#"{"event":"print-ack","data":{"printJobId":1}}"#,
            "\n",
            r#"{"event":"print-job","data":{"printJobId":2}}"#,
            "\n",
        );
        let (tx, mut rx) = mpsc::channel(8);
        read_events(input.as_bytes(), tx);

        assert_eq!(rx.try_recv().unwrap(), json!({"printJobId": 1}));
        assert_eq!(rx.try_recv().unwrap(), json!({"printJobId": 2}));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_write_events() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(OutboundEvent::PrintCompleted { print_job_id: 1 }).await.unwrap();
        tx.send(OutboundEvent::PrintFailed {
            print_job_id: 2,
            error_message: "x".to_string(),
        })
        .await
        .unwrap();
        drop(tx);

        let mut out = Vec::new();
        write_events(rx, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"event":"print-completed","data":{"printJobId":1}}"#);
        assert_eq!(
            lines[1],
            r#"{"event":"print-failed","data":{"printJobId":2,"errorMessage":"x"}}"#
        );
    }
}
