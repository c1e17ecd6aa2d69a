use anyhow::Context;
use rc_print_client::transport::{self, OutboundEvent};
use rc_print_client::{
    JobResultReporter, PrintWorker, TicketRenderer, print_banner, setup_environment,
};
use rc_printer::PrinterSink;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Pending jobs buffered between the reader and the worker
const JOB_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (dotenv, config, logging)
    let config = setup_environment();
    print_banner();

    tracing::info!("Repair Cafe print client starting...");
    config.log_summary();

    // 2. Printer
    let sink_config = config.sink_config()?;
    let sink = PrinterSink::from_config(&sink_config, config.printer_timeout())
        .context("failed to initialize printer")?;
    tracing::info!(printer = %sink.describe(), "Printer initialized");

    if sink.test_connection().await {
        tracing::info!("Printer is reachable");
    } else {
        tracing::warn!("Printer connection test failed, jobs will be attempted anyway");
    }

    // 3. Event streams
    let shutdown = CancellationToken::new();
    let (job_tx, job_rx) = mpsc::channel(JOB_BUFFER);
    let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);

    let writer = tokio::spawn(transport::write_events(event_rx, tokio::io::stdout()));

    event_tx
        .send(OutboundEvent::RegisterPrinter {
            printer_naam: config.printer_name.clone(),
        })
        .await
        .context("outbound stream closed before registration")?;
    tracing::info!(printer_name = %config.printer_name, "Registering printer");

    transport::spawn_stdin_reader(job_tx).context("failed to start stdin reader")?;

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutting down...");
                shutdown.cancel();
            }
        });
    }

    // 4. Print worker (returns on shutdown or end of input)
    let worker = PrintWorker::new(
        TicketRenderer::new(config.render_config()),
        sink,
        JobResultReporter::new(event_tx),
    );
    worker.run(job_rx, shutdown).await;

    // Worker dropped its reporter, so the writer drains and finishes
    match writer.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "Outbound stream write failed"),
        Err(e) => tracing::error!(error = %e, "Outbound writer task failed"),
    }

    tracing::info!("Print client stopped");
    Ok(())
}
