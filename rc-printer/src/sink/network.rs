//! Raw TCP printing (JetDirect / port 9100)

use std::io;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{info, instrument, warn};

use super::DEFAULT_TIMEOUT;
use crate::error::{CommError, CommResult};

/// Network printer
///
/// Opens a fresh connection for every call; nothing is kept between jobs.
#[derive(Debug, Clone)]
pub struct NetworkSink {
    host: String,
    port: u16,
    timeout: Duration,
}

impl NetworkSink {
    /// Create a new network sink
    pub fn new(host: &str, port: u16) -> CommResult<Self> {
        let host = host.trim();
        if host.is_empty() {
            return Err(CommError::InvalidConfig(
                "printer host is required for network connection".to_string(),
            ));
        }
        if port == 0 {
            return Err(CommError::InvalidConfig("printer port must be non-zero".to_string()));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Set connect/write timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `host:port`
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn describe(&self) -> String {
        format!("Network: {}", self.endpoint())
    }

    async fn connect(&self) -> CommResult<TcpStream> {
        timeout(self.timeout, TcpStream::connect((self.host.as_str(), self.port)))
            .await
            .map_err(|_| CommError::Timeout(self.endpoint()))?
            .map_err(|e| connect_error(&self.endpoint(), e))
    }

    /// Send the full buffer, then close the connection
    #[instrument(skip(self, data), fields(addr = %self.endpoint(), data_len = data.len()))]
    pub async fn send(&self, data: &[u8]) -> CommResult<()> {
        info!("Connecting to printer");
        let mut stream = match self.connect().await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "Printer connect failed");
                return Err(e);
            }
        };

        let result = timeout(self.timeout, async {
            stream.write_all(data).await?;
            stream.flush().await
        })
        .await;

        // Close on every path
        if let Err(e) = stream.shutdown().await {
            warn!(error = %e, "Error closing printer connection");
        }

        match result {
            Ok(Ok(())) => {
                info!("Print data sent successfully");
                Ok(())
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Printer write failed");
                Err(CommError::Io(io::Error::new(
                    e.kind(),
                    format!("Write failed: {}", e),
                )))
            }
            Err(_) => {
                warn!("Printer write timeout");
                Err(CommError::Timeout(self.endpoint()))
            }
        }
    }

    #[instrument(skip(self), fields(addr = %self.endpoint()))]
    pub async fn test_connection(&self) -> bool {
        match self.connect().await {
            Ok(mut stream) => {
                let _ = stream.shutdown().await;
                info!("Printer connection test successful");
                true
            }
            Err(e) => {
                warn!(error = %e, "Printer connection test failed");
                false
            }
        }
    }
}

fn connect_error(endpoint: &str, e: io::Error) -> CommError {
    match e.kind() {
        io::ErrorKind::TimedOut => CommError::Timeout(endpoint.to_string()),
        _ => CommError::ConnectFailed(format!("{}: {}", endpoint, e)),
    }
}
