//! Printer sinks for delivering ESC/POS data
//!
//! Supports:
//! - Network printers (raw TCP, usually port 9100)
//! - USB printers (raw bulk transfer, `usb` feature)
//! - Spooler queues (Windows print spooler, RAW datatype)
//!
//! A process configures exactly one sink. Transports are not safe for
//! concurrent use; callers serialize `send` calls (one dispatch worker).

mod network;
mod spool;
mod usb;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::CommResult;

pub use network::NetworkSink;
pub use spool::SpoolSink;
pub use usb::{
    EndpointDirection, EndpointInfo, InterfaceCandidate, PRINTER_CLASS, UsbRawSink, UsbTarget,
    select_printer_interface,
};

/// Connect/write timeout applied by every transport
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// USB device address
///
/// `vendor_id == 0` means "discover": the first printer-class interface
/// with both a bulk IN and a bulk OUT endpoint is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsbConfig {
    pub vendor_id: u16,
    pub product_id: u16,
    pub interface: u8,
    pub in_ep: u8,
    pub out_ep: u8,
}

impl Default for UsbConfig {
    /// POS-80C defaults
    fn default() -> Self {
        Self {
            vendor_id: 0x0519,
            product_id: 0x0003,
            interface: 0,
            in_ep: 0x81,
            out_ep: 0x03,
        }
    }
}

/// Which transport to build, and where it points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkConfig {
    Network { host: String, port: u16 },
    Usb(UsbConfig),
    Spool { queue: String },
}

/// The configured printer
#[derive(Debug)]
pub enum PrinterSink {
    Network(NetworkSink),
    UsbRaw(UsbRawSink),
    Spool(SpoolSink),
}

impl PrinterSink {
    /// Build the sink for `config`
    ///
    /// Fails with `CommError::Unavailable` when the backend for the
    /// requested transport is not present in this build or platform.
    pub fn from_config(config: &SinkConfig, timeout: Duration) -> CommResult<Self> {
        let sink = match config {
            SinkConfig::Network { host, port } => {
                Self::Network(NetworkSink::new(host, *port)?.with_timeout(timeout))
            }
            SinkConfig::Usb(usb) => Self::UsbRaw(UsbRawSink::new(*usb)?.with_timeout(timeout)),
            SinkConfig::Spool { queue } => Self::Spool(SpoolSink::new(queue)?),
        };
        Ok(sink)
    }

    /// Deliver one rendered ticket
    #[instrument(skip(self, data), fields(sink = %self.describe(), data_len = data.len()))]
    pub async fn send(&self, data: &[u8]) -> CommResult<()> {
        match self {
            Self::Network(s) => s.send(data).await,
            Self::UsbRaw(s) => s.send(data).await,
            Self::Spool(s) => s.send(data).await,
        }
    }

    /// Check whether the printer can be reached without printing anything
    pub async fn test_connection(&self) -> bool {
        match self {
            Self::Network(s) => s.test_connection().await,
            Self::UsbRaw(s) => s.test_connection().await,
            Self::Spool(s) => s.test_connection().await,
        }
    }

    /// Human-readable connection description
    pub fn describe(&self) -> String {
        match self {
            Self::Network(s) => s.describe(),
            Self::UsbRaw(s) => s.describe(),
            Self::Spool(s) => s.describe(),
        }
    }
}
