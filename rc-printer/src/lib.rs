//! # rc-printer
//!
//! ESC/POS thermal printer library - low-level printing capabilities only.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - ESC/POS command building
//! - Windows-1252 encoding for Western printers
//! - Text layout (wrapping, block centering, fixed columns)
//! - QR code rasterization for the `GS v 0` image command
//! - Delivery over raw TCP, raw USB, or the Windows print spooler
//!
//! Business logic (WHAT to print) stays in application code:
//! - Ticket rendering → rc-print-client
//!
//! ## Example
//!
//! ```ignore
//! use rc_printer::{EscPosBuilder, PrinterSink, SinkConfig, DEFAULT_TIMEOUT};
//!
//! let mut builder = EscPosBuilder::new(42);
//! builder.center();
//! builder.double_size();
//! builder.line("REPAIR CAFE");
//! builder.reset_size();
//! builder.sep_double();
//! builder.cut_feed(3);
//!
//! let config = SinkConfig::Network { host: "192.168.1.100".into(), port: 9100 };
//! let sink = PrinterSink::from_config(&config, DEFAULT_TIMEOUT)?;
//! sink.send(&builder.build()).await?;
//! ```

mod encoding;
mod error;
mod escpos;
pub mod layout;
mod raster;
mod sink;

// Re-exports
pub use encoding::{SUBSTITUTE, encode_cp1252};
pub use error::{CommError, CommResult, RasterError};
pub use escpos::{CODE_PAGE_WPC1252, EscPosBuilder};
pub use raster::{MAX_RASTER_WIDTH, QrRasterizer, Raster};
pub use sink::{
    DEFAULT_TIMEOUT, EndpointDirection, EndpointInfo, InterfaceCandidate, NetworkSink,
    PRINTER_CLASS, PrinterSink, SinkConfig, SpoolSink, UsbConfig, UsbRawSink, UsbTarget,
    select_printer_interface,
};
