//! Error types for the printer library

use thiserror::Error;

/// Transport error types
///
/// Every variant is produced after (or instead of) a transport attempt.
/// None of them leave a resource open.
#[derive(Debug, Error)]
pub enum CommError {
    /// Connect or write did not finish within the configured timeout
    #[error("Printer connection timeout at {0}")]
    Timeout(String),

    /// Connection refused, unreachable host, bad route
    #[error("Failed to connect to printer: {0}")]
    ConnectFailed(String),

    /// USB discovery or vid/pid lookup found nothing
    #[error("No USB printer found: {0}")]
    NoDeviceFound(String),

    /// libusb reported an error after the device was located
    #[error("USB error: {0}")]
    Usb(String),

    /// Print spooler call failed
    #[error("Spooler error: {0}")]
    Spooler(String),

    /// Transport backend is not available in this build or on this platform
    #[error("Printer backend unavailable: {0}")]
    Unavailable(String),

    /// Invalid printer configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// IO error during printing
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for transport operations
pub type CommResult<T> = Result<T, CommError>;

/// Raster/QR encoding errors
#[derive(Debug, Error)]
pub enum RasterError {
    /// Payload could not be encoded as a QR symbol (too long, etc.)
    #[error("QR encoding failed: {0}")]
    QrEncode(String),

    /// Bitmap does not fit the 16-bit dimension fields of the image command
    #[error("Raster too large: {width}x{height} px")]
    TooLarge { width: u32, height: u32 },
}
