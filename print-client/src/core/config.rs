use std::time::Duration;

use rc_printer::{SinkConfig, UsbConfig};
use thiserror::Error;

use crate::printing::RenderConfig;

/// Print client configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | PRINTER_NAME | Printer-01 | name sent with `register-printer` |
/// | CONNECTION_TYPE | network | network / usb / spool |
/// | PRINTER_IP | - | network printer host |
/// | PRINTER_PORT | 9100 | network printer port |
/// | WINDOWS_PRINTER_NAME | - | spooler queue (also selects the spooler for usb) |
/// | USB_VENDOR_ID | 0x0519 | hex, 0 enables discovery |
/// | USB_PRODUCT_ID | 0x0003 | hex |
/// | USB_INTERFACE | 0 | interface number |
/// | USB_IN_EP | 0x81 | hex |
/// | USB_OUT_EP | 0x03 | hex |
/// | PRINTER_TIMEOUT_MS | 5000 | transport timeout (ms) |
/// | PAPER_WIDTH | 42 | characters per line |
/// | DEBUG | false | debug logging |
/// | LOG_DIR | - | daily rolling log directory |
///
/// # Example
///
/// ```ignore
/// PRINTER_IP=192.168.1.100 DEBUG=true cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub printer_name: String,
    /// network | usb | spool
    pub connection_type: String,
    pub printer_ip: Option<String>,
    pub printer_port: u16,
    pub windows_printer_name: Option<String>,
    pub usb: UsbConfig,
    pub printer_timeout_ms: u64,
    pub paper_width: usize,
    pub debug: bool,
    pub log_dir: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown connection type: {0} (expected network, usb or spool)")]
    UnknownConnectionType(String),

    #[error("{0} is required for connection type {1}")]
    Missing(&'static str, String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = UsbConfig::default();
        let set = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            printer_name: set("PRINTER_NAME").unwrap_or_else(|| "Printer-01".into()),
            connection_type: set("CONNECTION_TYPE")
                .map(|v| v.to_lowercase())
                .unwrap_or_else(|| "network".into()),
            printer_ip: set("PRINTER_IP"),
            printer_port: set("PRINTER_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(9100),
            windows_printer_name: set("WINDOWS_PRINTER_NAME"),
            usb: UsbConfig {
                vendor_id: set("USB_VENDOR_ID")
                    .and_then(|v| parse_hex(&v))
                    .unwrap_or(defaults.vendor_id),
                product_id: set("USB_PRODUCT_ID")
                    .and_then(|v| parse_hex(&v))
                    .unwrap_or(defaults.product_id),
                interface: set("USB_INTERFACE")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.interface),
                in_ep: set("USB_IN_EP")
                    .and_then(|v| parse_hex(&v))
                    .unwrap_or(defaults.in_ep),
                out_ep: set("USB_OUT_EP")
                    .and_then(|v| parse_hex(&v))
                    .unwrap_or(defaults.out_ep),
            },
            printer_timeout_ms: set("PRINTER_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .filter(|ms| *ms > 0)
                .unwrap_or(5000),
            paper_width: set("PAPER_WIDTH")
                .and_then(|v| v.parse().ok())
                .filter(|w| *w > 0)
                .unwrap_or(42),
            debug: set("DEBUG")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
            log_dir: set("LOG_DIR"),
        }
    }

    /// Sink selection for the configured connection type
    pub fn sink_config(&self) -> Result<SinkConfig, ConfigError> {
        match self.connection_type.as_str() {
            "network" => {
                let host = self
                    .printer_ip
                    .clone()
                    .ok_or_else(|| ConfigError::Missing("PRINTER_IP", self.connection_type.clone()))?;
                Ok(SinkConfig::Network {
                    host,
                    port: self.printer_port,
                })
            }
            // A named OS queue takes precedence over raw USB
            "usb" => Ok(match &self.windows_printer_name {
                Some(queue) => SinkConfig::Spool {
                    queue: queue.clone(),
                },
                None => SinkConfig::Usb(self.usb),
            }),
            "spool" => {
                let queue = self.windows_printer_name.clone().ok_or_else(|| {
                    ConfigError::Missing("WINDOWS_PRINTER_NAME", self.connection_type.clone())
                })?;
                Ok(SinkConfig::Spool { queue })
            }
            other => Err(ConfigError::UnknownConnectionType(other.to_string())),
        }
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            width: self.paper_width,
            wrap_width: self.paper_width,
            ..RenderConfig::default()
        }
    }

    pub fn printer_timeout(&self) -> Duration {
        Duration::from_millis(self.printer_timeout_ms)
    }

    /// Default log level when `RUST_LOG` is not set
    pub fn log_level(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }

    /// Log the effective configuration
    pub fn log_summary(&self) {
        tracing::info!(
            printer_name = %self.printer_name,
            connection_type = %self.connection_type,
            printer_ip = self.printer_ip.as_deref().unwrap_or("-"),
            printer_port = self.printer_port,
            windows_printer = self.windows_printer_name.as_deref().unwrap_or("-"),
            usb_vendor_id = %format!("{:#06x}", self.usb.vendor_id),
            usb_product_id = %format!("{:#06x}", self.usb.product_id),
            timeout_ms = self.printer_timeout_ms,
            paper_width = self.paper_width,
            debug = self.debug,
            "Configuration loaded"
        );
    }
}

/// Parse a hex number with or without a `0x` prefix
fn parse_hex<T>(s: &str) -> Option<T>
where
    T: TryFrom<u32>,
{
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u32::from_str_radix(digits, 16)
        .ok()
        .and_then(|v| T::try_from(v).ok())
}
