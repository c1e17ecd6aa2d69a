//! Raw USB printing via bulk transfers
//!
//! The libusb backend is behind the `usb` cargo feature. Without it,
//! [`UsbRawSink::new`] reports `CommError::Unavailable`.

use std::time::Duration;

use super::UsbConfig;
use crate::error::{CommError, CommResult};

/// USB interface class code for printers
pub const PRINTER_CLASS: u8 = 0x07;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointDirection {
    In,
    Out,
}

/// One endpoint of an interface descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointInfo {
    pub address: u8,
    pub direction: EndpointDirection,
    pub bulk: bool,
}

/// An interface found while enumerating devices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceCandidate {
    pub vendor_id: u16,
    pub product_id: u16,
    pub interface: u8,
    pub class_code: u8,
    pub endpoints: Vec<EndpointInfo>,
}

/// Resolved device address used for bulk writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsbTarget {
    pub vendor_id: u16,
    pub product_id: u16,
    pub interface: u8,
    pub in_ep: u8,
    pub out_ep: u8,
}

impl From<UsbConfig> for UsbTarget {
    fn from(c: UsbConfig) -> Self {
        Self {
            vendor_id: c.vendor_id,
            product_id: c.product_id,
            interface: c.interface,
            in_ep: c.in_ep,
            out_ep: c.out_ep,
        }
    }
}

/// First printer-class interface exposing both a bulk IN and a bulk OUT endpoint
pub fn select_printer_interface(candidates: &[InterfaceCandidate]) -> Option<UsbTarget> {
    candidates
        .iter()
        .filter(|c| c.class_code == PRINTER_CLASS)
        .find_map(|c| {
            let bulk = |dir: EndpointDirection| {
                c.endpoints
                    .iter()
                    .find(|e| e.bulk && e.direction == dir)
                    .map(|e| e.address)
            };
            Some(UsbTarget {
                vendor_id: c.vendor_id,
                product_id: c.product_id,
                interface: c.interface,
                in_ep: bulk(EndpointDirection::In)?,
                out_ep: bulk(EndpointDirection::Out)?,
            })
        })
}

/// Endpoint accepting bulk OUT transfers
#[cfg_attr(not(feature = "usb"), allow(dead_code))]
trait BulkWrite {
    fn write_bulk(&self, data: &[u8], timeout: Duration) -> CommResult<usize>;
}

/// Write all of `data` through the cached device, opening it first if needed
///
/// Any failure empties the slot, so the next call opens the device again.
#[cfg_attr(not(feature = "usb"), allow(dead_code))]
fn write_cached<D: BulkWrite>(
    slot: &mut Option<D>,
    open: impl FnOnce() -> CommResult<D>,
    timeout: Duration,
    data: &[u8],
) -> CommResult<()> {
    let result = (|| {
        let dev = match slot {
            Some(dev) => dev,
            None => slot.insert(open()?),
        };

        let mut written = 0;
        while written < data.len() {
            let n = dev.write_bulk(&data[written..], timeout)?;
            if n == 0 {
                return Err(CommError::Usb("bulk write made no progress".to_string()));
            }
            written += n;
        }
        Ok(())
    })();

    if let Err(e) = &result {
        tracing::warn!(error = %e, "USB send failed, resetting device handle");
        *slot = None;
    }
    result
}

/// USB printer
///
/// Keeps the claimed device handle between jobs. A failed send drops the
/// handle so the next call opens the device again.
#[derive(Debug)]
pub struct UsbRawSink {
    config: UsbConfig,
    #[cfg_attr(not(feature = "usb"), allow(dead_code))]
    timeout: Duration,
    #[cfg(feature = "usb")]
    device: std::sync::Arc<parking_lot::Mutex<Option<backend::OpenDevice>>>,
}

impl UsbRawSink {
    /// Create a USB sink
    ///
    /// Checks that the libusb backend loads; the device itself is opened lazily.
    pub fn new(config: UsbConfig) -> CommResult<Self> {
        #[cfg(feature = "usb")]
        {
            backend::init()?;
            Ok(Self {
                config,
                timeout: super::DEFAULT_TIMEOUT,
                device: Default::default(),
            })
        }

        #[cfg(not(feature = "usb"))]
        {
            let _ = config;
            Err(CommError::Unavailable(
                "built without USB support (enable the `usb` feature)".to_string(),
            ))
        }
    }

    /// Set bulk transfer timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn describe(&self) -> String {
        if self.config.vendor_id == 0 {
            "USB: auto-discover".to_string()
        } else {
            format!(
                "USB: VID={:#06x} PID={:#06x}",
                self.config.vendor_id, self.config.product_id
            )
        }
    }

    /// One bulk write of the full buffer
    pub async fn send(&self, data: &[u8]) -> CommResult<()> {
        #[cfg(feature = "usb")]
        {
            let device = std::sync::Arc::clone(&self.device);
            let config = self.config;
            let timeout = self.timeout;
            let data = data.to_vec();

            tokio::task::spawn_blocking(move || backend::send(&device, config, timeout, &data))
                .await
                .map_err(|e| CommError::Usb(format!("Task join failed: {}", e)))?
        }

        #[cfg(not(feature = "usb"))]
        {
            let _ = data;
            Err(CommError::Unavailable("built without USB support".to_string()))
        }
    }

    pub async fn test_connection(&self) -> bool {
        #[cfg(feature = "usb")]
        {
            let device = std::sync::Arc::clone(&self.device);
            let config = self.config;
            tokio::task::spawn_blocking(move || backend::test(&device, config))
                .await
                .unwrap_or(false)
        }

        #[cfg(not(feature = "usb"))]
        {
            false
        }
    }
}

#[cfg(feature = "usb")]
mod backend {
    use std::time::Duration;

    use parking_lot::Mutex;
    use rusb::{DeviceHandle, Direction, GlobalContext, TransferType};
    use tracing::{debug, info, warn};

    use super::{
        BulkWrite, EndpointDirection, EndpointInfo, InterfaceCandidate, UsbTarget,
        select_printer_interface, write_cached,
    };
    use crate::error::{CommError, CommResult};
    use crate::sink::UsbConfig;

    /// Claimed interface; released on drop
    pub struct OpenDevice {
        handle: DeviceHandle<GlobalContext>,
        target: UsbTarget,
    }

    impl std::fmt::Debug for OpenDevice {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("OpenDevice").field("target", &self.target).finish()
        }
    }

    impl BulkWrite for OpenDevice {
        fn write_bulk(&self, data: &[u8], timeout: Duration) -> CommResult<usize> {
            self.handle
                .write_bulk(self.target.out_ep, data, timeout)
                .map_err(usb_error)
        }
    }

    impl Drop for OpenDevice {
        fn drop(&mut self) {
            if let Err(e) = self.handle.release_interface(self.target.interface) {
                warn!(error = %e, "Error releasing USB interface");
            }
        }
    }

    pub fn init() -> CommResult<()> {
        rusb::devices()
            .map(|_| ())
            .map_err(|e| CommError::Unavailable(format!("libusb: {}", e)))
    }

    fn usb_error(e: rusb::Error) -> CommError {
        match e {
            rusb::Error::Timeout => CommError::Timeout("USB bulk transfer".to_string()),
            rusb::Error::NoDevice | rusb::Error::NotFound => {
                CommError::NoDeviceFound(e.to_string())
            }
            other => CommError::Usb(other.to_string()),
        }
    }

    fn enumerate() -> CommResult<Vec<InterfaceCandidate>> {
        let devices = rusb::devices().map_err(usb_error)?;
        let mut candidates = Vec::new();

        for device in devices.iter() {
            let Ok(desc) = device.device_descriptor() else {
                continue;
            };
            for n in 0..desc.num_configurations() {
                let Ok(config) = device.config_descriptor(n) else {
                    continue;
                };
                for interface in config.interfaces() {
                    for alt in interface.descriptors() {
                        let endpoints = alt
                            .endpoint_descriptors()
                            .map(|ep| EndpointInfo {
                                address: ep.address(),
                                direction: match ep.direction() {
                                    Direction::In => EndpointDirection::In,
                                    Direction::Out => EndpointDirection::Out,
                                },
                                bulk: ep.transfer_type() == TransferType::Bulk,
                            })
                            .collect();

                        candidates.push(InterfaceCandidate {
                            vendor_id: desc.vendor_id(),
                            product_id: desc.product_id(),
                            interface: alt.interface_number(),
                            class_code: alt.class_code(),
                            endpoints,
                        });
                    }
                }
            }
        }

        Ok(candidates)
    }

    fn resolve(config: UsbConfig) -> CommResult<UsbTarget> {
        if config.vendor_id != 0 {
            return Ok(config.into());
        }

        let candidates = enumerate()?;
        debug!(count = candidates.len(), "USB interfaces enumerated");
        let target = select_printer_interface(&candidates).ok_or_else(|| {
            CommError::NoDeviceFound("no printer-class interface with bulk IN/OUT".to_string())
        })?;
        info!(
            vid = %format!("{:#06x}", target.vendor_id),
            pid = %format!("{:#06x}", target.product_id),
            interface = target.interface,
            "USB printer discovered"
        );
        Ok(target)
    }

    fn open(config: UsbConfig) -> CommResult<OpenDevice> {
        let target = resolve(config)?;

        let handle = rusb::open_device_with_vid_pid(target.vendor_id, target.product_id)
            .ok_or_else(|| {
                CommError::NoDeviceFound(format!(
                    "VID={:#06x} PID={:#06x}",
                    target.vendor_id, target.product_id
                ))
            })?;

        // Not supported on every platform
        let _ = handle.set_auto_detach_kernel_driver(true);
        handle.claim_interface(target.interface).map_err(usb_error)?;
        debug!("USB printer instance created");

        Ok(OpenDevice { handle, target })
    }

    pub fn send(
        device: &Mutex<Option<OpenDevice>>,
        config: UsbConfig,
        timeout: Duration,
        data: &[u8],
    ) -> CommResult<()> {
        let mut slot = device.lock();
        write_cached(&mut *slot, || open(config), timeout, data)?;
        info!(bytes = data.len(), "Print data sent successfully");
        Ok(())
    }

    pub fn test(device: &Mutex<Option<OpenDevice>>, config: UsbConfig) -> bool {
        let mut slot = device.lock();
        if slot.is_some() {
            return true;
        }
        match open(config) {
            Ok(dev) => {
                *slot = Some(dev);
                true
            }
            Err(e) => {
                warn!(error = %e, "Printer connection test failed");
                false
            }
        }
    }
}
