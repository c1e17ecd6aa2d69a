//! Spooler printing (Windows print spooler, RAW datatype)
//!
//! The job lifecycle is one scoped operation: open queue, start document,
//! start page, write, end page, end document, close queue. The end and close
//! calls run on every exit path, so the spooler never keeps an orphaned job.

use tracing::{info, instrument, warn};

use crate::error::{CommError, CommResult};

/// Named spooler queue
#[derive(Debug, Clone)]
pub struct SpoolSink {
    queue: String,
}

impl SpoolSink {
    /// Create a spooler sink for `queue`
    ///
    /// Only available on Windows; elsewhere this returns `CommError::Unavailable`.
    pub fn new(queue: &str) -> CommResult<Self> {
        let queue = queue.trim();
        if queue.is_empty() {
            return Err(CommError::InvalidConfig("spooler queue name is empty".to_string()));
        }

        if cfg!(windows) {
            Ok(Self {
                queue: queue.to_string(),
            })
        } else {
            Err(CommError::Unavailable(format!(
                "print spooler not supported on this platform (queue {})",
                queue
            )))
        }
    }

    /// Get the queue name
    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub fn describe(&self) -> String {
        format!("Windows Printer: {}", self.queue)
    }

    #[instrument(skip(self, data), fields(queue = %self.queue, data_len = data.len()))]
    pub async fn send(&self, data: &[u8]) -> CommResult<()> {
        // Spooler calls are synchronous, run in blocking task
        let queue = self.queue.clone();
        let data = data.to_vec();

        let job_id = tokio::task::spawn_blocking(move || platform::write_raw(&queue, &data))
            .await
            .map_err(|e| CommError::Spooler(format!("Task join failed: {}", e)))?
            .inspect_err(|e| warn!(error = %e, "Spooler job failed"))?;

        info!(job_id, "Print data sent successfully");
        Ok(())
    }

    pub async fn test_connection(&self) -> bool {
        let queue = self.queue.clone();
        match tokio::task::spawn_blocking(move || platform::check_queue(&queue)).await {
            Ok(Ok(())) => {
                info!("Printer connection test successful");
                true
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Printer connection test failed");
                false
            }
            Err(_) => false,
        }
    }
}

/// Spooler calls for one open queue
#[cfg_attr(not(windows), allow(dead_code))]
trait SpoolBackend {
    /// Start a RAW document; returns the spooler job id
    fn start_doc(&mut self) -> CommResult<u32>;
    fn start_page(&mut self) -> CommResult<()>;
    fn write(&mut self, data: &[u8]) -> CommResult<()>;
    fn end_page(&mut self);
    fn end_doc(&mut self);
    fn close(&mut self);
}

/// Open queue with whatever lifecycle stages have been entered
///
/// Drop unwinds the stages in reverse order and always closes the queue.
#[cfg_attr(not(windows), allow(dead_code))]
struct SpoolJob<B: SpoolBackend> {
    backend: B,
    doc_started: bool,
    page_started: bool,
}

#[cfg_attr(not(windows), allow(dead_code))]
impl<B: SpoolBackend> SpoolJob<B> {
    fn new(backend: B) -> Self {
        Self {
            backend,
            doc_started: false,
            page_started: false,
        }
    }

    fn run(mut self, data: &[u8]) -> CommResult<u32> {
        let job_id = self.backend.start_doc()?;
        self.doc_started = true;
        self.backend.start_page()?;
        self.page_started = true;
        self.backend.write(data)?;
        Ok(job_id)
    }
}

impl<B: SpoolBackend> Drop for SpoolJob<B> {
    fn drop(&mut self) {
        if self.page_started {
            self.backend.end_page();
        }
        if self.doc_started {
            self.backend.end_doc();
        }
        self.backend.close();
    }
}

#[cfg(windows)]
mod platform {
    use core::ffi::c_void;

    use windows::Win32::Graphics::Printing::{
        ClosePrinter, DOC_INFO_1W, EndDocPrinter, EndPagePrinter, OpenPrinterW, PRINTER_HANDLE,
        StartDocPrinterW, StartPagePrinter, WritePrinter,
    };
    use windows::core::{PCWSTR, PWSTR};

    use super::{SpoolBackend, SpoolJob};
    use crate::error::{CommError, CommResult};

    /// Document name shown in the spooler queue
    const DOC_NAME: &str = "Repair Cafe Ticket";

    fn to_wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }

    struct Win32Queue {
        handle: PRINTER_HANDLE,
    }

    impl Win32Queue {
        fn open(queue: &str) -> CommResult<Self> {
            let mut handle = PRINTER_HANDLE::default();
            let name_w = to_wide(queue);
            unsafe { OpenPrinterW(PCWSTR::from_raw(name_w.as_ptr()), &mut handle, None) }
                .map_err(|e| CommError::Spooler(format!("OpenPrinter failed: {}", e)))?;
            Ok(Self { handle })
        }
    }

    impl SpoolBackend for Win32Queue {
        fn start_doc(&mut self) -> CommResult<u32> {
            let doc_name_w = to_wide(DOC_NAME);
            let datatype_w = to_wide("RAW");
            let doc_info = DOC_INFO_1W {
                pDocName: PWSTR(doc_name_w.as_ptr() as *mut _),
                pOutputFile: PWSTR::null(),
                pDatatype: PWSTR(datatype_w.as_ptr() as *mut _),
            };

            let job_id = unsafe { StartDocPrinterW(self.handle, 1, &doc_info as *const DOC_INFO_1W) };
            if job_id == 0 {
                return Err(CommError::Spooler("StartDocPrinter failed".to_string()));
            }
            Ok(job_id)
        }

        fn start_page(&mut self) -> CommResult<()> {
            if !unsafe { StartPagePrinter(self.handle) }.as_bool() {
                return Err(CommError::Spooler("StartPagePrinter failed".to_string()));
            }
            Ok(())
        }

        fn write(&mut self, data: &[u8]) -> CommResult<()> {
            let mut written: u32 = 0;
            let ok = unsafe {
                WritePrinter(
                    self.handle,
                    data.as_ptr() as *const c_void,
                    data.len() as u32,
                    &mut written,
                )
            };
            if !ok.as_bool() {
                return Err(CommError::Spooler("WritePrinter failed".to_string()));
            }
            if written != data.len() as u32 {
                return Err(CommError::Spooler(format!(
                    "Incomplete write: {} of {} bytes",
                    written,
                    data.len()
                )));
            }
            Ok(())
        }

        fn end_page(&mut self) {
            let _ = unsafe { EndPagePrinter(self.handle) };
        }

        fn end_doc(&mut self) {
            let _ = unsafe { EndDocPrinter(self.handle) };
        }

        fn close(&mut self) {
            let _ = unsafe { ClosePrinter(self.handle) };
        }
    }

    pub fn write_raw(queue: &str, data: &[u8]) -> CommResult<u32> {
        SpoolJob::new(Win32Queue::open(queue)?).run(data)
    }

    pub fn check_queue(queue: &str) -> CommResult<()> {
        Win32Queue::open(queue).map(|q| drop(SpoolJob::new(q)))
    }
}

#[cfg(not(windows))]
mod platform {
    use crate::error::{CommError, CommResult};

    pub fn write_raw(queue: &str, _data: &[u8]) -> CommResult<u32> {
        Err(CommError::Unavailable(format!("print spooler unavailable for {}", queue)))
    }

    pub fn check_queue(queue: &str) -> CommResult<()> {
        Err(CommError::Unavailable(format!("print spooler unavailable for {}", queue)))
    }
}
