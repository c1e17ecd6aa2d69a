//! Repair Cafe print client
//!
//! Receives repair tickets from the Repair Cafe server, renders them as
//! ESC/POS and prints them on a thermal printer.
//!
//! # Module layout
//!
//! ```text
//! src/
//! ├── core/          # configuration
//! ├── printing/      # job model, renderer, reporter, worker
//! ├── utils/         # logging
//! └── transport.rs   # line-delimited JSON events over stdio
//! ```

pub mod core;
pub mod printing;
pub mod transport;
pub mod utils;

pub use core::{Config, ConfigError};
pub use printing::{
    JobError, JobOutcome, JobResultReporter, JobStatus, PrintJob, PrintWorker, RenderConfig,
    TicketRenderer,
};
pub use transport::{InboundEvent, OutboundEvent};
pub use utils::logger::init_logger_with_file;

/// Load `.env`, read the configuration and start logging
pub fn setup_environment() -> Config {
    dotenv::dotenv().ok();
    let config = Config::from_env();
    init_logger_with_file(Some(config.log_level()), config.log_dir.as_deref());
    config
}

pub fn print_banner() {
    eprintln!(
        r#"
  ___                _        ___         __
 | _ \___ _ __  __ _(_)_ _   / __|__ _ / _|___
 |   / -_) '_ \/ _` | | '_| | (__/ _` |  _/ -_)
 |_|_\___| .__/\__,_|_|_|    \___\__,_|_| \___|
         |_|            print client
    "#
    );
}
