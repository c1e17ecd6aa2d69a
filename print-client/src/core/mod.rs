//! Core module - client configuration
//!
//! - [`Config`] - environment-driven settings
//! - [`ConfigError`] - invalid connection settings

pub mod config;

pub use config::{Config, ConfigError};
