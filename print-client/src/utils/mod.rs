//! Utilities - logging setup

pub mod logger;
