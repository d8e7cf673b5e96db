//! `cadence-core`: configuration and errors shared by every cadence crate.

pub mod config;
pub mod error;

pub use config::{CadenceConfig, ClockConfig, ClockKind, LoggerConfig};
pub use error::{CadenceError, Result};
