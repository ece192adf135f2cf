//! Logger setup for binaries built on tau-draw.
//!
//! The library itself only emits through the `log` facade.

mod init;

pub use init::{init_logging, LoggingConfig, DEFAULT_FILTER};
