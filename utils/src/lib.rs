//! Shared utilities for the marketd daemon.

pub mod logging;

pub use logging::{init_logging, LogFormat, LogOutput, LoggingError};
