/// `tracing` subscriber setup with log file rotation.
pub mod setup;

pub use setup::{setup_logging, LoggingError, LoggingGuard, LoggingOptions};
