//! Telemetry - logging set-up and result reporting

mod logging;
mod reporter;

pub use logging::{init_logging, level_for, DEFAULT_LOG_FILE};
pub use reporter::{LogReporter, Reporter};
