//! `batch_logging` - an asynchronous, batched log writer.
//!
//! Producers hand formatted lines to an [`AsyncLogger`] from any thread. A
//! single background worker buffers them and appends them to per-day,
//! per-level files (`{log_dir}/{YYYY}/{MM}/{DD}_{level}.log`) whenever the
//! buffer reaches `buffer_size` entries or `time_interval` has elapsed since
//! the last flush. [`AsyncLogger::stop`] drains everything still queued before
//! it returns.
//!
//! ```no_run
//! use batch_logging::{request_line, AsyncLogger, LoggerConfig};
//! use std::sync::Arc;
//!
//! let logger = Arc::new(AsyncLogger::new(LoggerConfig::default().with_log_dir("logs"))?);
//! logger.log(request_line("10.0.0.4", "GET", "/v1/cameras", 200), 1, false);
//! logger.stop()?;
//! # Ok::<(), batch_logging::Error>(())
//! ```

pub mod config;
mod engine;
pub mod error;
pub mod error_handling;
pub mod init;
mod logger;
pub mod model;
mod stats;
pub mod subscriber;
mod writer;

// Re-export key public types for easier use by library consumers.
pub use config::LoggerConfig;
pub use error::{Error, Result};
pub use error_handling::{InternalErrorReport, InternalErrorSource};
pub use logger::{AsyncLogger, LoggerState};
pub use model::{request_line, LogEntry, DEFAULT_LEVEL};
pub use stats::LoggerStats;
pub use subscriber::{init_global_subscriber, BatchLogLayer};

pub use init::{find_config_file, init_from_file, load_config};

/// Receiver for internal error reports, see [`AsyncLogger::take_error_receiver`].
pub type InternalErrorReceiver = fibre::mpsc::BoundedReceiver<InternalErrorReport>;
