use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the `batch_logging` library.
#[derive(Debug, Error)]
pub enum Error {
  #[error("Configuration file not found: {0}")]
  ConfigNotFound(String),

  #[error("Failed to read configuration file: {0}")]
  ConfigRead(#[from] std::io::Error),

  #[error("Failed to parse configuration: {0}")]
  ConfigParse(String),

  #[error("Invalid configuration value for '{field}': {message}")]
  InvalidConfigValue { field: String, message: String },

  #[error("Failed to create log directory {path:?}: {source}")]
  LogDirCreate {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to spawn the flush worker thread: {0}")]
  WorkerSpawn(std::io::Error),

  #[error("Logger has already been stopped")]
  AlreadyStopped,

  #[error("Flush worker panicked before finishing its final flush")]
  WorkerPanicked,

  #[error("Failed to set global tracing subscriber: {0}")]
  SubscriberSet(String),
}

/// A specialized `Result` type for `batch_logging` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
