// src/config/processed.rs
use crate::config::raw::{DurationRaw, LoggerConfigRaw};
use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Validated settings for an [`AsyncLogger`](crate::AsyncLogger).
#[derive(Debug, Clone, PartialEq)]
pub struct LoggerConfig {
  /// Root of the `{YYYY}/{MM}/{DD}_{level}.log` tree.
  pub log_dir: PathBuf,
  /// Buffered entry count that triggers a flush.
  pub buffer_size: usize,
  /// Maximum time a non-empty buffer waits before it is flushed.
  pub time_interval: Duration,
  /// Queue wait timeout of the flush worker. Bounds how quickly the worker
  /// notices the stop flag and the time trigger.
  pub poll_interval: Duration,
  /// How many flushes may fail for a bucket before its entries are dropped.
  pub max_write_attempts: u32,
  /// When set, the logger hands back a receiver for `InternalErrorReport`s.
  pub error_reporting_enabled: bool,
}

impl Default for LoggerConfig {
  fn default() -> Self {
    Self {
      log_dir: PathBuf::from("logs"),
      buffer_size: 10,
      time_interval: Duration::from_secs(5),
      poll_interval: Duration::from_secs(1),
      max_write_attempts: 3,
      error_reporting_enabled: false,
    }
  }
}

impl LoggerConfig {
  pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
    self.log_dir = log_dir.into();
    self
  }

  pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
    self.buffer_size = buffer_size;
    self
  }

  pub fn with_time_interval(mut self, time_interval: Duration) -> Self {
    self.time_interval = time_interval;
    self
  }

  pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
    self.poll_interval = poll_interval;
    self
  }

  pub fn with_max_write_attempts(mut self, max_write_attempts: u32) -> Self {
    self.max_write_attempts = max_write_attempts;
    self
  }

  pub fn with_error_reporting(mut self, enabled: bool) -> Self {
    self.error_reporting_enabled = enabled;
    self
  }

  /// Checks the invariants the flush worker relies on.
  pub fn validate(&self) -> Result<()> {
    if self.log_dir.as_os_str().is_empty() {
      return Err(invalid("log_dir", "Log directory cannot be empty."));
    }
    if self.buffer_size == 0 {
      return Err(invalid("buffer_size", "buffer_size must be at least 1."));
    }
    if self.poll_interval.is_zero() {
      return Err(invalid("poll_interval", "poll_interval must be greater than zero."));
    }
    if self.max_write_attempts == 0 {
      return Err(invalid(
        "max_write_attempts",
        "max_write_attempts must be at least 1.",
      ));
    }
    Ok(())
  }
}

/// Processes the raw, deserialized configuration into a validated `LoggerConfig`.
pub fn process_raw_config(raw_config: LoggerConfigRaw) -> Result<LoggerConfig> {
  let config = LoggerConfig {
    log_dir: PathBuf::from(raw_config.log_dir),
    buffer_size: raw_config.buffer_size,
    time_interval: parse_duration(&raw_config.time_interval, "time_interval")?,
    poll_interval: parse_duration(&raw_config.poll_interval, "poll_interval")?,
    max_write_attempts: raw_config.max_write_attempts,
    error_reporting_enabled: raw_config.internal_error_reporting.enabled,
  };
  config.validate()?;
  Ok(config)
}

fn parse_duration(raw: &DurationRaw, field: &str) -> Result<Duration> {
  match raw {
    DurationRaw::Seconds(secs) => {
      Duration::try_from_secs_f64(*secs).map_err(|e| Error::InvalidConfigValue {
        field: field.to_string(),
        message: format!("Invalid number of seconds '{}': {}", secs, e),
      })
    }
    DurationRaw::Human(text) => humantime::parse_duration(text.trim()).map_err(|e| {
      Error::InvalidConfigValue {
        field: field.to_string(),
        message: format!(
          "Invalid duration '{}': {}. Expected e.g. '5s', '500ms' or a number of seconds.",
          text, e
        ),
      }
    }),
  }
}

fn invalid(field: &str, message: &str) -> Error {
  Error::InvalidConfigValue {
    field: field.to_string(),
    message: message.to_string(),
  }
}
