use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct InternalErrorReportingRaw {
  #[serde(default)] // Defaults to false if not present
  pub enabled: bool,
}

/// A duration as written in a config file: either a bare number of seconds
/// (`5`, `0.5`) or a human-readable string (`"5s"`, `"250ms"`).
#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(untagged)]
pub enum DurationRaw {
  Seconds(f64),
  Human(String),
}

// --- Top Level Config ---
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoggerConfigRaw {
  #[serde(default = "default_log_dir")]
  pub log_dir: String,
  /// Number of buffered entries that forces a flush.
  #[serde(default = "default_buffer_size")]
  pub buffer_size: usize,
  /// Maximum age of a non-empty buffer before it is flushed.
  #[serde(default = "default_time_interval")]
  pub time_interval: DurationRaw,
  /// How long the flush worker waits on the queue before re-checking its triggers.
  #[serde(default = "default_poll_interval")]
  pub poll_interval: DurationRaw,
  #[serde(default = "default_max_write_attempts")]
  pub max_write_attempts: u32,
  #[serde(default)]
  pub internal_error_reporting: InternalErrorReportingRaw,
}

fn default_log_dir() -> String {
  "logs".to_string()
}

fn default_buffer_size() -> usize {
  10
}

fn default_time_interval() -> DurationRaw {
  DurationRaw::Seconds(5.0)
}

fn default_poll_interval() -> DurationRaw {
  DurationRaw::Seconds(1.0)
}

fn default_max_write_attempts() -> u32 {
  3
}

impl Default for LoggerConfigRaw {
  fn default() -> Self {
    Self {
      log_dir: default_log_dir(),
      buffer_size: default_buffer_size(),
      time_interval: default_time_interval(),
      poll_interval: default_poll_interval(),
      max_write_attempts: default_max_write_attempts(),
      internal_error_reporting: Default::default(),
    }
  }
}
