// src/subscriber/layer.rs

use crate::{
  error::{Error, Result},
  error_handling::status,
  subscriber::visitor::MessageVisitor,
  AsyncLogger,
};
use std::sync::Arc;
use tracing::{Event, Level, Subscriber};
use tracing_core::{LevelFilter, Metadata};
use tracing_subscriber::{
  layer::{Context, Layer},
  prelude::*,
};

/// Maps a `tracing` level onto the integer severity used for file buckets.
pub fn level_for(level: &Level) -> u32 {
  match *level {
    Level::ERROR => 4,
    Level::WARN => 3,
    Level::INFO => 2,
    Level::DEBUG => 1,
    Level::TRACE => 0,
  }
}

/// A `tracing_subscriber` layer that submits every event to an [`AsyncLogger`].
pub struct BatchLogLayer {
  logger: Arc<AsyncLogger>,
  echo: bool,
  max_level: LevelFilter,
}

impl BatchLogLayer {
  pub fn new(logger: Arc<AsyncLogger>) -> Self {
    Self {
      logger,
      echo: false,
      max_level: LevelFilter::TRACE,
    }
  }

  /// Only forward events at or above this severity.
  pub fn with_max_level(mut self, max_level: impl Into<LevelFilter>) -> Self {
    self.max_level = max_level.into();
    self
  }

  /// Also print forwarded events to stdout.
  pub fn with_echo(mut self, echo: bool) -> Self {
    self.echo = echo;
    self
  }
}

impl<S> Layer<S> for BatchLogLayer
where
  S: Subscriber,
{
  fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
    *metadata.level() <= self.max_level
  }

  fn max_level_hint(&self) -> Option<LevelFilter> {
    Some(self.max_level)
  }

  fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
    let metadata = event.metadata();
    let mut visitor = MessageVisitor::default();
    event.record(&mut visitor);

    self.logger.log(
      visitor.render(metadata.target()),
      level_for(metadata.level()),
      self.echo,
    );
  }
}

/// Installs a registry with a [`BatchLogLayer`] as the global default subscriber.
pub fn init_global_subscriber(logger: Arc<AsyncLogger>) -> Result<()> {
  let subscriber = tracing_subscriber::registry().with(BatchLogLayer::new(logger));
  tracing::subscriber::set_global_default(subscriber)
    .map_err(|e| Error::SubscriberSet(e.to_string()))?;
  status(format_args!("[batch_logging] Global tracing subscriber set."));
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::LoggerConfig;
  use chrono::{Datelike, Local};
  use pretty_assertions::assert_eq;
  use std::{fs, time::Duration};
  use tempfile::tempdir;

  #[test]
  fn levels_map_from_most_to_least_severe() {
    assert_eq!(level_for(&Level::ERROR), 4);
    assert_eq!(level_for(&Level::WARN), 3);
    assert_eq!(level_for(&Level::INFO), 2);
    assert_eq!(level_for(&Level::DEBUG), 1);
    assert_eq!(level_for(&Level::TRACE), 0);
  }

  #[test]
  fn events_are_forwarded_into_level_buckets() {
    let dir = tempdir().unwrap();
    let logger = Arc::new(
      AsyncLogger::new(
        LoggerConfig::default()
          .with_log_dir(dir.path())
          .with_poll_interval(Duration::from_millis(20)),
      )
      .unwrap(),
    );

    let subscriber = tracing_subscriber::registry().with(BatchLogLayer::new(Arc::clone(&logger)));
    tracing::subscriber::with_default(subscriber, || {
      tracing::warn!(target: "camwatch::alarms", camera = 7, "motion detected");
      tracing::info!(target: "camwatch::http", "GET /health");
    });

    logger.stop().unwrap();

    let today = Local::now();
    let day_dir = dir
      .path()
      .join(format!("{:04}", today.year()))
      .join(format!("{:02}", today.month()));
    let warn_file = day_dir.join(format!("{:02}_3.log", today.day()));
    let info_file = day_dir.join(format!("{:02}_2.log", today.day()));

    let warn = fs::read_to_string(warn_file).unwrap();
    assert!(
      warn.trim_end().ends_with("[3] camwatch::alarms: motion detected camera=7"),
      "unexpected line: {}",
      warn
    );
    let info = fs::read_to_string(info_file).unwrap();
    assert!(info.trim_end().ends_with("[2] camwatch::http: GET /health"));
  }

  #[test]
  fn events_below_the_max_level_are_not_forwarded() {
    let dir = tempdir().unwrap();
    let logger = Arc::new(
      AsyncLogger::new(
        LoggerConfig::default()
          .with_log_dir(dir.path())
          .with_poll_interval(Duration::from_millis(20)),
      )
      .unwrap(),
    );

    let layer = BatchLogLayer::new(Arc::clone(&logger)).with_max_level(Level::INFO);
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, || {
      tracing::debug!(target: "camwatch::decoder", "frame 4411 decoded");
      tracing::info!(target: "camwatch::decoder", "stream opened");
    });

    logger.stop().unwrap();

    let stats = logger.stats();
    assert_eq!(stats.entries_submitted, 1);
    let today = Local::now();
    let debug_file = dir
      .path()
      .join(format!("{:04}", today.year()))
      .join(format!("{:02}", today.month()))
      .join(format!("{:02}_1.log", today.day()));
    assert!(!debug_file.exists());
  }
}
