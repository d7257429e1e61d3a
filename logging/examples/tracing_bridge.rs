// examples/tracing_bridge.rs
//
// Routes `tracing` events into an AsyncLogger. Each tracing level ends up in
// its own bucket file (ERROR = 4 ... TRACE = 0).

use batch_logging::{init_global_subscriber, AsyncLogger, LoggerConfig};
use std::sync::Arc;
use std::time::Duration;

fn main() -> batch_logging::Result<()> {
  let logger = Arc::new(AsyncLogger::new(
    LoggerConfig::default()
      .with_log_dir("logs/tracing")
      .with_time_interval(Duration::from_secs(1)),
  )?);
  init_global_subscriber(Arc::clone(&logger))?;

  tracing::info!(target: "camwatch::startup", port = 8000, "server listening");
  tracing::warn!(target: "camwatch::alarms", camera = 3, "motion detected in zone B");
  tracing::error!(target: "camwatch::storage", "failed to persist snapshot");
  tracing::debug!(target: "camwatch::ws", clients = 2, "pushed system metrics");

  logger.stop()?;
  println!("Check the 'logs/tracing' directory.");
  Ok(())
}
