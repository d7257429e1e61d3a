// examples/request_logging.rs
//
// Simulates the HTTP middleware of the camera backend: several handler
// threads log one access line per request while the flush worker batches
// them into logs/example/{YYYY}/{MM}/{DD}_{level}.log.

use batch_logging::{request_line, AsyncLogger};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> batch_logging::Result<()> {
  let config_path = Path::new(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/examples/batch_logging.yaml"
  ));
  let logger = Arc::new(batch_logging::init_from_file(config_path)?);
  let errors = logger.take_error_receiver();

  println!("\n--- Logging 3 entries slowly (time trigger after ~2s) ---");
  for i in 0..3 {
    logger.log_default(format!("Event #{}", i));
    thread::sleep(Duration::from_millis(100));
  }
  thread::sleep(Duration::from_millis(2500));

  println!("\n--- Handler threads logging requests (size trigger) ---");
  let routes = ["/v1/cameras", "/v1/tags", "/v1/users/me", "/health"];
  let handles: Vec<_> = (0..4)
    .map(|worker| {
      let logger: Arc<AsyncLogger> = Arc::clone(&logger);
      thread::spawn(move || {
        for (i, route) in routes.iter().enumerate() {
          let status = if i == 3 && worker == 2 { 500 } else { 200 };
          let level = if status >= 500 { 3 } else { 1 };
          let line = request_line(&format!("192.168.1.{}", 10 + worker), "GET", route, status);
          logger.log(line, level, false);
        }
      })
    })
    .collect();
  for handle in handles {
    handle.join().expect("handler thread panicked");
  }

  println!("\n--- Two last entries, then stop ---");
  logger.log_default("Final event 1");
  logger.log_default("Final event 2");
  logger.stop()?;

  let stats = logger.stats();
  println!(
    "Submitted {} entries, wrote {} in {} flushes ({} size, {} time, {} shutdown).",
    stats.entries_submitted,
    stats.entries_written,
    stats.total_flushes(),
    stats.size_flushes,
    stats.time_flushes,
    stats.shutdown_flushes
  );

  if let Some(errors) = errors {
    while let Ok(report) = errors.try_recv() {
      println!("Internal error: {} - {}", report.source, report.error_message);
    }
  }
  println!("Check the 'logs/example' directory.");
  Ok(())
}
