// The public handle: submission API and lifecycle of the flush worker.

use crate::{
  config::LoggerConfig,
  engine::FlushEngine,
  error::{Error, Result},
  error_handling::{alert, status, ErrorReporter, InternalErrorReport, InternalErrorSource},
  model::{LogEntry, DEFAULT_LEVEL},
  stats::{LoggerStats, StatsCounters},
  InternalErrorReceiver,
};
use chrono::{DateTime, Local};
use crossbeam_channel::Sender;
use fibre::mpsc;
use parking_lot::Mutex;
use std::{
  fs,
  io::{self, Write},
  sync::{
    atomic::{AtomicBool, AtomicU8, Ordering},
    Arc,
  },
  thread::{self, JoinHandle},
};

const ERROR_CHANNEL_CAPACITY: usize = 256;
const WORKER_THREAD_NAME: &str = "batch-logging-flush";

/// Lifecycle of an [`AsyncLogger`]. There is no way back to `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LoggerState {
  Running = 0,
  Stopping = 1,
  Stopped = 2,
}

impl LoggerState {
  fn from_u8(value: u8) -> Self {
    match value {
      0 => LoggerState::Running,
      1 => LoggerState::Stopping,
      _ => LoggerState::Stopped,
    }
  }
}

/// Asynchronous batched log writer.
///
/// Producers call [`log`](Self::log) from any thread; a single background
/// worker buffers the entries and appends them to
/// `{log_dir}/{YYYY}/{MM}/{DD}_{level}.log` once `buffer_size` entries are
/// buffered or `time_interval` has passed since the last flush.
///
/// Share it between request handlers as an `Arc<AsyncLogger>`. Call
/// [`stop`](Self::stop) once at shutdown; dropping the last handle stops the
/// logger as well.
#[must_use = "Dropping the AsyncLogger stops it immediately"]
pub struct AsyncLogger {
  config: LoggerConfig,
  sender: Sender<LogEntry>,
  stop_signal: Arc<AtomicBool>,
  state: AtomicU8,
  worker: Mutex<Option<JoinHandle<()>>>,
  reporter: ErrorReporter,
  error_rx: Mutex<Option<InternalErrorReceiver>>,
  stats: Arc<StatsCounters>,
}

impl AsyncLogger {
  /// Creates the log directory and starts the flush worker.
  pub fn new(config: LoggerConfig) -> Result<Self> {
    config.validate()?;

    fs::create_dir_all(&config.log_dir).map_err(|source| Error::LogDirCreate {
      path: config.log_dir.clone(),
      source,
    })?;

    let (error_tx, error_rx) = if config.error_reporting_enabled {
      let (tx, rx) = mpsc::bounded::<InternalErrorReport>(ERROR_CHANNEL_CAPACITY);
      (Some(tx), Some(rx))
    } else {
      (None, None)
    };
    let reporter = ErrorReporter::new(error_tx);

    let (sender, receiver) = crossbeam_channel::unbounded::<LogEntry>();
    let stop_signal = Arc::new(AtomicBool::new(false));
    let stats = Arc::new(StatsCounters::default());

    let engine = FlushEngine::new(
      &config,
      receiver,
      Arc::clone(&stop_signal),
      reporter.clone(),
      Arc::clone(&stats),
    );
    let worker = thread::Builder::new()
      .name(WORKER_THREAD_NAME.to_string())
      .spawn(move || engine.run())
      .map_err(Error::WorkerSpawn)?;

    Ok(Self {
      config,
      sender,
      stop_signal,
      state: AtomicU8::new(LoggerState::Running as u8),
      worker: Mutex::new(Some(worker)),
      reporter,
      error_rx: Mutex::new(error_rx),
      stats,
    })
  }

  /// Submits `message` with the given severity. When `echo` is set the
  /// formatted line is also printed to stdout before it is queued. Line breaks
  /// inside `message` are escaped so every entry stays on one line.
  ///
  /// Never blocks on disk I/O and never fails; problems are reported on the
  /// internal error channel (or stderr).
  pub fn log(&self, message: impl AsRef<str>, level: u32, echo: bool) {
    self.log_at(message, level, echo, Local::now());
  }

  /// `log(message, 1, true)`.
  pub fn log_default(&self, message: impl AsRef<str>) {
    self.log(message, DEFAULT_LEVEL, true);
  }

  /// Like [`log`](Self::log) with an explicit submission timestamp, which
  /// also decides the destination bucket.
  pub fn log_at(&self, message: impl AsRef<str>, level: u32, echo: bool, timestamp: DateTime<Local>) {
    let entry = LogEntry::new(message.as_ref(), level, timestamp);
    if echo {
      let mut stdout = io::stdout().lock();
      self.submit(entry, Some(&mut stdout));
    } else {
      self.submit(entry, None);
    }
  }

  fn submit(&self, entry: LogEntry, echo_to: Option<&mut dyn Write>) {
    if let Some(out) = echo_to {
      let _ = writeln!(out, "{}", entry.message);
    }

    if self.state() != LoggerState::Running {
      self.reject(entry, "logger is no longer running");
      return;
    }

    self.stats.record_submitted();
    if let Err(err) = self.sender.send(entry) {
      self.reject(err.into_inner(), "flush worker has exited");
    }
  }

  /// Signals the worker, waits until it has drained the queue and written the
  /// final flush, then returns. Only the first call does any work.
  pub fn stop(&self) -> Result<()> {
    let handle = self.worker.lock().take().ok_or(Error::AlreadyStopped)?;

    status(format_args!("[batch_logging] Signaling flush worker to stop..."));
    self
      .state
      .store(LoggerState::Stopping as u8, Ordering::Release);
    self.stop_signal.store(true, Ordering::Release);

    let joined = handle.join();
    self
      .state
      .store(LoggerState::Stopped as u8, Ordering::Release);

    match joined {
      Ok(()) => {
        status(format_args!("[batch_logging] Logger stopped."));
        Ok(())
      }
      Err(panic) => {
        alert(format_args!(
          "[batch_logging:ERROR] Flush worker panicked during shutdown: {:?}",
          panic
        ));
        Err(Error::WorkerPanicked)
      }
    }
  }

  pub fn state(&self) -> LoggerState {
    LoggerState::from_u8(self.state.load(Ordering::Acquire))
  }

  pub fn config(&self) -> &LoggerConfig {
    &self.config
  }

  pub fn stats(&self) -> LoggerStats {
    self.stats.snapshot()
  }

  /// Entries submitted but not yet picked up by the worker.
  pub fn queued(&self) -> usize {
    self.sender.len()
  }

  /// Hands out the receiver for internal error reports. Returns `None` when
  /// error reporting is disabled or the receiver was already taken.
  pub fn take_error_receiver(&self) -> Option<InternalErrorReceiver> {
    self.error_rx.lock().take()
  }

  fn reject(&self, entry: LogEntry, reason: &str) {
    self.reporter.report(InternalErrorReport::with_message(
      InternalErrorSource::SubmitAfterStop,
      reason,
      Some(entry.message),
    ));
  }
}

impl Drop for AsyncLogger {
  fn drop(&mut self) {
    if self.worker.get_mut().is_none() {
      return;
    }
    if let Err(e) = self.stop() {
      alert(format_args!(
        "[batch_logging:ERROR] Failed to stop logger on drop: {}",
        e
      ));
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;
  use pretty_assertions::assert_eq;
  use std::time::Duration;
  use tempfile::tempdir;

  /// Captures echoed output and how many entries had been queued when the
  /// first byte arrived.
  struct RecordingEcho<'a> {
    logger: &'a AsyncLogger,
    out: Vec<u8>,
    submitted_when_written: Option<u64>,
  }

  impl Write for RecordingEcho<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
      if self.submitted_when_written.is_none() {
        self.submitted_when_written = Some(self.logger.stats().entries_submitted);
      }
      self.out.extend_from_slice(buf);
      Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
      Ok(())
    }
  }

  fn quick_config(dir: &std::path::Path) -> LoggerConfig {
    LoggerConfig::default()
      .with_log_dir(dir)
      .with_poll_interval(Duration::from_millis(20))
  }

  #[test]
  fn new_creates_the_log_directory() {
    let dir = tempdir().unwrap();
    let log_dir = dir.path().join("nested/logs");
    let logger = AsyncLogger::new(quick_config(&log_dir)).unwrap();
    assert!(log_dir.is_dir());
    assert_eq!(logger.state(), LoggerState::Running);
    logger.stop().unwrap();
  }

  #[test]
  fn new_rejects_invalid_config() {
    let dir = tempdir().unwrap();
    let result = AsyncLogger::new(quick_config(dir.path()).with_buffer_size(0));
    assert!(matches!(result, Err(Error::InvalidConfigValue { .. })));
  }

  #[test]
  fn new_fails_when_log_dir_cannot_be_created() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("occupied");
    fs::write(&file, b"file, not dir").unwrap();
    let result = AsyncLogger::new(quick_config(&file.join("logs")));
    assert!(matches!(result, Err(Error::LogDirCreate { .. })));
  }

  #[test]
  fn state_moves_to_stopped_and_second_stop_is_rejected() {
    let dir = tempdir().unwrap();
    let logger = AsyncLogger::new(quick_config(dir.path())).unwrap();
    logger.stop().unwrap();
    assert_eq!(logger.state(), LoggerState::Stopped);
    assert!(matches!(logger.stop(), Err(Error::AlreadyStopped)));
  }

  #[test]
  fn submissions_after_stop_are_reported_not_queued() {
    let dir = tempdir().unwrap();
    let logger = AsyncLogger::new(quick_config(dir.path()).with_error_reporting(true)).unwrap();
    let errors = logger.take_error_receiver().expect("error reporting enabled");
    assert!(logger.take_error_receiver().is_none());

    logger.stop().unwrap();
    logger.log("too late", 1, false);

    let report = errors.try_recv().unwrap();
    assert_eq!(report.source, InternalErrorSource::SubmitAfterStop);
    assert!(report.context.unwrap().ends_with("too late"));
    assert_eq!(logger.stats().entries_submitted, 0);
  }

  #[test]
  fn error_receiver_is_absent_by_default() {
    let dir = tempdir().unwrap();
    let logger = AsyncLogger::new(quick_config(dir.path())).unwrap();
    assert!(logger.take_error_receiver().is_none());
  }

  #[test]
  fn echo_is_written_before_the_entry_is_queued() {
    let dir = tempdir().unwrap();
    let logger = AsyncLogger::new(quick_config(dir.path())).unwrap();
    let ts = Local.with_ymd_and_hms(2024, 3, 9, 8, 15, 0).unwrap();
    let entry = LogEntry::new("camera 3 online", 2, ts);
    let bucket = entry.bucket_path(dir.path());
    let expected = format!("{}\n", entry.message);

    let mut echo = RecordingEcho {
      logger: &logger,
      out: Vec::new(),
      submitted_when_written: None,
    };
    logger.submit(entry, Some(&mut echo));
    assert_eq!(echo.submitted_when_written, Some(0));
    assert_eq!(String::from_utf8(echo.out).unwrap(), expected);
    assert_eq!(logger.stats().entries_submitted, 1);

    logger.stop().unwrap();
    assert_eq!(fs::read_to_string(bucket).unwrap(), expected);
  }

  #[test]
  fn echo_still_happens_for_a_rejected_entry() {
    let dir = tempdir().unwrap();
    let logger = AsyncLogger::new(quick_config(dir.path())).unwrap();
    logger.stop().unwrap();

    let entry = LogEntry::new("after hours", 1, Local::now());
    let expected = format!("{}\n", entry.message);
    let mut echo = RecordingEcho {
      logger: &logger,
      out: Vec::new(),
      submitted_when_written: None,
    };
    logger.submit(entry, Some(&mut echo));
    assert_eq!(String::from_utf8(echo.out).unwrap(), expected);
    assert_eq!(logger.stats().entries_submitted, 0);
  }

  #[test]
  fn log_default_uses_level_one() {
    let dir = tempdir().unwrap();
    let logger = AsyncLogger::new(quick_config(dir.path())).unwrap();
    let bucket = LogEntry::new("", DEFAULT_LEVEL, Local::now()).bucket_path(dir.path());

    logger.log_default("gateway started");
    logger.stop().unwrap();

    assert!(bucket.to_string_lossy().ends_with("_1.log"));
    let content = fs::read_to_string(bucket).unwrap();
    assert!(content.trim_end().ends_with("[1] gateway started"), "{}", content);
    assert_eq!(logger.stats().entries_written, 1);
  }
}
