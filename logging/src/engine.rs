// The flush worker: drains the ingestion queue into a buffer and writes the
// buffer out when it is large enough or old enough.

use crate::{
  config::LoggerConfig,
  error_handling::{ErrorReporter, InternalErrorReport, InternalErrorSource},
  model::LogEntry,
  stats::{FlushReason, StatsCounters},
  writer::{BucketWriter, BufferedEntry, FailedBucket},
};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub(crate) struct FlushEngine {
  receiver: Receiver<LogEntry>,
  stop_signal: Arc<AtomicBool>,
  writer: BucketWriter,
  reporter: ErrorReporter,
  stats: Arc<StatsCounters>,

  buffer: Vec<BufferedEntry>,
  last_flush: Instant,

  /// Entries of buckets whose last write failed. They do not count toward the
  /// size trigger and are only written by time and shutdown flushes.
  retry: Vec<BufferedEntry>,
  /// When the oldest pending failure happened.
  retry_since: Option<Instant>,

  buffer_size: usize,
  time_interval: Duration,
  poll_interval: Duration,
  max_write_attempts: u32,
}

impl FlushEngine {
  pub(crate) fn new(
    config: &LoggerConfig,
    receiver: Receiver<LogEntry>,
    stop_signal: Arc<AtomicBool>,
    reporter: ErrorReporter,
    stats: Arc<StatsCounters>,
  ) -> Self {
    Self {
      receiver,
      stop_signal,
      writer: BucketWriter::new(config.log_dir.clone()),
      reporter,
      stats,
      buffer: Vec::with_capacity(config.buffer_size),
      last_flush: Instant::now(),
      retry: Vec::new(),
      retry_since: None,
      buffer_size: config.buffer_size,
      time_interval: config.time_interval,
      poll_interval: config.poll_interval,
      max_write_attempts: config.max_write_attempts,
    }
  }

  /// Runs until the stop signal is set, then sweeps whatever is still queued
  /// into the buffer and flushes it.
  pub(crate) fn run(mut self) {
    while !self.stop_signal.load(Ordering::Acquire) {
      match self.receiver.recv_timeout(self.poll_interval) {
        Ok(entry) => self.buffer.push(entry.into()),
        // An empty queue still has to reach the time trigger below.
        Err(RecvTimeoutError::Timeout) => {}
        Err(RecvTimeoutError::Disconnected) => break,
      }

      if let Some(reason) = self.flush_reason(Instant::now()) {
        self.flush(reason);
      }
    }

    // Producers that passed the running check before the signal may still be
    // sending; take everything that has landed so far.
    self.buffer.extend(self.receiver.try_iter().map(BufferedEntry::from));
    self.flush(FlushReason::Shutdown);
  }

  /// Evaluates both triggers. The time trigger never fires on an empty buffer
  /// and only counts pending retries once they have waited a full interval.
  fn flush_reason(&self, now: Instant) -> Option<FlushReason> {
    if self.buffer.len() >= self.buffer_size {
      return Some(FlushReason::Size);
    }
    if !self.buffer.is_empty() && now.duration_since(self.last_flush) >= self.time_interval {
      return Some(FlushReason::Time);
    }
    if self.retry_due(now) {
      return Some(FlushReason::Time);
    }
    None
  }

  fn retry_due(&self, now: Instant) -> bool {
    match self.retry_since {
      Some(since) => now.duration_since(since) >= self.time_interval,
      None => false,
    }
  }

  fn flush(&mut self, reason: FlushReason) {
    if self.buffer.is_empty() && (reason == FlushReason::Size || self.retry.is_empty()) {
      return;
    }

    // Take the whole buffer and reset the timer before touching the disk.
    // Entries of failed buckets are parked in `retry` afterwards.
    let mut batch = std::mem::take(&mut self.buffer);
    let started = Instant::now();
    self.last_flush = started;

    if reason == FlushReason::Size {
      // A parked bucket stays parked until its retry is due; newer entries
      // for it wait behind the older ones so the file keeps submission order.
      self.park_entries_of_pending_buckets(&mut batch);
      if batch.is_empty() {
        return;
      }
    } else if !self.retry.is_empty() {
      let mut merged = std::mem::take(&mut self.retry);
      merged.append(&mut batch);
      batch = merged;
      self.retry_since = None;
    }

    let outcome = self.writer.flush(batch);
    self
      .stats
      .record_flush(reason, outcome.written_entries, outcome.failed.len());

    for failed in outcome.failed {
      self.handle_failed_bucket(failed, reason, started);
    }
  }

  fn park_entries_of_pending_buckets(&mut self, batch: &mut Vec<BufferedEntry>) {
    if self.retry.is_empty() {
      return;
    }
    let pending: BTreeSet<PathBuf> = self
      .retry
      .iter()
      .map(|buffered| self.writer.path_for(&buffered.entry))
      .collect();
    let (held, ready): (Vec<_>, Vec<_>) = std::mem::take(batch)
      .into_iter()
      .partition(|buffered| pending.contains(&self.writer.path_for(&buffered.entry)));
    self.retry.extend(held);
    *batch = ready;
  }

  fn handle_failed_bucket(&mut self, failed: FailedBucket, reason: FlushReason, failed_at: Instant) {
    let FailedBucket {
      path,
      error,
      entries,
    } = failed;

    self.reporter.report(InternalErrorReport::new(
      InternalErrorSource::BucketWrite { path: path.clone() },
      error,
      Some(format!("{} entries", entries.len())),
    ));

    let mut exhausted = 0usize;
    for mut buffered in entries {
      buffered.failed_attempts += 1;
      if reason != FlushReason::Shutdown && buffered.failed_attempts < self.max_write_attempts {
        self.retry.push(buffered);
        self.retry_since.get_or_insert(failed_at);
      } else {
        exhausted += 1;
      }
    }

    if exhausted > 0 {
      self.stats.record_dropped(exhausted);
      self.reporter.report(InternalErrorReport::with_message(
        InternalErrorSource::EntriesDropped {
          path,
          count: exhausted,
        },
        "giving up on entries that could not be written",
        Some(format!("max_write_attempts = {}", self.max_write_attempts)),
      ));
    }
  }
}
