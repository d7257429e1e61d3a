use std::sync::atomic::{AtomicU64, Ordering};

/// Why the flush worker wrote its buffer out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FlushReason {
  Size,
  Time,
  Shutdown,
}

/// Counters shared between the logger handle and its flush worker.
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
  entries_submitted: AtomicU64,
  entries_written: AtomicU64,
  entries_dropped: AtomicU64,
  size_flushes: AtomicU64,
  time_flushes: AtomicU64,
  shutdown_flushes: AtomicU64,
  failed_bucket_writes: AtomicU64,
}

impl StatsCounters {
  pub(crate) fn record_submitted(&self) {
    self.entries_submitted.fetch_add(1, Ordering::Relaxed);
  }

  pub(crate) fn record_flush(&self, reason: FlushReason, written: usize, failed_buckets: usize) {
    let counter = match reason {
      FlushReason::Size => &self.size_flushes,
      FlushReason::Time => &self.time_flushes,
      FlushReason::Shutdown => &self.shutdown_flushes,
    };
    counter.fetch_add(1, Ordering::Relaxed);
    self
      .entries_written
      .fetch_add(written as u64, Ordering::Relaxed);
    self
      .failed_bucket_writes
      .fetch_add(failed_buckets as u64, Ordering::Relaxed);
  }

  pub(crate) fn record_dropped(&self, count: usize) {
    self
      .entries_dropped
      .fetch_add(count as u64, Ordering::Relaxed);
  }

  pub(crate) fn snapshot(&self) -> LoggerStats {
    LoggerStats {
      entries_submitted: self.entries_submitted.load(Ordering::Relaxed),
      entries_written: self.entries_written.load(Ordering::Relaxed),
      entries_dropped: self.entries_dropped.load(Ordering::Relaxed),
      size_flushes: self.size_flushes.load(Ordering::Relaxed),
      time_flushes: self.time_flushes.load(Ordering::Relaxed),
      shutdown_flushes: self.shutdown_flushes.load(Ordering::Relaxed),
      failed_bucket_writes: self.failed_bucket_writes.load(Ordering::Relaxed),
    }
  }
}

/// A point-in-time copy of the logger's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoggerStats {
  pub entries_submitted: u64,
  pub entries_written: u64,
  /// Entries discarded after exhausting their write attempts.
  pub entries_dropped: u64,
  pub size_flushes: u64,
  pub time_flushes: u64,
  /// Final flushes performed while stopping (at most one per logger).
  pub shutdown_flushes: u64,
  pub failed_bucket_writes: u64,
}

impl LoggerStats {
  /// Flushes that actually wrote a non-empty buffer.
  pub fn total_flushes(&self) -> u64 {
    self.size_flushes + self.time_flushes + self.shutdown_flushes
  }
}
