// Appends batches of entries to their per-day, per-level bucket files.

use crate::model::LogEntry;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// An entry sitting in the flush buffer, with the number of flushes that
/// already failed to write it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BufferedEntry {
  pub(crate) entry: LogEntry,
  pub(crate) failed_attempts: u32,
}

impl From<LogEntry> for BufferedEntry {
  fn from(entry: LogEntry) -> Self {
    Self {
      entry,
      failed_attempts: 0,
    }
  }
}

/// A bucket whose file could not be written, handed back with its entries.
#[derive(Debug)]
pub(crate) struct FailedBucket {
  pub(crate) path: PathBuf,
  pub(crate) error: io::Error,
  pub(crate) entries: Vec<BufferedEntry>,
}

/// What a single flush achieved.
#[derive(Debug, Default)]
pub(crate) struct FlushOutcome {
  pub(crate) written_entries: usize,
  pub(crate) failed: Vec<FailedBucket>,
}

pub(crate) struct BucketWriter {
  log_dir: PathBuf,
}

impl BucketWriter {
  pub(crate) fn new(log_dir: impl Into<PathBuf>) -> Self {
    Self {
      log_dir: log_dir.into(),
    }
  }

  pub(crate) fn path_for(&self, entry: &LogEntry) -> PathBuf {
    entry.bucket_path(&self.log_dir)
  }

  /// Partitions `entries` by destination file, keeping submission order
  /// inside every bucket.
  pub(crate) fn group(&self, entries: Vec<BufferedEntry>) -> BTreeMap<PathBuf, Vec<BufferedEntry>> {
    let mut buckets: BTreeMap<PathBuf, Vec<BufferedEntry>> = BTreeMap::new();
    for buffered in entries {
      let path = self.path_for(&buffered.entry);
      buckets.entry(path).or_default().push(buffered);
    }
    buckets
  }

  /// Writes every bucket in one append each. A failing bucket does not stop
  /// the others; its entries come back in the outcome.
  pub(crate) fn flush(&self, entries: Vec<BufferedEntry>) -> FlushOutcome {
    let mut outcome = FlushOutcome::default();
    for (path, bucket) in self.group(entries) {
      match append_bucket(&path, &bucket) {
        Ok(()) => {
          outcome.written_entries += bucket.len();
        }
        Err(error) => outcome.failed.push(FailedBucket {
          path,
          error,
          entries: bucket,
        }),
      }
    }
    outcome
  }
}

fn append_bucket(path: &Path, bucket: &[BufferedEntry]) -> io::Result<()> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)?;
  }

  let mut payload = String::with_capacity(bucket.iter().map(|b| b.entry.message.len() + 1).sum());
  for buffered in bucket {
    payload.push_str(&buffered.entry.message);
    payload.push('\n');
  }

  let mut file = OpenOptions::new().create(true).append(true).open(path)?;
  file.write_all(payload.as_bytes())?;
  file.flush()
}
