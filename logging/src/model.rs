use chrono::{DateTime, Datelike, Local};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Severity level used when the caller does not pick one.
pub const DEFAULT_LEVEL: u32 = 1;

/// A single log line waiting in the queue or the flush buffer.
///
/// The line is formatted once, at submission. The timestamp is kept next to
/// it so that bucketing uses the submission day, not the flush day.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
  /// Fully formatted line, without a trailing newline.
  pub message: String,
  /// Wall-clock moment of submission.
  pub timestamp: DateTime<Local>,
  /// Severity, shown in the line and used for the file name.
  pub level: u32,
}

impl LogEntry {
  /// Builds an entry, formatting `message` as
  /// `[YYYY-MM-DD HH:MM:SS.mmm] [<level>] <message>`.
  ///
  /// Carriage returns and newlines in `message` are written as the two
  /// characters `\r` and `\n`, so one entry is always one line on disk.
  pub fn new(message: &str, level: u32, timestamp: DateTime<Local>) -> Self {
    let message = format!(
      "[{}] [{}] {}",
      timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
      level,
      escape_line_breaks(message)
    );
    Self {
      message,
      timestamp,
      level,
    }
  }

  /// Destination file of this entry: `{log_dir}/{YYYY}/{MM}/{DD}_{level}.log`.
  pub fn bucket_path(&self, log_dir: &Path) -> PathBuf {
    log_dir
      .join(format!("{:04}", self.timestamp.year()))
      .join(format!("{:02}", self.timestamp.month()))
      .join(format!("{:02}_{}.log", self.timestamp.day(), self.level))
  }
}

fn escape_line_breaks(message: &str) -> Cow<'_, str> {
  if !message.contains(['\r', '\n']) {
    return Cow::Borrowed(message);
  }
  Cow::Owned(message.replace('\r', "\\r").replace('\n', "\\n"))
}

/// Formats an access-log line the way the HTTP middleware submits it.
pub fn request_line(ip: &str, method: &str, url: &str, status: u16) -> String {
  format!(
    "IP: {} - Request: {} {} - Response: {}",
    ip, method, url, status
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;
  use pretty_assertions::assert_eq;

  fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32, ms: u32) -> DateTime<Local> {
    Local
      .with_ymd_and_hms(y, mo, d, h, mi, s)
      .unwrap()
      + chrono::Duration::milliseconds(ms as i64)
  }

  #[test]
  fn message_has_millisecond_timestamp_and_level() {
    let entry = LogEntry::new("camera 7 offline", 3, at(2024, 1, 2, 3, 4, 5, 123));
    assert_eq!(entry.message, "[2024-01-02 03:04:05.123] [3] camera 7 offline");
    assert_eq!(entry.level, 3);
  }

  #[test]
  fn zero_milliseconds_are_padded() {
    let entry = LogEntry::new("tick", 1, at(2024, 12, 31, 23, 59, 59, 0));
    assert_eq!(entry.message, "[2024-12-31 23:59:59.000] [1] tick");
  }

  #[test]
  fn line_breaks_in_the_message_are_escaped() {
    let entry = LogEntry::new("panic at frame 12\nbacktrace:\r\n  decode()", 4, at(2024, 6, 1, 0, 0, 0, 7));
    assert_eq!(
      entry.message,
      "[2024-06-01 00:00:00.007] [4] panic at frame 12\\nbacktrace:\\r\\n  decode()"
    );
    assert_eq!(entry.message.lines().count(), 1);
  }

  #[test]
  fn bucket_path_uses_date_and_level() {
    let entry = LogEntry::new("x", 2, at(2024, 3, 9, 12, 0, 0, 0));
    assert_eq!(
      entry.bucket_path(Path::new("logs")),
      PathBuf::from("logs/2024/03/09_2.log")
    );
  }

  #[test]
  fn request_line_matches_middleware_format() {
    assert_eq!(
      request_line("10.0.0.4", "GET", "http://cams.local/v1/cameras", 200),
      "IP: 10.0.0.4 - Request: GET http://cams.local/v1/cameras - Response: 200"
    );
  }
}
