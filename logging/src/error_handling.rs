use fibre::{error::TrySendError, mpsc::BoundedSender};
use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;

/// Where inside the logger an internal failure happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalErrorSource {
  /// Creating the bucket directory or appending to the bucket file failed.
  BucketWrite { path: PathBuf },
  /// A bucket kept failing and its entries were discarded.
  EntriesDropped { path: PathBuf, count: usize },
  /// `log` was called after shutdown had begun.
  SubmitAfterStop,
}

impl fmt::Display for InternalErrorSource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      InternalErrorSource::BucketWrite { path } => {
        write!(f, "BucketWrite {{ path: {:?} }}", path)
      }
      InternalErrorSource::EntriesDropped { path, count } => {
        write!(f, "EntriesDropped {{ path: {:?}, count: {} }}", path, count)
      }
      InternalErrorSource::SubmitAfterStop => write!(f, "SubmitAfterStop"),
    }
  }
}

#[derive(Debug)]
pub struct InternalErrorReport {
  pub source: InternalErrorSource,
  pub error_message: String,
  pub context: Option<String>,
  pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl InternalErrorReport {
  pub(crate) fn new<E: std::error::Error + 'static>(
    source: InternalErrorSource,
    error: E,
    context: Option<String>,
  ) -> Self {
    Self::with_message(source, error.to_string(), context)
  }

  pub(crate) fn with_message(
    source: InternalErrorSource,
    error_message: impl Into<String>,
    context: Option<String>,
  ) -> Self {
    Self {
      source,
      error_message: error_message.into(),
      context,
      timestamp: chrono::Utc::now(),
    }
  }
}

/// Delivers internal error reports to the application, or to stderr when no
/// channel was requested.
#[derive(Clone)]
pub(crate) struct ErrorReporter {
  tx: Option<BoundedSender<InternalErrorReport>>,
}

impl ErrorReporter {
  pub(crate) fn new(tx: Option<BoundedSender<InternalErrorReport>>) -> Self {
    Self { tx }
  }

  pub(crate) fn report(&self, report: InternalErrorReport) {
    let Some(tx) = &self.tx else {
      print_report(&report);
      return;
    };

    match tx.try_send(report) {
      Ok(()) => {}
      Err(TrySendError::Full(report)) => {
        alert(format_args!(
          "[batch_logging:ERROR] Internal error channel full. Dropping error report."
        ));
        print_report(&report);
      }
      Err(err) => print_report(&err.into_inner()),
    }
  }
}

fn print_report(report: &InternalErrorReport) {
  match &report.context {
    Some(context) => alert(format_args!(
      "[batch_logging:ERROR] {}: {} ({})",
      report.source, report.error_message, context
    )),
    None => alert(format_args!(
      "[batch_logging:ERROR] {}: {}",
      report.source, report.error_message
    )),
  }
}

/// Writes one diagnostic line. Write errors are ignored, so a closed stdout or
/// stderr never panics.
pub(crate) fn write_line(out: &mut impl Write, args: fmt::Arguments<'_>) {
  let _ = writeln!(out, "{}", args);
}

pub(crate) fn status(args: fmt::Arguments<'_>) {
  write_line(&mut io::stdout().lock(), args);
}

pub(crate) fn alert(args: fmt::Arguments<'_>) {
  write_line(&mut io::stderr().lock(), args);
}
