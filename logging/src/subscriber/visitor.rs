// src/subscriber/visitor.rs
use tracing::field::{Field, Visit};

/// Collects an event's `message` field and renders the remaining fields as
/// `key=value` pairs.
#[derive(Default)]
pub(crate) struct MessageVisitor {
  message: Option<String>,
  fields: Vec<(&'static str, String)>,
}

impl MessageVisitor {
  fn record_value(&mut self, field: &Field, value: String) {
    if field.name() == "message" && self.message.is_none() {
      self.message = Some(value);
    } else {
      self.fields.push((field.name(), value));
    }
  }

  /// `<target>: <message> key=value ...`
  pub(crate) fn render(self, target: &str) -> String {
    let mut line = format!("{}:", target);
    if let Some(message) = self.message {
      line.push(' ');
      line.push_str(&message);
    }
    for (name, value) in self.fields {
      line.push(' ');
      line.push_str(name);
      line.push('=');
      line.push_str(&value);
    }
    line
  }
}

impl Visit for MessageVisitor {
  fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
    self.record_value(field, format!("{:?}", value));
  }

  fn record_str(&mut self, field: &Field, value: &str) {
    self.record_value(field, value.to_string());
  }

  fn record_i64(&mut self, field: &Field, value: i64) {
    self.record_value(field, value.to_string());
  }

  fn record_u64(&mut self, field: &Field, value: u64) {
    self.record_value(field, value.to_string());
  }

  fn record_f64(&mut self, field: &Field, value: f64) {
    self.record_value(field, value.to_string());
  }

  fn record_bool(&mut self, field: &Field, value: bool) {
    self.record_value(field, value.to_string());
  }
}
