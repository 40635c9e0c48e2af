//! Pooled log record

use super::context::{FieldValue, Fields, LogContext};
use super::severity::Severity;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Internal record flowing through the ingestion queue.
///
/// Records are owned by exactly one stage at a time and are recycled through
/// the record pool. The message template is rendered in the batching worker,
/// not at the producer call site.
#[derive(Debug)]
pub struct LogRecord {
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    pub context: Option<Arc<LogContext>>,
    pub template: String,
    pub args: Vec<FieldValue>,
    pub fields: Option<Fields>,
}

impl LogRecord {
    pub(crate) fn empty() -> Self {
        Self {
            severity: Severity::Info,
            timestamp: Utc::now(),
            context: None,
            template: String::new(),
            args: Vec::new(),
            fields: None,
        }
    }

    /// Populate a recycled record. The capture timestamp is taken here, at
    /// enqueue time.
    pub(crate) fn fill(
        &mut self,
        severity: Severity,
        context: Arc<LogContext>,
        template: String,
        args: Vec<FieldValue>,
        fields: Option<Fields>,
    ) {
        self.severity = severity;
        self.timestamp = Utc::now();
        self.context = Some(context);
        self.template = template;
        self.args = args;
        self.fields = fields;
    }

    /// Clear every reference-holding field before the record re-enters the
    /// pool, so producer-owned data is not kept alive by the logger.
    pub(crate) fn reset(&mut self) {
        self.context = None;
        self.template.clear();
        self.args.clear();
        self.fields = None;
    }

    /// Substitute template arguments.
    ///
    /// Each `{}` placeholder consumes the next argument; placeholders beyond
    /// the argument list stay literal, surplus arguments are ignored.
    pub fn render_message(&self) -> String {
        if self.args.is_empty() || !self.template.contains("{}") {
            return self.template.clone();
        }
        let mut out = String::with_capacity(self.template.len() + self.args.len() * 8);
        let mut rest = self.template.as_str();
        let mut args = self.args.iter();
        while let Some(idx) = rest.find("{}") {
            out.push_str(&rest[..idx]);
            match args.next() {
                Some(arg) => out.push_str(&arg.to_string()),
                None => out.push_str("{}"),
            }
            rest = &rest[idx + 2..];
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with(template: &str, args: Vec<FieldValue>) -> LogRecord {
        let mut rec = LogRecord::empty();
        rec.fill(
            Severity::Info,
            Arc::new(LogContext::new()),
            template.to_string(),
            args,
            None,
        );
        rec
    }

    #[test]
    fn test_render_plain() {
        let rec = record_with("no placeholders", vec![]);
        assert_eq!(rec.render_message(), "no placeholders");
    }

    #[test]
    fn test_render_substitution() {
        let rec = record_with(
            "user {} did {} in {}ms",
            vec![
                FieldValue::from("alice"),
                FieldValue::from("login"),
                FieldValue::from(12_i64),
            ],
        );
        assert_eq!(rec.render_message(), "user alice did login in 12ms");
    }

    #[test]
    fn test_render_surplus_placeholders() {
        let rec = record_with("a {} b {}", vec![FieldValue::from(1_i64)]);
        assert_eq!(rec.render_message(), "a 1 b {}");
    }

    #[test]
    fn test_render_surplus_args() {
        let rec = record_with(
            "only {}",
            vec![FieldValue::from(1_i64), FieldValue::from(2_i64)],
        );
        assert_eq!(rec.render_message(), "only 1");
    }

    #[test]
    fn test_reset_clears_references() {
        let mut rec = record_with("x {}", vec![FieldValue::from(1_i64)]);
        rec.fields = Some(Fields::new());
        rec.reset();
        assert!(rec.context.is_none());
        assert!(rec.template.is_empty());
        assert!(rec.args.is_empty());
        assert!(rec.fields.is_none());
    }
}
