//! Built-in event formatters
//!
//! A [`Formatter`] maps an enriched event to the bytes written to sinks.
//! Two built-ins: a line-oriented text format and a structured
//! object-per-line format. A custom formatter supplied through the
//! configuration overrides both.

use super::context::Fields;
use super::error::Result;
use super::event::LogEvent;
use chrono::SecondsFormat;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Pluggable event formatter.
pub trait Formatter: Send + Sync {
    /// Serialize an event to output bytes, including the trailing newline.
    fn format(&self, event: &LogEvent) -> Result<Vec<u8>>;

    fn name(&self) -> &str;
}

/// Line-oriented text formatter.
///
/// `"<RFC3339 millis> [<LEVEL>] (<module>) trace=<id> flow=<id> attrs=<map>
/// fields=<map> <message>\n"` with every meta segment omitted when empty.
#[derive(Debug, Default)]
pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format(&self, event: &LogEvent) -> Result<Vec<u8>> {
        let ts = event.time.to_rfc3339_opts(SecondsFormat::Millis, false);

        let mut meta = String::new();
        if !event.trace_id.is_empty() {
            let _ = write!(meta, " trace={}", event.trace_id);
        }
        if !event.flow_id.is_empty() {
            let _ = write!(meta, " flow={}", event.flow_id);
        }
        if !event.attrs.is_empty() {
            let _ = write!(meta, " attrs={}", format_string_map(&event.attrs));
        }
        if !event.fields.is_empty() {
            let _ = write!(meta, " fields={}", format_field_map(&event.fields));
        }

        let line = format!(
            "{} [{}] ({}){} {}\n",
            ts,
            event.severity.as_str(),
            event.module,
            meta,
            event.message
        );
        Ok(line.into_bytes())
    }

    fn name(&self) -> &str {
        "text"
    }
}

/// `{k=v k2=v2}` over sorted keys; stable within a run.
fn format_string_map(map: &BTreeMap<String, String>) -> String {
    let mut out = String::from("{");
    for (i, (k, v)) in map.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{}={}", k, v);
    }
    out.push('}');
    out
}

fn format_field_map(fields: &Fields) -> String {
    let mut out = String::from("{");
    for (i, (k, v)) in fields.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{}={}", k, v);
    }
    out.push('}');
    out
}

/// Structured object-per-line formatter.
///
/// Fixed key order `time, level, module, trace_id, flow_id, attrs, message,
/// fields`; empty keys omitted; no HTML-style escaping; one `\n` terminator.
#[derive(Debug, Default)]
pub struct JsonFormatter;

#[derive(Serialize)]
struct JsonEntry<'a> {
    time: String,
    level: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    module: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    trace_id: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    flow_id: &'a str,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    attrs: &'a BTreeMap<String, String>,
    message: &'a str,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    fields: &'a Fields,
}

impl Formatter for JsonFormatter {
    fn format(&self, event: &LogEvent) -> Result<Vec<u8>> {
        let entry = JsonEntry {
            time: event.time.to_rfc3339_opts(SecondsFormat::Micros, false),
            level: event.severity.as_str(),
            module: &event.module,
            trace_id: &event.trace_id,
            flow_id: &event.flow_id,
            attrs: &event.attrs,
            message: &event.message,
            fields: &event.fields,
        };
        let mut bytes = serde_json::to_vec(&entry)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    fn name(&self) -> &str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::FieldValue;
    use crate::core::severity::Severity;
    use chrono::TimeZone;
    use chrono_tz::Tz;

    fn sample_event() -> LogEvent {
        let tz: Tz = "UTC".parse().unwrap();
        LogEvent {
            time: tz.with_ymd_and_hms(2025, 3, 1, 12, 30, 45).unwrap(),
            severity: Severity::Info,
            module: "billing".to_string(),
            message: "charge ok".to_string(),
            trace_id: "t-1".to_string(),
            flow_id: String::new(),
            attrs: BTreeMap::from([("region".to_string(), "eu".to_string())]),
            fields: Fields::from([("amount".to_string(), FieldValue::Int(42))]),
            structured: false,
        }
    }

    #[test]
    fn test_text_format_line() {
        let bytes = TextFormatter.format(&sample_event()).unwrap();
        let line = String::from_utf8(bytes).unwrap();
        assert_eq!(
            line,
            "2025-03-01T12:30:45.000+00:00 [INFO] (billing) trace=t-1 attrs={region=eu} fields={amount=42} charge ok\n"
        );
    }

    #[test]
    fn test_text_format_omits_empty_meta() {
        let mut event = sample_event();
        event.trace_id.clear();
        event.attrs.clear();
        event.fields.clear();
        let line = String::from_utf8(TextFormatter.format(&event).unwrap()).unwrap();
        assert_eq!(line, "2025-03-01T12:30:45.000+00:00 [INFO] (billing) charge ok\n");
    }

    #[test]
    fn test_json_format_key_order() {
        let bytes = JsonFormatter.format(&sample_event()).unwrap();
        let line = String::from_utf8(bytes).unwrap();
        assert!(line.ends_with('\n'));

        let time_pos = line.find("\"time\"").unwrap();
        let level_pos = line.find("\"level\"").unwrap();
        let module_pos = line.find("\"module\"").unwrap();
        let trace_pos = line.find("\"trace_id\"").unwrap();
        let attrs_pos = line.find("\"attrs\"").unwrap();
        let message_pos = line.find("\"message\"").unwrap();
        let fields_pos = line.find("\"fields\"").unwrap();
        assert!(time_pos < level_pos);
        assert!(level_pos < module_pos);
        assert!(module_pos < trace_pos);
        assert!(trace_pos < attrs_pos);
        assert!(attrs_pos < message_pos);
        assert!(message_pos < fields_pos);
        // flow_id is empty, so it is omitted entirely.
        assert!(!line.contains("flow_id"));
    }

    #[test]
    fn test_json_format_no_html_escape() {
        let mut event = sample_event();
        event.message = "a<b>&c".to_string();
        let line = String::from_utf8(JsonFormatter.format(&event).unwrap()).unwrap();
        assert!(line.contains("a<b>&c"));
    }

    #[test]
    fn test_json_message_always_present() {
        let mut event = sample_event();
        event.message.clear();
        let line = String::from_utf8(JsonFormatter.format(&event).unwrap()).unwrap();
        assert!(line.contains("\"message\":\"\""));
    }
}
