//! Enriched log event

use super::context::Fields;
use super::severity::Severity;
use chrono::DateTime;
use chrono_tz::Tz;
use std::collections::BTreeMap;

/// Immutable, fully-materialized description of one log occurrence.
///
/// Built by the batching worker after masking, and consumed by formatters
/// and hooks. The timestamp is already converted to the configured time
/// zone; `fields` is the merge of context fields and per-record fields with
/// the record winning on duplicate keys.
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub time: DateTime<Tz>,
    pub severity: Severity,
    pub module: String,
    pub message: String,
    pub trace_id: String,
    pub flow_id: String,
    pub attrs: BTreeMap<String, String>,
    pub fields: Fields,
    pub structured: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_event_is_plain_value() {
        let time = Utc
            .with_ymd_and_hms(2025, 3, 1, 12, 0, 0)
            .unwrap()
            .with_timezone(&chrono_tz::UTC);
        let event = LogEvent {
            time,
            severity: Severity::Error,
            module: "api".to_string(),
            message: "boom".to_string(),
            trace_id: "t".to_string(),
            flow_id: String::new(),
            attrs: BTreeMap::new(),
            fields: Fields::new(),
            structured: false,
        };
        let copy = event.clone();
        assert_eq!(copy.message, "boom");
        assert_eq!(copy.severity, Severity::Error);
    }
}
