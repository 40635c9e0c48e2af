//! Producer-side context for structured logging
//!
//! A [`LogContext`] carries the metadata a producer wants attached to every
//! record it emits: module name, correlation IDs, string attributes, and
//! typed fields. Contexts are shared with the pipeline behind an `Arc`; the
//! batching worker reads them lazily when it materializes events.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Value type for structured logging fields
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Null => write!(f, "null"),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<u32> for FieldValue {
    fn from(i: u32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<usize> for FieldValue {
    fn from(i: usize) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

/// Ordered key-value fields attached to a record or context.
///
/// A `BTreeMap` keeps the formatted representation stable within a run.
pub type Fields = BTreeMap<String, FieldValue>;

/// Ambient telemetry span contract.
///
/// When telemetry integration is enabled, the worker takes the trace ID from
/// the span carried by the context and attaches the span ID as a `span_id`
/// attribute. Extraction from a live tracing library happens outside this
/// crate; callers hand over the resolved IDs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetrySpan {
    pub trace_id: String,
    pub span_id: String,
}

impl TelemetrySpan {
    pub fn new(trace_id: impl Into<String>, span_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            span_id: span_id.into(),
        }
    }
}

/// Immutable producer context read lazily by the batching worker.
#[derive(Debug, Clone, Default)]
pub struct LogContext {
    module: String,
    trace_id: Option<String>,
    flow_id: Option<String>,
    attrs: BTreeMap<String, String>,
    fields: Fields,
    span: Option<TelemetrySpan>,
}

impl LogContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the module name
    #[must_use]
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    /// Set or override the trace ID
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Set the flow ID
    #[must_use]
    pub fn with_flow_id(mut self, flow_id: impl Into<String>) -> Self {
        self.flow_id = Some(flow_id.into());
        self
    }

    /// Add a single string attribute; duplicate keys are overwritten
    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Merge a set of string attributes; duplicate keys are overwritten
    #[must_use]
    pub fn with_attrs<I, K, V>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in attrs {
            self.attrs.insert(k.into(), v.into());
        }
        self
    }

    /// Add a typed field; duplicate keys are overwritten
    #[must_use]
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Attach a telemetry span to the context
    #[must_use]
    pub fn with_telemetry_span(mut self, span: TelemetrySpan) -> Self {
        self.span = Some(span);
        self
    }

    /// Ensure the context carries a trace ID, generating a UUIDv4 if absent.
    #[must_use]
    pub fn ensure_trace_id(mut self) -> Self {
        if self.trace_id.as_deref().map_or(true, str::is_empty) {
            self.trace_id = Some(uuid::Uuid::new_v4().to_string());
        }
        self
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    pub fn flow_id(&self) -> Option<&str> {
        self.flow_id.as_deref()
    }

    pub fn attrs(&self) -> &BTreeMap<String, String> {
        &self.attrs
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn telemetry_span(&self) -> Option<&TelemetrySpan> {
        self.span.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_builders() {
        let ctx = LogContext::new()
            .with_module("billing")
            .with_trace_id("t-1")
            .with_flow_id("f-1")
            .with_attr("region", "eu-west-1")
            .with_field("user_id", 42);

        assert_eq!(ctx.module(), "billing");
        assert_eq!(ctx.trace_id(), Some("t-1"));
        assert_eq!(ctx.flow_id(), Some("f-1"));
        assert_eq!(ctx.attrs().get("region").map(String::as_str), Some("eu-west-1"));
        assert_eq!(ctx.fields().len(), 1);
    }

    #[test]
    fn test_ensure_trace_id_generates_uuid() {
        let ctx = LogContext::new().ensure_trace_id();
        let id = ctx.trace_id().unwrap();
        assert_eq!(id.len(), 36);
        assert_eq!(id.matches('-').count(), 4);

        // An existing trace ID is left untouched.
        let ctx = LogContext::new().with_trace_id("keep-me").ensure_trace_id();
        assert_eq!(ctx.trace_id(), Some("keep-me"));
    }

    #[test]
    fn test_attr_overwrite() {
        let ctx = LogContext::new()
            .with_attr("k", "old")
            .with_attrs([("k", "new"), ("j", "x")]);
        assert_eq!(ctx.attrs().get("k").map(String::as_str), Some("new"));
        assert_eq!(ctx.attrs().len(), 2);
    }

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::from("s").to_string(), "s");
        assert_eq!(FieldValue::from(7_i64).to_string(), "7");
        assert_eq!(FieldValue::from(true).to_string(), "true");
        assert_eq!(FieldValue::Null.to_string(), "null");
    }
}
