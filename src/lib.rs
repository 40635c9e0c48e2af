//! # Async Logger System
//!
//! A high-throughput, structured logging pipeline for server applications.
//! Producers enqueue records without blocking (unless they opt into
//! blocking back-pressure); batching workers enrich, mask, and format the
//! records and deliver them to a reconfigurable set of sinks with per-sink
//! retry and error accounting.
//!
//! ## Features
//!
//! - **Bounded ingestion**: non-blocking enqueue with an optional
//!   drop-oldest replacement policy; overload shows up as a dropped counter,
//!   never as producer latency
//! - **Batching workers**: size- and time-bounded batches, FIFO per worker
//! - **Masking**: regex rules plus field-name rules for structured messages
//! - **Hooks**: user extension functions with panic isolation, optional
//!   per-invocation timeout, and an async runner pool
//! - **Multi-sink output**: primary/error routing by severity, rotation
//!   sink, extra sinks, retry with backoff and jitter
//! - **Runtime reconfiguration**: severity, rules, batching, sinks, time
//!   zone, and format mode change without stopping producers

pub mod core;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        BatchConfig, Config, ContextLogger, FieldValue, Fields, HookConfig, HookFailure,
        HookFailureKind, HookFn, HookResult, LogContext, LogEvent, Logger, LoggerError,
        Result, RetryPolicy, RotationConfig, Severity, StatsSnapshot, TelemetrySpan,
        DEFAULT_SHUTDOWN_TIMEOUT,
    };
    pub use crate::sinks::{MemorySink, RotatingFileSink, Sink, SinkHandle, WriterSink};
}

pub use crate::core::{
    apply_masking, close_global, compile_patterns, global, init, init_with_config, reinit,
    BatchConfig, Config, ContextLogger, DynamicSnapshot, FieldRule, FieldValue, Fields,
    Formatter, HookConfig, HookFailure, HookFailureKind, HookFn, HookResult, JsonFormatter,
    LogContext, LogEvent, LogRecord, Logger, LoggerError, RegexRule, Result, RetryPolicy,
    RotationConfig, Severity, StatsSnapshot, TelemetrySpan, TextFormatter,
    DEFAULT_SHUTDOWN_TIMEOUT, FATAL_SHUTDOWN_TIMEOUT,
};
pub use crate::sinks::{MemorySink, RotatingFileSink, Sink, SinkHandle, SinkSet, WriterSink};
