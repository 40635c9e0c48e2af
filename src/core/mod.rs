//! Core pipeline types and stages

pub mod config;
pub mod context;
pub mod dynamic;
pub mod error;
pub mod event;
pub mod formatter;
pub mod global;
pub mod hooks;
pub mod logger;
pub mod masking;
mod pipeline;
mod pool;
pub mod record;
pub mod severity;
pub mod stats;
mod writer;

pub use config::{BatchConfig, Config, HookConfig, RetryPolicy, RotationConfig};
pub use context::{FieldValue, Fields, LogContext, TelemetrySpan};
pub use dynamic::DynamicSnapshot;
pub use error::{LoggerError, Result};
pub use event::LogEvent;
pub use formatter::{Formatter, JsonFormatter, TextFormatter};
pub use global::{close_global, global, init, init_with_config, reinit};
pub use hooks::{HookFailure, HookFailureKind, HookFn, HookResult};
pub use logger::{ContextLogger, Logger, DEFAULT_SHUTDOWN_TIMEOUT, FATAL_SHUTDOWN_TIMEOUT};
pub use masking::{apply_masking, compile_patterns, FieldRule, RegexRule};
pub use record::LogRecord;
pub use severity::Severity;
pub use stats::{PipelineStats, StatsSnapshot};
