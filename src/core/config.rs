//! Logger configuration
//!
//! The full configuration surface accepted at construction time. Values of
//! zero are clamped to safe defaults by [`Config::clamped`], matching the
//! documented defaults: buffer 1024, one worker, batch size 1, batch wait
//! one second, one hook worker, hook queue 1024, failure ring 1000.

use super::formatter::Formatter;
use super::hooks::HookFn;
use super::masking::{FieldRule, RegexRule};
use super::severity::Severity;
use crate::sinks::SinkHandle;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Retry discipline for sink writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first failed write
    pub max_retries: u32,
    /// Base delay between attempts
    pub backoff: Duration,
    /// Upper bound of the uniform random jitter added to each delay
    pub jitter: Duration,
    /// Double the delay on every retry when set
    pub exponential: bool,
}

/// Batch coalescing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Flush once a batch holds this many records
    pub size: usize,
    /// Flush once a batch has waited this long
    pub max_wait: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            size: 1,
            max_wait: Duration::from_secs(1),
        }
    }
}

/// Hook execution parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookConfig {
    /// Run hooks on a dedicated worker pool instead of the batching worker
    pub run_async: bool,
    /// Number of hook runner threads in async mode
    pub workers: usize,
    /// Bounded hook queue capacity in async mode
    pub queue: usize,
    /// Per-invocation wall-clock timeout; `None` runs hooks to completion
    pub timeout: Option<Duration>,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            run_async: false,
            workers: 1,
            queue: 1024,
            timeout: None,
        }
    }
}

/// Rotation sink parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationConfig {
    pub enabled: bool,
    pub filename: String,
    pub max_size_mb: u64,
    pub max_age_days: u32,
    pub max_backups: usize,
    pub compress: bool,
}

/// Full logger configuration.
pub struct Config {
    pub min_severity: Severity,
    /// IANA time zone name; invalid names fall back to UTC at startup
    pub timezone: String,
    /// Emit the structured object-per-line format instead of text lines
    pub structured: bool,
    /// Ingestion queue capacity
    pub buffer: usize,
    /// Number of batching worker threads
    pub workers: usize,
    /// Never block producers; saturated queues drop instead
    pub non_blocking: bool,
    /// In non-blocking mode, evict the oldest queued record to make room
    pub drop_oldest: bool,
    pub batch: BatchConfig,
    /// Primary non-error sink; stdout when unset
    pub primary: Option<SinkHandle>,
    /// Primary error sink; stderr when unset
    pub error: Option<SinkHandle>,
    /// Additional sinks that receive every record
    pub extras: Vec<SinkHandle>,
    pub retry: RetryPolicy,
    pub hooks: Vec<HookFn>,
    pub hook: HookConfig,
    pub regex_rules: Vec<RegexRule>,
    /// Pattern-to-replacement map compiled at startup; invalid patterns are
    /// skipped with a diagnostic
    pub regex_patterns: HashMap<String, String>,
    pub field_rules: Vec<FieldRule>,
    pub rotation: RotationConfig,
    /// Take trace IDs from ambient telemetry spans when present
    pub telemetry: bool,
    /// Custom formatter; overrides both built-in formats
    pub formatter: Option<Arc<dyn Formatter>>,
    /// Capacity of the bounded hook-failure ring
    pub hook_failure_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_severity: Severity::Info,
            timezone: "UTC".to_string(),
            structured: false,
            buffer: 1024,
            workers: 1,
            non_blocking: false,
            drop_oldest: false,
            batch: BatchConfig::default(),
            primary: None,
            error: None,
            extras: Vec::new(),
            retry: RetryPolicy::default(),
            hooks: Vec::new(),
            hook: HookConfig::default(),
            regex_rules: Vec::new(),
            regex_patterns: HashMap::new(),
            field_rules: Vec::new(),
            rotation: RotationConfig::default(),
            telemetry: false,
            formatter: None,
            hook_failure_capacity: 1000,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply defaults to zero-valued tunables.
    pub(crate) fn clamped(mut self) -> Self {
        if self.buffer == 0 {
            self.buffer = 1024;
        }
        if self.workers == 0 {
            self.workers = 1;
        }
        if self.batch.size == 0 {
            self.batch.size = 1;
        }
        if self.batch.max_wait.is_zero() {
            self.batch.max_wait = Duration::from_secs(1);
        }
        if self.hook.workers == 0 {
            self.hook.workers = 1;
        }
        if self.hook.queue == 0 {
            self.hook.queue = 1024;
        }
        if self.hook_failure_capacity == 0 {
            self.hook_failure_capacity = 1000;
        }
        self
    }
}
