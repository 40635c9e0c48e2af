//! Runtime-mutable configuration registry
//!
//! Publishes tunables to the pipeline stages without stopping producers.
//! Hot-path scalars (minimum severity, batch size, batch wait, structured
//! flag, telemetry flag) are mirrored into atomics for lock-free reads;
//! list-valued tunables live in a read-favoring lock and are snapshotted by
//! the cold path.

use super::config::{BatchConfig, RetryPolicy};
use super::error::{LoggerError, Result};
use super::masking::{FieldRule, RegexRule};
use super::severity::Severity;
use chrono_tz::Tz;
use parking_lot::{RwLock, RwLockReadGuard};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::time::Duration;

/// Lock-guarded portion of the dynamic configuration.
#[derive(Debug, Clone)]
pub struct DynamicSnapshot {
    pub min_severity: Severity,
    pub regex_rules: Vec<RegexRule>,
    pub field_rules: Vec<FieldRule>,
    pub retry: RetryPolicy,
    pub batch: BatchConfig,
}

pub(crate) struct DynamicConfig {
    snapshot: RwLock<DynamicSnapshot>,
    min_severity: AtomicU8,
    batch_size: AtomicUsize,
    batch_wait_nanos: AtomicU64,
    structured: AtomicBool,
    telemetry: AtomicBool,
    timezone: RwLock<Tz>,
}

impl DynamicConfig {
    pub fn new(initial: DynamicSnapshot, structured: bool, telemetry: bool, tz: Tz) -> Self {
        Self {
            min_severity: AtomicU8::new(initial.min_severity as u8),
            batch_size: AtomicUsize::new(initial.batch.size),
            batch_wait_nanos: AtomicU64::new(initial.batch.max_wait.as_nanos() as u64),
            structured: AtomicBool::new(structured),
            telemetry: AtomicBool::new(telemetry),
            timezone: RwLock::new(tz),
            snapshot: RwLock::new(initial),
        }
    }

    // Hot-path reads

    #[inline]
    pub fn min_severity(&self) -> Severity {
        Severity::from_u8(self.min_severity.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn batch_size(&self) -> usize {
        self.batch_size.load(Ordering::Relaxed).max(1)
    }

    #[inline]
    pub fn batch_wait(&self) -> Duration {
        Duration::from_nanos(self.batch_wait_nanos.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn structured(&self) -> bool {
        self.structured.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn telemetry(&self) -> bool {
        self.telemetry.load(Ordering::Relaxed)
    }

    pub fn timezone(&self) -> Tz {
        *self.timezone.read()
    }

    // Cold-path reads

    /// Short read-lock over the list-valued tunables; callers must not hold
    /// the guard across I/O.
    pub fn read(&self) -> RwLockReadGuard<'_, DynamicSnapshot> {
        self.snapshot.read()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.snapshot.read().retry
    }

    pub fn cloned_snapshot(&self) -> DynamicSnapshot {
        self.snapshot.read().clone()
    }

    // Updates; each publishes a fully-formed value

    pub fn set_min_severity(&self, severity: Severity) {
        self.snapshot.write().min_severity = severity;
        self.min_severity.store(severity as u8, Ordering::Relaxed);
    }

    pub fn set_regex_rules(&self, rules: Vec<RegexRule>) {
        self.snapshot.write().regex_rules = rules;
    }

    pub fn set_field_rules(&self, rules: Vec<FieldRule>) {
        self.snapshot.write().field_rules = rules;
    }

    pub fn set_retry_policy(&self, retry: RetryPolicy) {
        self.snapshot.write().retry = retry;
    }

    pub fn set_batch(&self, mut batch: BatchConfig) {
        if batch.size == 0 {
            batch.size = 1;
        }
        if batch.max_wait.is_zero() {
            batch.max_wait = Duration::from_secs(1);
        }
        self.snapshot.write().batch = batch;
        self.batch_size.store(batch.size, Ordering::Relaxed);
        self.batch_wait_nanos
            .store(batch.max_wait.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Replace the time zone. Invalid names fail and leave the current zone
    /// unchanged.
    pub fn set_timezone(&self, name: &str) -> Result<()> {
        let tz: Tz = name
            .parse()
            .map_err(|_| LoggerError::timezone(name))?;
        *self.timezone.write() = tz;
        Ok(())
    }

    pub fn set_structured(&self, structured: bool) {
        self.structured.store(structured, Ordering::Relaxed);
    }

    pub fn set_telemetry(&self, telemetry: bool) {
        self.telemetry.store(telemetry, Ordering::Relaxed);
    }

    /// Restore the lock-guarded snapshot and its atomic mirrors from a
    /// provided initial value.
    pub fn reset(&self, initial: DynamicSnapshot) {
        let mut guard = self.snapshot.write();
        self.min_severity
            .store(initial.min_severity as u8, Ordering::Relaxed);
        self.batch_size.store(initial.batch.size, Ordering::Relaxed);
        self.batch_wait_nanos
            .store(initial.batch.max_wait.as_nanos() as u64, Ordering::Relaxed);
        *guard = initial;
    }
}
