//! Logger lifecycle and producer facade
//!
//! [`Logger`] owns the ingestion queue, the batching workers, the sink set,
//! the dynamic configuration registry, and the hook runtime. Producers log
//! through a [`ContextLogger`] bound to a producer context; reconfiguration
//! and shutdown happen through the `Logger` itself.

use super::config::{BatchConfig, Config, RetryPolicy, RotationConfig};
use super::context::{FieldValue, Fields, LogContext};
use super::dynamic::{DynamicConfig, DynamicSnapshot};
use super::error::{LoggerError, Result};
use super::formatter::{JsonFormatter, TextFormatter};
use super::hooks::{HookFailure, HookFn, HookRuntime};
use super::masking::{compile_patterns, FieldRule, RegexRule};
use super::pipeline::{worker_loop, PipelineShared};
use super::pool::{BatchPool, RecordPool};
use super::record::LogRecord;
use super::severity::Severity;
use super::stats::{PipelineStats, StatsSnapshot};
use super::writer::{close_all_sinks, close_sink};
use crate::sinks::{RotatingFileSink, SinkHandle, SinkSet, WriterSink};
use chrono_tz::Tz;
use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Shutdown timeout used when a logger is dropped without an explicit
/// [`Logger::close`].
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Shutdown budget applied when a FATAL record terminates the process.
pub const FATAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

pub struct Logger {
    shared: Arc<PipelineShared>,
    sender: Mutex<Option<Sender<Box<LogRecord>>>>,
    worker_handles: Mutex<Vec<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl Logger {
    /// Build and start a logger: clamp the configuration, compile mask
    /// patterns, initialize pools, spawn the batching workers, and start the
    /// hook runner pool when async hooks are configured.
    pub fn new(config: Config) -> Self {
        let config = config.clamped();

        let tz: Tz = config.timezone.parse().unwrap_or(chrono_tz::UTC);

        let mut regex_rules = config.regex_rules;
        regex_rules.extend(compile_patterns(
            config
                .regex_patterns
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        ));

        let initial = DynamicSnapshot {
            min_severity: config.min_severity,
            regex_rules,
            field_rules: config.field_rules,
            retry: config.retry,
            batch: config.batch,
        };
        let dynamic = DynamicConfig::new(initial, config.structured, config.telemetry, tz);

        let stats = Arc::new(PipelineStats::new());
        let hooks = Arc::new(HookRuntime::new(
            config.hooks,
            config.hook,
            Arc::clone(&stats),
            config.hook_failure_capacity,
        ));

        let primary = config
            .primary
            .unwrap_or_else(|| SinkHandle::new("stdout", Arc::new(WriterSink::stdout())));
        let error = config
            .error
            .unwrap_or_else(|| SinkHandle::new("stderr", Arc::new(WriterSink::stderr())));
        let rotation = if config.rotation.enabled {
            match RotatingFileSink::new(&config.rotation) {
                Ok(sink) => Some(SinkHandle::new("rotation", Arc::new(sink))),
                Err(err) => {
                    eprintln!("[logger] rotation sink unavailable: {}", err);
                    None
                }
            }
        } else {
            None
        };
        let mut sink_set = SinkSet {
            primary,
            error,
            rotation,
            extras: config.extras,
        };
        sink_set.name_extras();

        let (sender, receiver) = bounded(config.buffer);

        let shared = Arc::new(PipelineShared {
            receiver,
            sinks: RwLock::new(sink_set),
            dynamic,
            hooks: Arc::clone(&hooks),
            stats,
            record_pool: RecordPool::new(config.buffer.min(4096)),
            batch_pool: BatchPool::new(config.workers * 2),
            custom_formatter: config.formatter,
            text_formatter: TextFormatter,
            json_formatter: JsonFormatter,
            non_blocking: config.non_blocking,
            drop_oldest: config.drop_oldest,
        });

        let mut handles = Vec::with_capacity(config.workers);
        for _ in 0..config.workers {
            let shared = Arc::clone(&shared);
            handles.push(thread::spawn(move || worker_loop(shared)));
        }

        hooks.start();

        Self {
            shared,
            sender: Mutex::new(Some(sender)),
            worker_handles: Mutex::new(handles),
            closed: AtomicBool::new(false),
        }
    }

    /// Fast producer-side severity check.
    pub fn should_log(&self, severity: Severity) -> bool {
        severity >= self.shared.dynamic.min_severity()
    }

    /// Bind a producer context to this logger.
    pub fn with_context(&self, context: LogContext) -> ContextLogger<'_> {
        ContextLogger {
            logger: self,
            context: Arc::new(context),
        }
    }

    /// Record one log occurrence. The template is rendered later, in the
    /// batching worker.
    pub fn log(
        &self,
        context: &Arc<LogContext>,
        severity: Severity,
        template: impl Into<String>,
        args: Vec<FieldValue>,
    ) {
        self.log_with_fields(context, severity, template, args, None);
    }

    /// Like [`Logger::log`] with per-call structured fields; duplicate keys
    /// override context fields.
    pub fn log_with_fields(
        &self,
        context: &Arc<LogContext>,
        severity: Severity,
        template: impl Into<String>,
        args: Vec<FieldValue>,
        fields: Option<Fields>,
    ) {
        if !self.should_log(severity) {
            return;
        }
        let mut record = self.shared.record_pool.acquire();
        record.fill(severity, Arc::clone(context), template.into(), args, fields);
        self.enqueue(record);
    }

    /// Hand a record to the ingestion queue.
    ///
    /// Never fails visibly to the producer. Blocking mode waits for
    /// capacity; non-blocking mode drops (optionally evicting the oldest
    /// queued record first) and counts every drop exactly once. After
    /// shutdown has begun, records are silently returned to the pool.
    fn enqueue(&self, record: Box<LogRecord>) {
        if self.closed.load(Ordering::Acquire) {
            self.shared.record_pool.release(record);
            return;
        }
        // Clone the sender out of the lock so blocking sends do not hold it.
        let sender = match &*self.sender.lock() {
            Some(sender) => sender.clone(),
            None => {
                self.shared.record_pool.release(record);
                return;
            }
        };

        if self.shared.non_blocking {
            match sender.try_send(record) {
                Ok(()) => self.shared.stats.record_enqueued(),
                Err(TrySendError::Full(record)) => {
                    if self.shared.drop_oldest {
                        if let Ok(oldest) = self.shared.receiver.try_recv() {
                            self.shared.stats.record_dropped();
                            self.shared.record_pool.release(oldest);
                        }
                        // A concurrent producer may have taken the slot.
                        match sender.try_send(record) {
                            Ok(()) => self.shared.stats.record_enqueued(),
                            Err(TrySendError::Full(record))
                            | Err(TrySendError::Disconnected(record)) => {
                                self.shared.stats.record_dropped();
                                self.shared.record_pool.release(record);
                            }
                        }
                    } else {
                        self.shared.stats.record_dropped();
                        self.shared.record_pool.release(record);
                    }
                }
                Err(TrySendError::Disconnected(record)) => {
                    self.shared.record_pool.release(record);
                }
            }
        } else {
            match sender.send(record) {
                Ok(()) => self.shared.stats.record_enqueued(),
                Err(err) => self.shared.record_pool.release(err.into_inner()),
            }
        }
    }

    // ----- runtime reconfiguration -----

    pub fn set_min_severity(&self, severity: Severity) {
        self.shared.dynamic.set_min_severity(severity);
    }

    pub fn set_regex_rules(&self, rules: Vec<RegexRule>) {
        self.shared.dynamic.set_regex_rules(rules);
    }

    pub fn set_field_rules(&self, rules: Vec<FieldRule>) {
        self.shared.dynamic.set_field_rules(rules);
    }

    pub fn set_retry_policy(&self, retry: RetryPolicy) {
        self.shared.dynamic.set_retry_policy(retry);
    }

    /// Workers observe the new values on the next batch boundary.
    pub fn set_batch_config(&self, batch: BatchConfig) {
        self.shared.dynamic.set_batch(batch);
    }

    /// Replace the time zone.
    ///
    /// # Errors
    ///
    /// Invalid names fail with [`LoggerError::InvalidTimezone`] and leave
    /// the current zone unchanged.
    pub fn set_timezone(&self, name: &str) -> Result<()> {
        self.shared.dynamic.set_timezone(name)
    }

    pub fn set_structured(&self, structured: bool) {
        self.shared.dynamic.set_structured(structured);
    }

    pub fn set_telemetry(&self, telemetry: bool) {
        self.shared.dynamic.set_telemetry(telemetry);
    }

    /// Replace the hook list. With async hooks the runner pool is restarted,
    /// reopening the queue if a prior shutdown closed it.
    pub fn set_hooks(&self, hooks: Vec<HookFn>) {
        self.shared.hooks.replace_hooks(hooks);
    }

    /// Replace the primary non-error sink, closing the previous one.
    pub fn set_primary_sink(&self, handle: SinkHandle) {
        let old = {
            let mut sinks = self.shared.sinks.write();
            std::mem::replace(&mut sinks.primary, handle)
        };
        close_sink(&self.shared, &old);
    }

    /// Replace the primary error sink, closing the previous one.
    pub fn set_error_sink(&self, handle: SinkHandle) {
        let old = {
            let mut sinks = self.shared.sinks.write();
            std::mem::replace(&mut sinks.error, handle)
        };
        close_sink(&self.shared, &old);
    }

    /// Append an extra sink.
    pub fn add_extra_sink(&self, handle: SinkHandle) {
        let mut sinks = self.shared.sinks.write();
        sinks.extras.push(handle);
        sinks.name_extras();
    }

    /// Remove the extra sink with the given name, closing it. Returns
    /// whether a sink was removed.
    pub fn remove_extra_sink(&self, name: &str) -> bool {
        let removed = {
            let mut sinks = self.shared.sinks.write();
            match sinks.extras.iter().position(|s| s.name == name) {
                Some(idx) => Some(sinks.extras.remove(idx)),
                None => None,
            }
        };
        match removed {
            Some(handle) => {
                close_sink(&self.shared, &handle);
                true
            }
            None => false,
        }
    }

    /// Replace the whole extra sink list, closing the previous sinks.
    pub fn set_extra_sinks(&self, extras: Vec<SinkHandle>) {
        let old = {
            let mut sinks = self.shared.sinks.write();
            let old = std::mem::replace(&mut sinks.extras, extras);
            sinks.name_extras();
            old
        };
        for handle in &old {
            close_sink(&self.shared, handle);
        }
    }

    /// Install, replace, or remove the rotation sink. The previous rotation
    /// sink, if any, is closed and released.
    ///
    /// # Errors
    ///
    /// Fails when the rotation file cannot be opened; the previous sink is
    /// kept in that case.
    pub fn set_rotation(&self, config: &RotationConfig) -> Result<()> {
        let new_handle = if config.enabled && !config.filename.is_empty() {
            let sink = RotatingFileSink::new(config)?;
            Some(SinkHandle::new("rotation", Arc::new(sink)))
        } else {
            None
        };
        let old = {
            let mut sinks = self.shared.sinks.write();
            std::mem::replace(&mut sinks.rotation, new_handle)
        };
        if let Some(old) = old {
            close_sink(&self.shared, &old);
        }
        Ok(())
    }

    /// Copy of the current dynamic configuration.
    pub fn dynamic_snapshot(&self) -> DynamicSnapshot {
        self.shared.dynamic.cloned_snapshot()
    }

    /// Reset the dynamic configuration from a provided initial value.
    pub fn reset_dynamic(&self, initial: DynamicSnapshot) {
        self.shared.dynamic.reset(initial);
    }

    // ----- observation -----

    /// Point-in-time statistics snapshot.
    pub fn stats(&self) -> StatsSnapshot {
        let stats = &self.shared.stats;
        StatsSnapshot {
            enqueued: stats.enqueued(),
            written: stats.written(),
            dropped: stats.dropped(),
            batches: stats.batches(),
            write_errors: stats.write_errors(),
            hook_errors: stats.hook_errors(),
            queue_len: self.shared.receiver.len(),
            sink_errors: stats.sink_error_counts(),
        }
    }

    /// Copy of the bounded hook-failure ring, oldest first.
    pub fn hook_failures(&self) -> Vec<HookFailure> {
        self.shared.hooks.failures()
    }

    /// Whether the rotation sink is currently installed.
    pub fn has_rotation_sink(&self) -> bool {
        self.shared.sinks.read().rotation.is_some()
    }

    // ----- lifecycle -----

    /// Gracefully shut down: stop accepting records, drain the queue, stop
    /// the hook runner, close every sink, and emit the per-sink error
    /// summary.
    ///
    /// A zero timeout waits indefinitely. Repeated calls return `Ok(())`
    /// without side effects.
    ///
    /// # Errors
    ///
    /// [`LoggerError::ShutdownTimeout`] when the waiter misses the deadline.
    /// Workers and sinks still finish their last batch afterwards.
    pub fn close(&self, timeout: Duration) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        // Dropping the sender signals end-of-input to the workers.
        drop(self.sender.lock().take());

        let handles = std::mem::take(&mut *self.worker_handles.lock());
        let shared = Arc::clone(&self.shared);
        let (done_tx, done_rx) = bounded::<()>(1);
        thread::spawn(move || {
            for handle in handles {
                let _ = handle.join();
            }
            shared.hooks.shutdown();
            close_all_sinks(&shared);
            let _ = done_tx.send(());
        });

        let completed = if timeout.is_zero() {
            done_rx.recv().is_ok()
        } else {
            done_rx.recv_timeout(timeout).is_ok()
        };
        if !completed {
            return Err(LoggerError::ShutdownTimeout { waited: timeout });
        }

        if let Some(summary) = self.shared.stats.format_sink_errors() {
            eprintln!("{}", summary);
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if !self.is_closed() {
            let _ = self.close(DEFAULT_SHUTDOWN_TIMEOUT);
        }
    }
}

/// Producer facade binding a [`Logger`] to a producer context.
#[derive(Clone)]
pub struct ContextLogger<'a> {
    logger: &'a Logger,
    context: Arc<LogContext>,
}

impl<'a> ContextLogger<'a> {
    pub fn context(&self) -> &Arc<LogContext> {
        &self.context
    }

    pub fn log(&self, severity: Severity, template: impl Into<String>, args: Vec<FieldValue>) {
        self.logger.log(&self.context, severity, template, args);
    }

    pub fn log_with_fields(
        &self,
        severity: Severity,
        template: impl Into<String>,
        args: Vec<FieldValue>,
        fields: Fields,
    ) {
        self.logger
            .log_with_fields(&self.context, severity, template, args, Some(fields));
    }

    pub fn debug(&self, template: impl Into<String>, args: Vec<FieldValue>) {
        self.log(Severity::Debug, template, args);
    }

    pub fn info(&self, template: impl Into<String>, args: Vec<FieldValue>) {
        self.log(Severity::Info, template, args);
    }

    pub fn warn(&self, template: impl Into<String>, args: Vec<FieldValue>) {
        self.log(Severity::Warn, template, args);
    }

    pub fn error(&self, template: impl Into<String>, args: Vec<FieldValue>) {
        self.log(Severity::Error, template, args);
    }

    /// Emit a FATAL record, close the logger within a two-second budget, and
    /// terminate the process with a non-zero status.
    ///
    /// Tests that need FATAL records without process termination should call
    /// [`ContextLogger::log`] with [`Severity::Fatal`] instead.
    pub fn fatal(&self, template: impl Into<String>, args: Vec<FieldValue>) -> ! {
        self.log(Severity::Fatal, template, args);
        let _ = self.logger.close(FATAL_SHUTDOWN_TIMEOUT);
        std::process::exit(1);
    }
}
