//! Batching worker loop
//!
//! Workers pull records off the ingestion queue, coalesce them into pooled
//! batches bounded by the published size and maximum wait, and push each
//! record through masking, hook dispatch, formatting, and the writer stage.
//! Records are delivered in enqueue order within one worker.

use super::dynamic::DynamicConfig;
use super::event::LogEvent;
use super::formatter::{Formatter, JsonFormatter, TextFormatter};
use super::hooks::HookRuntime;
use super::pool::{Batch, BatchPool, RecordPool};
use super::record::LogRecord;
use super::stats::PipelineStats;
use super::writer::write_to_all;
use crate::sinks::SinkSet;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;

/// State shared by the logger facade, the batching workers, and the hook
/// runner pool.
pub(crate) struct PipelineShared {
    pub receiver: Receiver<Box<LogRecord>>,
    pub sinks: RwLock<SinkSet>,
    pub dynamic: DynamicConfig,
    pub hooks: Arc<HookRuntime>,
    pub stats: Arc<PipelineStats>,
    pub record_pool: RecordPool,
    pub batch_pool: BatchPool,
    pub custom_formatter: Option<Arc<dyn Formatter>>,
    pub text_formatter: TextFormatter,
    pub json_formatter: JsonFormatter,
    pub non_blocking: bool,
    pub drop_oldest: bool,
}

impl PipelineShared {
    /// The active formatter: a configured override, otherwise the built-in
    /// matching the current format mode.
    pub fn formatter(&self, structured: bool) -> &dyn Formatter {
        if let Some(custom) = &self.custom_formatter {
            return custom.as_ref();
        }
        if structured {
            &self.json_formatter
        } else {
            &self.text_formatter
        }
    }
}

/// Body of one batching worker thread.
///
/// Batch size and wait are re-read from the atomic mirrors on every
/// iteration so reconfiguration takes effect within one batch window. The
/// flush deadline derives from the batch creation instant, which resets on
/// every flush, so a size-triggered flush cannot leave a stale timeout
/// behind.
pub(crate) fn worker_loop(shared: Arc<PipelineShared>) {
    let mut batch = shared.batch_pool.acquire();

    loop {
        let size = shared.dynamic.batch_size();

        if batch.items.is_empty() {
            match shared.receiver.recv() {
                Ok(record) => {
                    batch.created = Instant::now();
                    batch.items.push(record);
                    if batch.items.len() >= size {
                        flush(&shared, &mut batch);
                    }
                }
                // Queue closed and drained: final flush below.
                Err(_) => break,
            }
        } else {
            let deadline = batch.created + shared.dynamic.batch_wait();
            let now = Instant::now();
            if now >= deadline {
                flush(&shared, &mut batch);
                continue;
            }
            match shared.receiver.recv_timeout(deadline - now) {
                Ok(record) => {
                    batch.items.push(record);
                    if batch.items.len() >= size {
                        flush(&shared, &mut batch);
                    }
                }
                Err(RecvTimeoutError::Timeout) => flush(&shared, &mut batch),
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    flush(&shared, &mut batch);
    shared.batch_pool.release(batch);
}

/// Drain the batch in order and recycle every record.
fn flush(shared: &PipelineShared, batch: &mut Batch) {
    if batch.items.is_empty() {
        return;
    }
    for record in batch.items.drain(..) {
        process_record(shared, &record);
        shared.record_pool.release(record);
    }
    shared.stats.record_batch();
    batch.created = Instant::now();
}

/// Enrich, mask, run hooks, format, and write one record.
fn process_record(shared: &PipelineShared, record: &LogRecord) {
    shared.stats.record_written();

    let structured = shared.dynamic.structured();
    let telemetry = shared.dynamic.telemetry();
    let tz = shared.dynamic.timezone();

    let rendered = record.render_message();
    let masked = {
        let rules = shared.dynamic.read();
        super::masking::apply_masking(
            &rendered,
            structured,
            &rules.regex_rules,
            &rules.field_rules,
        )
    };

    // Context metadata is read lazily, here in the worker.
    let ctx = record.context.as_deref();
    let module = ctx.map(|c| c.module().to_string()).unwrap_or_default();
    let flow_id = ctx
        .and_then(|c| c.flow_id())
        .unwrap_or_default()
        .to_string();
    let mut attrs = ctx.map(|c| c.attrs().clone()).unwrap_or_default();
    let mut trace_id = ctx
        .and_then(|c| c.trace_id())
        .unwrap_or_default()
        .to_string();
    if telemetry {
        if let Some(span) = ctx.and_then(|c| c.telemetry_span()) {
            if !span.trace_id.is_empty() {
                trace_id = span.trace_id.clone();
            }
            if !span.span_id.is_empty() {
                attrs.insert("span_id".to_string(), span.span_id.clone());
            }
        }
    }

    // Context fields first, per-record fields win on duplicate keys.
    let mut fields = ctx.map(|c| c.fields().clone()).unwrap_or_default();
    if let Some(extra) = &record.fields {
        for (key, value) in extra {
            fields.insert(key.clone(), value.clone());
        }
    }

    let event = Arc::new(LogEvent {
        time: record.timestamp.with_timezone(&tz),
        severity: record.severity,
        module,
        message: masked,
        trace_id,
        flow_id,
        attrs,
        fields,
        structured,
    });

    shared.hooks.dispatch(&event);

    let formatter = shared.formatter(structured);
    match formatter.format(&event) {
        Ok(bytes) => {
            write_to_all(shared, &bytes, event.severity.routes_to_error_sink());
        }
        Err(err) => {
            shared.stats.record_write_error();
            eprintln!("[logger] formatter '{}' failed: {}", formatter.name(), err);
        }
    }
}
