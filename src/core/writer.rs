//! Writer stage
//!
//! Routes a formatted buffer to the sink subset selected by severity and
//! applies the per-sink retry discipline. Sink references are snapshotted
//! under a short read lock before any I/O, so a slow sink never holds up
//! the reconfiguration path.

use super::config::RetryPolicy;
use super::pipeline::PipelineShared;
use crate::sinks::SinkHandle;
use rand::Rng;
use std::thread;
use std::time::Duration;

/// Dispatch one formatted record: primary (or error) sink by severity, then
/// the rotation sink and every extra sink.
pub(crate) fn write_to_all(shared: &PipelineShared, buf: &[u8], is_error: bool) {
    let (target, rotation, extras) = {
        let sinks = shared.sinks.read();
        let target = if is_error {
            sinks.error.clone()
        } else {
            sinks.primary.clone()
        };
        (target, sinks.rotation.clone(), sinks.extras.clone())
    };

    try_write(shared, &target, buf);
    if let Some(rotation) = &rotation {
        try_write(shared, rotation, buf);
    }
    for extra in &extras {
        try_write(shared, extra, buf);
    }
}

/// Attempt a write up to `1 + max_retries` times. The retry policy is read
/// once at call start; every failed attempt is counted globally and for the
/// named sink.
pub(crate) fn try_write(shared: &PipelineShared, handle: &SinkHandle, buf: &[u8]) {
    let policy = shared.dynamic.retry_policy();
    for attempt in 0..=policy.max_retries {
        if handle.sink.write(buf).is_ok() {
            return;
        }
        shared.stats.record_write_error();
        shared.stats.record_sink_error(&handle.name);
        if attempt == policy.max_retries {
            return;
        }
        thread::sleep(retry_delay(&policy, attempt));
    }
}

/// `backoff` before the first retry, `backoff * 2^attempt` afterwards when
/// exponential, plus uniform jitter in `[0, jitter)`.
fn retry_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let mut delay = if policy.exponential {
        policy.backoff.saturating_mul(1u32 << attempt.min(20))
    } else {
        policy.backoff
    };
    let jitter_nanos = policy.jitter.as_nanos() as u64;
    if jitter_nanos > 0 {
        delay += Duration::from_nanos(rand::thread_rng().gen_range(0..jitter_nanos));
    }
    delay
}

/// Close one sink, counting a failure against its error counters.
pub(crate) fn close_sink(shared: &PipelineShared, handle: &SinkHandle) {
    if handle.sink.close().is_err() {
        shared.stats.record_write_error();
        shared.stats.record_sink_error(&handle.name);
    }
}

/// Close every sink in the set: rotation first, then extras, then the
/// primary error and non-error sinks.
pub(crate) fn close_all_sinks(shared: &PipelineShared) {
    let sinks = shared.sinks.read().clone();
    if let Some(rotation) = &sinks.rotation {
        close_sink(shared, rotation);
    }
    for extra in &sinks.extras {
        close_sink(shared, extra);
    }
    close_sink(shared, &sinks.error);
    close_sink(shared, &sinks.primary);
}
