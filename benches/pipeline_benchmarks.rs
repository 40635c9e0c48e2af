//! Criterion benchmarks for the logging pipeline

use async_logger_system::prelude::*;
use async_logger_system::{apply_masking, FieldRule, RegexRule};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// Sink that discards everything.
struct NullSink;

impl Sink for NullSink {
    fn write(&self, _buf: &[u8]) -> io::Result<()> {
        Ok(())
    }
}

fn null_logger(non_blocking: bool, batch_size: usize) -> Logger {
    let handle = SinkHandle::new("null", Arc::new(NullSink) as Arc<dyn Sink>);
    Logger::new(Config {
        buffer: 4096,
        workers: 2,
        non_blocking,
        drop_oldest: non_blocking,
        batch: BatchConfig {
            size: batch_size,
            max_wait: Duration::from_millis(100),
        },
        primary: Some(handle.clone()),
        error: Some(handle),
        ..Config::default()
    })
}

// ============================================================================
// Enqueue Throughput Benchmarks
// ============================================================================

fn bench_enqueue_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("enqueue_throughput");
    group.throughput(Throughput::Elements(1));

    let blocking = null_logger(false, 8);
    let lw = blocking.with_context(LogContext::new().with_module("bench"));
    group.bench_function("blocking_batch_8", |b| {
        b.iter(|| {
            lw.info(black_box("benchmark message {}"), vec![FieldValue::from(1_i64)]);
        });
    });
    drop(lw);
    blocking.close(Duration::from_secs(5)).unwrap();

    let non_blocking = null_logger(true, 8);
    let lw = non_blocking.with_context(LogContext::new().with_module("bench"));
    group.bench_function("non_blocking_batch_8", |b| {
        b.iter(|| {
            lw.info(black_box("benchmark message {}"), vec![FieldValue::from(1_i64)]);
        });
    });
    drop(lw);
    non_blocking.close(Duration::from_secs(5)).unwrap();

    group.finish();
}

// ============================================================================
// Severity Filter Benchmarks
// ============================================================================

fn bench_filtered_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("severity_filter");
    group.throughput(Throughput::Elements(1));

    let logger = null_logger(false, 8);
    logger.set_min_severity(Severity::Error);
    let lw = logger.with_context(LogContext::new());

    group.bench_function("below_threshold", |b| {
        b.iter(|| {
            lw.debug(black_box("discarded before the queue"), vec![]);
        });
    });

    drop(lw);
    logger.close(Duration::from_secs(5)).unwrap();
    group.finish();
}

// ============================================================================
// Masking Benchmarks
// ============================================================================

fn bench_masking(c: &mut Criterion) {
    let mut group = c.benchmark_group("masking");
    group.throughput(Throughput::Elements(1));

    let regex_rules = vec![
        RegexRule::new(r"\b\d{16}\b", "[CARD]").unwrap(),
        RegexRule::new(r"\b\d{3}-\d{2}-\d{4}\b", "[SSN]").unwrap(),
    ];
    let field_rules = vec![FieldRule::new(["password", "token"], "[REDACTED]")];

    group.bench_function("text_regex_only", |b| {
        b.iter(|| {
            apply_masking(
                black_box("card 1234567812345678 ssn 123-45-6789"),
                false,
                &regex_rules,
                &field_rules,
            )
        });
    });

    group.bench_function("structured_field_rules", |b| {
        b.iter(|| {
            apply_masking(
                black_box(r#"{"user":"u","password":"secret","card":"1234567812345678"}"#),
                true,
                &regex_rules,
                &field_rules,
            )
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_enqueue_throughput,
    bench_filtered_out,
    bench_masking
);
criterion_main!(benches);
