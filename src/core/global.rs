//! Process-wide logger instance
//!
//! A single published instance with lazy default initialization. All reads
//! and writes of the instance go through one lock so [`reinit`] can swap a
//! freshly started logger into place and then close the previous one.

use super::config::Config;
use super::error::Result;
use super::logger::Logger;
use super::severity::Severity;
use parking_lot::RwLock;
use std::sync::{Arc, Once};
use std::time::Duration;

static GLOBAL: RwLock<Option<Arc<Logger>>> = RwLock::new(None);
static DEFAULT_INIT: Once = Once::new();

fn ensure_init() {
    DEFAULT_INIT.call_once(|| {
        let mut global = GLOBAL.write();
        if global.is_none() {
            *global = Some(Arc::new(Logger::new(Config::default())));
        }
    });
}

/// Initialize the global logger with a minimum severity and time zone.
/// Invalid time zone names fall back to UTC.
pub fn init(min_severity: Severity, timezone: &str) -> Arc<Logger> {
    init_with_config(Config {
        min_severity,
        timezone: timezone.to_string(),
        ..Config::default()
    })
}

/// Initialize (or replace without closing) the global logger from a full
/// configuration.
pub fn init_with_config(config: Config) -> Arc<Logger> {
    let logger = Arc::new(Logger::new(config));
    *GLOBAL.write() = Some(Arc::clone(&logger));
    // First use is now satisfied; the default initializer must not run.
    DEFAULT_INIT.call_once(|| {});
    logger
}

/// The global logger, default-initialized on first use.
pub fn global() -> Arc<Logger> {
    ensure_init();
    GLOBAL
        .read()
        .as_ref()
        .map(Arc::clone)
        .expect("global logger installed by ensure_init")
}

/// Start a logger from `config`, atomically publish it as the global
/// instance, then close the previous one with the given timeout.
///
/// # Errors
///
/// Propagates a shutdown timeout from closing the previous logger; the new
/// logger is already in place when that happens.
pub fn reinit(config: Config, close_old_timeout: Duration) -> Result<Arc<Logger>> {
    ensure_init();
    let new_logger = Arc::new(Logger::new(config));
    let old = {
        let mut global = GLOBAL.write();
        global.replace(Arc::clone(&new_logger))
    };
    if let Some(old) = old {
        old.close(close_old_timeout)?;
    }
    Ok(new_logger)
}

/// Close the global logger. Safe to call when it was never initialized.
pub fn close_global(timeout: Duration) -> Result<()> {
    let logger = GLOBAL.read().as_ref().map(Arc::clone);
    match logger {
        Some(logger) => logger.close(timeout),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::BatchConfig;
    use crate::core::context::LogContext;
    use crate::sinks::{MemorySink, SinkHandle};

    // The global slot is process-wide state; this single test exercises the
    // whole surface to avoid cross-test interference.
    #[test]
    fn test_global_install_reinit_close() {
        let sink = MemorySink::new();
        let handle = SinkHandle::new("mem", Arc::new(sink.clone()));
        let logger = init_with_config(Config {
            primary: Some(handle.clone()),
            error: Some(handle),
            batch: BatchConfig {
                size: 1,
                max_wait: Duration::from_millis(20),
            },
            ..Config::default()
        });
        assert!(Arc::ptr_eq(&logger, &global()));

        logger
            .with_context(LogContext::new().with_module("global"))
            .info("first generation", vec![]);

        let sink2 = MemorySink::new();
        let handle2 = SinkHandle::new("mem2", Arc::new(sink2.clone()));
        let second = reinit(
            Config {
                primary: Some(handle2.clone()),
                error: Some(handle2),
                batch: BatchConfig {
                    size: 1,
                    max_wait: Duration::from_millis(20),
                },
                ..Config::default()
            },
            Duration::from_secs(2),
        )
        .unwrap();

        // The old generation was closed and flushed by reinit.
        assert!(sink.contents_string().contains("first generation"));
        assert!(Arc::ptr_eq(&second, &global()));

        second
            .with_context(LogContext::new())
            .info("second generation", vec![]);
        close_global(Duration::from_secs(2)).unwrap();
        assert!(sink2.contents_string().contains("second generation"));

        // Idempotent through the global entry point as well.
        close_global(Duration::from_secs(2)).unwrap();
    }
}
