//! Logging macros for ergonomic producer calls.
//!
//! The macros collect template arguments into [`FieldValue`]s so that
//! rendering stays in the batching worker.
//!
//! # Examples
//!
//! ```
//! use async_logger_system::prelude::*;
//! use async_logger_system::info;
//!
//! let logger = Logger::new(Config::default());
//! let lw = logger.with_context(LogContext::new().with_module("demo"));
//!
//! info!(lw, "server started");
//!
//! let port = 8080;
//! info!(lw, "listening on port {}", port);
//! ```
//!
//! [`FieldValue`]: crate::FieldValue

/// Log at an explicit severity.
///
/// # Examples
///
/// ```
/// # use async_logger_system::prelude::*;
/// # let logger = Logger::new(Config::default());
/// # let lw = logger.with_context(LogContext::new());
/// use async_logger_system::log;
/// log!(lw, Severity::Info, "simple message");
/// log!(lw, Severity::Error, "error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $severity:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $logger.log($severity, $template, vec![$($crate::FieldValue::from($arg)),*])
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $crate::log!($logger, $crate::Severity::Debug, $template $(, $arg)*)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $crate::log!($logger, $crate::Severity::Info, $template $(, $arg)*)
    };
}

/// Log a warn-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $crate::log!($logger, $crate::Severity::Warn, $template $(, $arg)*)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $crate::log!($logger, $crate::Severity::Error, $template $(, $arg)*)
    };
}

/// Log a fatal-level message, shut the logger down within a two-second
/// budget, and terminate the process.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $logger.fatal($template, vec![$($crate::FieldValue::from($arg)),*])
    };
}
