//! Output sinks
//!
//! A sink is a named byte destination with an optional close operation. The
//! sink set holds the primary non-error sink, the primary error sink, an
//! optional rotation sink, and any number of extra sinks; it is shared
//! between the writer stage (readers) and the reconfiguration path (writers)
//! behind a read-favoring lock.

pub mod memory;
pub mod rotating_file;
pub mod writer;

pub use memory::MemorySink;
pub use rotating_file::RotatingFileSink;
pub use writer::WriterSink;

use std::io;
use std::sync::Arc;

/// Byte-oriented output destination.
///
/// Implementations must be thread-safe: the writer stage calls `write` from
/// multiple worker threads concurrently.
pub trait Sink: Send + Sync {
    /// Write one formatted record.
    fn write(&self, buf: &[u8]) -> io::Result<()>;

    /// Release underlying resources. Called exactly once, either by a
    /// reconfiguration that removes the sink or at shutdown.
    fn close(&self) -> io::Result<()> {
        Ok(())
    }
}

/// A named sink reference as held by the sink set.
#[derive(Clone)]
pub struct SinkHandle {
    pub name: String,
    pub sink: Arc<dyn Sink>,
}

impl SinkHandle {
    pub fn new(name: impl Into<String>, sink: Arc<dyn Sink>) -> Self {
        Self {
            name: name.into(),
            sink,
        }
    }
}

impl std::fmt::Debug for SinkHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkHandle").field("name", &self.name).finish()
    }
}

/// The ordered collection of output sinks.
#[derive(Clone, Debug)]
pub struct SinkSet {
    pub primary: SinkHandle,
    pub error: SinkHandle,
    pub rotation: Option<SinkHandle>,
    pub extras: Vec<SinkHandle>,
}

impl SinkSet {
    /// Assign fallback names (`extra0`, `extra1`, ...) to unnamed extras.
    pub(crate) fn name_extras(&mut self) {
        for (i, handle) in self.extras.iter_mut().enumerate() {
            if handle.name.is_empty() {
                handle.name = format!("extra{}", i);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extra_sink_fallback_names() {
        let sink: Arc<dyn Sink> = Arc::new(MemorySink::new());
        let mut set = SinkSet {
            primary: SinkHandle::new("stdout", sink.clone()),
            error: SinkHandle::new("stderr", sink.clone()),
            rotation: None,
            extras: vec![
                SinkHandle::new("", sink.clone()),
                SinkHandle::new("audit", sink.clone()),
                SinkHandle::new("", sink),
            ],
        };
        set.name_extras();
        assert_eq!(set.extras[0].name, "extra0");
        assert_eq!(set.extras[1].name, "audit");
        assert_eq!(set.extras[2].name, "extra2");
    }
}
