//! In-memory sink
//!
//! Collects written bytes in a shared buffer. Useful in tests and as a
//! capture target for embedding programs; can optionally block writes until
//! released to simulate a stalled destination.

use super::Sink;
use parking_lot::{Condvar, Mutex};
use std::io;
use std::sync::Arc;

#[derive(Default)]
struct Shared {
    buf: Mutex<Vec<u8>>,
    blocked: Mutex<bool>,
    unblock: Condvar,
}

/// Shared in-memory byte sink.
#[derive(Clone, Default)]
pub struct MemorySink {
    shared: Arc<Shared>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink whose writes block until [`MemorySink::unblock`].
    pub fn blocked() -> Self {
        let sink = Self::new();
        *sink.shared.blocked.lock() = true;
        sink
    }

    /// Release all pending and future writes.
    pub fn unblock(&self) {
        let mut blocked = self.shared.blocked.lock();
        *blocked = false;
        self.shared.unblock.notify_all();
    }

    /// Copy of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.shared.buf.lock().clone()
    }

    /// Written bytes interpreted as UTF-8 (lossy).
    pub fn contents_string(&self) -> String {
        String::from_utf8_lossy(&self.shared.buf.lock()).into_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.buf.lock().is_empty()
    }
}

impl Sink for MemorySink {
    fn write(&self, buf: &[u8]) -> io::Result<()> {
        {
            let mut blocked = self.shared.blocked.lock();
            while *blocked {
                self.shared.unblock.wait(&mut blocked);
            }
        }
        self.shared.buf.lock().extend_from_slice(buf);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_memory_sink_collects() {
        let sink = MemorySink::new();
        sink.write(b"hello ").unwrap();
        sink.write(b"world").unwrap();
        assert_eq!(sink.contents_string(), "hello world");
    }

    #[test]
    fn test_blocked_sink_holds_writes() {
        let sink = MemorySink::blocked();
        let writer = sink.clone();
        let handle = thread::spawn(move || writer.write(b"late").unwrap());

        thread::sleep(Duration::from_millis(50));
        assert!(sink.is_empty());

        sink.unblock();
        handle.join().unwrap();
        assert_eq!(sink.contents_string(), "late");
    }
}
