//! Adapter from any `io::Write` to a shared sink

use super::Sink;
use parking_lot::Mutex;
use std::io::{self, Write};

/// Wraps an arbitrary writer behind a mutex so worker threads can share it.
pub struct WriterSink<W: Write + Send> {
    inner: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: Mutex::new(writer),
        }
    }
}

impl WriterSink<io::Stdout> {
    /// Sink over the process standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl WriterSink<io::Stderr> {
    /// Sink over the process standard error.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write + Send> Sink for WriterSink<W> {
    fn write(&self, buf: &[u8]) -> io::Result<()> {
        self.inner.lock().write_all(buf)
    }

    fn close(&self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_sink_appends() {
        let sink = WriterSink::new(Vec::new());
        sink.write(b"one\n").unwrap();
        sink.write(b"two\n").unwrap();
        assert_eq!(&*sink.inner.lock(), b"one\ntwo\n");
    }
}
