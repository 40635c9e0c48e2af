//! Lock-free record and batch pools
//!
//! Reusable allocation arenas for `LogRecord` and `Batch` objects. Get and
//! put are O(1) lock-free queue operations; when a pool is empty a fresh
//! allocation is handed out, and a release into a full pool simply drops the
//! object.

use super::record::LogRecord;
use crossbeam_queue::ArrayQueue;
use std::time::Instant;

/// Pool of recycled `LogRecord` allocations.
pub(crate) struct RecordPool {
    queue: ArrayQueue<Box<LogRecord>>,
}

impl RecordPool {
    /// Create a pool pre-populated to `capacity` records.
    pub fn new(capacity: usize) -> Self {
        let queue = ArrayQueue::new(capacity.max(1));
        for _ in 0..queue.capacity() {
            let _ = queue.push(Box::new(LogRecord::empty()));
        }
        Self { queue }
    }

    /// Take a record from the pool, allocating when the pool is empty.
    pub fn acquire(&self) -> Box<LogRecord> {
        self.queue
            .pop()
            .unwrap_or_else(|| Box::new(LogRecord::empty()))
    }

    /// Return a record to the pool after clearing reference-holding fields.
    pub fn release(&self, mut record: Box<LogRecord>) {
        record.reset();
        let _ = self.queue.push(record);
    }

    #[cfg(test)]
    pub fn available(&self) -> usize {
        self.queue.len()
    }
}

/// Ordered group of records flushed together.
pub(crate) struct Batch {
    pub items: Vec<Box<LogRecord>>,
    pub created: Instant,
}

impl Batch {
    fn new() -> Self {
        Self {
            items: Vec::with_capacity(64),
            created: Instant::now(),
        }
    }
}

/// Pool of recycled batch containers.
pub(crate) struct BatchPool {
    queue: ArrayQueue<Batch>,
}

impl BatchPool {
    pub fn new(capacity: usize) -> Self {
        let queue = ArrayQueue::new(capacity.max(1));
        for _ in 0..queue.capacity() {
            let _ = queue.push(Batch::new());
        }
        Self { queue }
    }

    pub fn acquire(&self) -> Batch {
        let mut batch = self.queue.pop().unwrap_or_else(Batch::new);
        batch.created = Instant::now();
        batch
    }

    /// Return a drained batch. Items must already have been recycled.
    pub fn release(&self, mut batch: Batch) {
        batch.items.clear();
        let _ = self.queue.push(batch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::LogContext;
    use crate::core::severity::Severity;
    use std::sync::Arc;

    #[test]
    fn test_record_pool_roundtrip() {
        let pool = RecordPool::new(4);
        assert_eq!(pool.available(), 4);

        let mut rec = pool.acquire();
        assert_eq!(pool.available(), 3);
        rec.fill(
            Severity::Warn,
            Arc::new(LogContext::new().with_module("m")),
            "msg".to_string(),
            vec![],
            None,
        );

        pool.release(rec);
        assert_eq!(pool.available(), 4);

        // A recycled record comes back cleared.
        let rec = pool.acquire();
        assert!(rec.context.is_none());
        assert!(rec.template.is_empty());
    }

    #[test]
    fn test_record_pool_overflow_is_dropped() {
        let pool = RecordPool::new(1);
        let extra = Box::new(LogRecord::empty());
        pool.release(extra);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_batch_pool_resets_created() {
        let pool = BatchPool::new(2);
        let mut batch = pool.acquire();
        batch.items.push(Box::new(LogRecord::empty()));
        let item = batch.items.pop().unwrap();
        drop(item);
        pool.release(batch);

        let batch = pool.acquire();
        assert!(batch.items.is_empty());
        assert!(batch.created.elapsed().as_millis() < 100);
    }
}
