//! Hook subsystem
//!
//! User extension functions run against every enriched event, either inline
//! on the batching worker or on a dedicated runner pool fed by a bounded
//! queue. Each invocation is isolated: panics are recovered, an optional
//! wall-clock timeout abandons stuck hooks, and one hook's failure never
//! stops later hooks. Failures are counted and kept in a bounded ring.

use super::config::HookConfig;
use super::event::LogEvent;
use super::severity::Severity;
use super::stats::PipelineStats;
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Outcome of a hook invocation.
pub type HookResult = std::result::Result<(), String>;

/// User extension function. Must be thread-safe: async mode invokes hooks
/// concurrently across the runner pool.
pub type HookFn = Arc<dyn Fn(&LogEvent) -> HookResult + Send + Sync>;

/// Why a hook invocation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookFailureKind {
    /// The hook returned a failure value
    Returned(String),
    /// The wall-clock timer fired before the hook completed
    TimedOut,
    /// The hook panicked; the payload text is embedded
    Panicked(String),
    /// The async hook queue was saturated at enqueue time
    QueueFull,
}

/// One recorded hook failure.
#[derive(Debug, Clone)]
pub struct HookFailure {
    pub time: DateTime<Utc>,
    pub severity: Severity,
    pub module: String,
    pub message: String,
    pub kind: HookFailureKind,
}

/// Bounded ring of hook failures; appending at capacity evicts the oldest.
pub(crate) struct HookFailureRing {
    entries: Mutex<VecDeque<HookFailure>>,
    capacity: usize,
}

impl HookFailureRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&self, failure: HookFailure) {
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(failure);
    }

    pub fn snapshot(&self) -> Vec<HookFailure> {
        self.entries.lock().iter().cloned().collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// Owns the hook list and, in async mode, the runner pool.
pub(crate) struct HookRuntime {
    hooks: RwLock<Vec<HookFn>>,
    settings: HookConfig,
    sender: Mutex<Option<Sender<Arc<LogEvent>>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    stats: Arc<PipelineStats>,
    ring: HookFailureRing,
}

impl HookRuntime {
    pub fn new(
        hooks: Vec<HookFn>,
        settings: HookConfig,
        stats: Arc<PipelineStats>,
        ring_capacity: usize,
    ) -> Self {
        Self {
            hooks: RwLock::new(hooks),
            settings,
            sender: Mutex::new(None),
            workers: Mutex::new(Vec::new()),
            stats,
            ring: HookFailureRing::new(ring_capacity),
        }
    }

    pub fn failures(&self) -> Vec<HookFailure> {
        self.ring.snapshot()
    }

    /// Spawn the runner pool. No-op unless async mode is configured and the
    /// hook list is non-empty.
    pub fn start(self: &Arc<Self>) {
        if !self.settings.run_async || self.hooks.read().is_empty() {
            return;
        }
        let (tx, rx): (Sender<Arc<LogEvent>>, Receiver<Arc<LogEvent>>) =
            bounded(self.settings.queue);
        *self.sender.lock() = Some(tx);

        let mut workers = self.workers.lock();
        for _ in 0..self.settings.workers {
            let runtime = Arc::clone(self);
            let receiver = rx.clone();
            workers.push(thread::spawn(move || {
                while let Ok(event) = receiver.recv() {
                    runtime.run_chain(&event);
                }
            }));
        }
    }

    /// Close the hook queue and join the runner pool. The channel slot is
    /// left empty so a later reconfiguration can reopen it.
    pub fn shutdown(&self) {
        drop(self.sender.lock().take());
        let workers = std::mem::take(&mut *self.workers.lock());
        for handle in workers {
            let _ = handle.join();
        }
    }

    /// Replace the hook list. In async mode the runner pool is restarted so
    /// the new list (possibly after a prior shutdown) gets a live queue.
    pub fn replace_hooks(self: &Arc<Self>, hooks: Vec<HookFn>) {
        *self.hooks.write() = hooks;
        if self.settings.run_async {
            self.shutdown();
            self.start();
        }
    }

    pub fn hooks_snapshot(&self) -> Vec<HookFn> {
        self.hooks.read().clone()
    }

    /// Deliver an event to the hook subsystem.
    ///
    /// Sync mode runs the chain on the calling (batching worker) thread.
    /// Async mode enqueues; a full or closed queue records a failure and
    /// drops the event for hooks only.
    pub fn dispatch(self: &Arc<Self>, event: &Arc<LogEvent>) {
        if self.hooks.read().is_empty() {
            return;
        }
        if self.settings.run_async {
            let sender = self.sender.lock().clone();
            match sender {
                Some(tx) => {
                    if tx.try_send(Arc::clone(event)).is_err() {
                        self.record_failure(event, HookFailureKind::QueueFull);
                    }
                }
                None => self.record_failure(event, HookFailureKind::QueueFull),
            }
        } else {
            self.run_chain(event);
        }
    }

    /// Run every hook from a stable snapshot of the list, in registration
    /// order. Reconfiguration during dispatch neither adds nor removes hooks
    /// for the in-flight event.
    fn run_chain(&self, event: &Arc<LogEvent>) {
        let hooks = self.hooks.read().clone();
        for hook in hooks {
            if let Some(kind) = self.run_one(&hook, event) {
                self.record_failure(event, kind);
            }
        }
    }

    fn run_one(&self, hook: &HookFn, event: &Arc<LogEvent>) -> Option<HookFailureKind> {
        match self.settings.timeout {
            Some(timeout) => {
                let (done_tx, done_rx) = bounded(1);
                let hook = Arc::clone(hook);
                let event = Arc::clone(event);
                thread::spawn(move || {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| hook(&event)));
                    // The receiver is gone if the timer already fired; the
                    // abandoned result is intentionally discarded.
                    let _ = done_tx.send(outcome);
                });
                match done_rx.recv_timeout(timeout) {
                    Ok(Ok(Ok(()))) => None,
                    Ok(Ok(Err(msg))) => Some(HookFailureKind::Returned(msg)),
                    Ok(Err(payload)) => Some(HookFailureKind::Panicked(panic_text(payload))),
                    Err(_) => Some(HookFailureKind::TimedOut),
                }
            }
            None => match panic::catch_unwind(AssertUnwindSafe(|| hook(event))) {
                Ok(Ok(())) => None,
                Ok(Err(msg)) => Some(HookFailureKind::Returned(msg)),
                Err(payload) => Some(HookFailureKind::Panicked(panic_text(payload))),
            },
        }
    }

    fn record_failure(&self, event: &LogEvent, kind: HookFailureKind) {
        self.stats.record_hook_error();
        self.ring.push(HookFailure {
            time: Utc::now(),
            severity: event.severity,
            module: event.module.clone(),
            message: event.message.clone(),
            kind,
        });
    }
}

fn panic_text(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
