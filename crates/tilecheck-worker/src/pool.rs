//! Worker threads and cooperative shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tilecheck_core::ModeCatalog;
use tracing::{error, info};

use crate::error::WorkerError;
use crate::store::JobStore;
use crate::worker::{Worker, WorkerStats};

#[derive(Debug)]
struct StopInner {
    stopped: AtomicBool,
    // Dropped on stop; disconnecting the channel wakes every waiter.
    wake_tx: Mutex<Option<Sender<()>>>,
    wake_rx: Receiver<()>,
}

/// Shared stop signal with an interruptible sleep.
#[derive(Clone, Debug)]
pub struct StopToken {
    inner: Arc<StopInner>,
}

impl Default for StopToken {
    fn default() -> Self {
        Self::new()
    }
}

impl StopToken {
    /// A token that has not been stopped.
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::bounded(0);
        Self {
            inner: Arc::new(StopInner {
                stopped: AtomicBool::new(false),
                wake_tx: Mutex::new(Some(tx)),
                wake_rx: rx,
            }),
        }
    }

    /// Signal stop and wake every thread blocked in [`wait`](Self::wait).
    pub fn stop(&self) {
        self.inner.stopped.store(true, Ordering::Release);
        self.inner
            .wake_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Whether [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::Acquire)
    }

    /// Sleep up to `timeout`, returning early on stop.
    /// Returns whether the token is stopped.
    pub fn wait(&self, timeout: Duration) -> bool {
        if self.is_stopped() {
            return true;
        }
        match self.inner.wake_rx.recv_timeout(timeout) {
            Err(RecvTimeoutError::Disconnected) => true,
            Ok(()) | Err(RecvTimeoutError::Timeout) => self.is_stopped(),
        }
    }
}

/// Report from [`WorkerPool::shutdown`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Time from the stop signal until every thread was joined.
    pub total_ms: u64,
    /// Worker threads that exited normally.
    pub workers_joined: usize,
    /// Worker threads that panicked outside job processing.
    pub workers_panicked: usize,
    /// Counters summed over the joined workers.
    pub stats: WorkerStats,
}

/// A fixed set of worker threads sharing one stop token.
///
/// Dropping the pool shuts it down.
#[derive(Debug)]
pub struct WorkerPool {
    stop: StopToken,
    handles: Vec<JoinHandle<WorkerStats>>,
}

impl WorkerPool {
    /// Spawn `n` threads named `tilecheck-worker-{i}`, each running a
    /// fork of `worker` until shutdown.
    pub fn spawn<S, C>(n: usize, worker: &Worker<S, C>) -> Result<Self, WorkerError>
    where
        S: JobStore + 'static,
        C: ModeCatalog + Send + Sync + 'static,
    {
        let mut pool = Self {
            stop: StopToken::new(),
            handles: Vec::with_capacity(n),
        };
        for i in 0..n {
            let name = format!("tilecheck-worker-{i}");
            let w = worker.fork(name.clone());
            let stop = pool.stop.clone();
            // On error the partially built pool is shut down by Drop.
            let handle = thread::Builder::new()
                .name(name)
                .spawn(move || w.run(&stop))?;
            pool.handles.push(handle);
        }
        info!(target: "tilecheck::worker", workers = n, "pool started");
        Ok(pool)
    }

    /// Number of live worker threads.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether the pool has no threads (never started, or shut down).
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// The pool's stop token.
    pub fn stop_token(&self) -> &StopToken {
        &self.stop
    }

    /// Signal stop, then join every thread. Jobs in flight finish first.
    /// Calling it again returns an empty report.
    pub fn shutdown(&mut self) -> ShutdownReport {
        let start = Instant::now();
        self.stop.stop();

        let mut report = ShutdownReport::default();
        for handle in self.handles.drain(..) {
            match handle.join() {
                Ok(stats) => {
                    report.workers_joined += 1;
                    report.stats = report.stats.merge(stats);
                }
                Err(_) => report.workers_panicked += 1,
            }
        }
        report.total_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        if report.workers_panicked > 0 {
            error!(
                target: "tilecheck::worker",
                panicked = report.workers_panicked,
                "worker threads panicked"
            );
        }
        info!(
            target: "tilecheck::worker",
            joined = report.workers_joined,
            processed = report.stats.processed(),
            total_ms = report.total_ms,
            "pool stopped"
        );
        report
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            self.shutdown();
        }
    }
}
