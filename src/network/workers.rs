//! Worker Registry
//!
//! Tracks live connection workers so shutdown can reach all of them.
//!
//! ```text
//!   Server ── add/remove ──▶ Mutex<Vec<WorkerEntry>>
//!      │
//!      └── cancel_all ──▶ drop(Sender) ──▶ every CancelToken sees Disconnected
//! ```
//!
//! Cancellation is cooperative: a worker notices it the next time it polls
//! its token. Nobody waits for workers to finish.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;

/// Identifier handed out by `WorkerRegistry::add`
pub type WorkerId = u64;

/// Cancellation signal observed by one worker
#[derive(Debug, Clone)]
pub struct CancelToken {
    signal: Receiver<()>,
}

impl CancelToken {
    /// True once the registry has cancelled its workers
    pub fn is_cancelled(&self) -> bool {
        matches!(self.signal.try_recv(), Err(TryRecvError::Disconnected))
    }
}

#[derive(Debug)]
struct WorkerEntry {
    id: WorkerId,
    peer_addr: String,
}

/// Registry of live workers
#[derive(Debug)]
pub struct WorkerRegistry {
    workers: Mutex<Vec<WorkerEntry>>,

    /// Dropped by `cancel_all`
    shutdown: Mutex<Option<Sender<()>>>,

    signal: Receiver<()>,
    next_id: AtomicU64,
}

impl Default for WorkerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerRegistry {
    pub fn new() -> Self {
        let (sender, signal) = channel::bounded(0);
        Self {
            workers: Mutex::new(Vec::new()),
            shutdown: Mutex::new(Some(sender)),
            signal,
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a worker for a connection
    pub fn add(&self, peer_addr: &str) -> WorkerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut workers = self.workers.lock();
        workers.push(WorkerEntry {
            id,
            peer_addr: peer_addr.to_string(),
        });
        tracing::trace!("Worker {} added for {} ({} live)", id, peer_addr, workers.len());
        id
    }

    /// Forget a worker; returns false if it was not registered
    pub fn remove(&self, id: WorkerId) -> bool {
        let mut workers = self.workers.lock();
        match workers.iter().position(|w| w.id == id) {
            Some(index) => {
                let entry = workers.swap_remove(index);
                tracing::trace!("Worker {} for {} removed", entry.id, entry.peer_addr);
                true
            }
            None => false,
        }
    }

    /// Signal every current and future token, then clear the list
    pub fn cancel_all(&self) {
        self.shutdown.lock().take();
        let mut workers = self.workers.lock();
        if !workers.is_empty() {
            tracing::debug!("Cancelling {} workers", workers.len());
        }
        workers.clear();
    }

    /// Token for a new worker
    pub fn token(&self) -> CancelToken {
        CancelToken {
            signal: self.signal.clone(),
        }
    }

    /// Number of live workers
    pub fn len(&self) -> usize {
        self.workers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.lock().is_empty()
    }
}
