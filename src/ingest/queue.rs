//! Incoming-file queue and pause gate
//!
//! The queue decouples bursty network-triggered file arrivals from their
//! processing. Enqueueing never blocks: the channel is unbounded, so the
//! request listener keeps accepting files even while processing is slow
//! or paused. The consumer side blocks on an empty queue.
//!
//! Pausing is a separate concern from queueing: the [`PauseGate`] is a
//! condition-protected flag the worker waits on before dequeuing, so a
//! paused dashboard accumulates queue depth without losing order.

use crate::error::{Result, ShotDashError};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::path::PathBuf;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// How a batch of paths should be merged into the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestKind {
    /// Idempotent insert: files already present are skipped
    Add,
    /// Re-extract and overwrite the existing row in place
    Refresh,
}

/// One ingestion unit: one or more filepaths queued whole.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub kind: IngestKind,
    pub paths: Vec<PathBuf>,
}

impl IngestRequest {
    /// An add-request for a single file.
    pub fn add_one(path: impl Into<PathBuf>) -> Self {
        IngestRequest {
            kind: IngestKind::Add,
            paths: vec![path.into()],
        }
    }
}

/// Producer handle for the ingestion queue. Cheap to clone; safe to use
/// from the listener thread and the UI thread alike.
#[derive(Debug, Clone)]
pub struct QueueHandle {
    sender: Sender<IngestRequest>,
}

impl QueueHandle {
    /// Queue a batch. Never blocks.
    pub fn enqueue(&self, request: IngestRequest) -> Result<()> {
        self.sender
            .send(request)
            .map_err(|_| ShotDashError::Channel("ingestion queue closed".to_string()))
    }

    /// Queue a batch of paths for idempotent insertion.
    pub fn enqueue_add(&self, paths: Vec<PathBuf>) -> Result<()> {
        self.enqueue(IngestRequest {
            kind: IngestKind::Add,
            paths,
        })
    }

    /// Queue a batch of paths for in-place refresh.
    pub fn enqueue_refresh(&self, paths: Vec<PathBuf>) -> Result<()> {
        self.enqueue(IngestRequest {
            kind: IngestKind::Refresh,
            paths,
        })
    }

    /// Number of batches waiting to be processed.
    pub fn depth(&self) -> usize {
        self.sender.len()
    }
}

/// Unbounded FIFO of ingestion batches. The consumer end lives on the
/// ingestion worker; producers hold [`QueueHandle`]s.
#[derive(Debug)]
pub struct IngestQueue {
    sender: Sender<IngestRequest>,
    receiver: Receiver<IngestRequest>,
}

impl Default for IngestQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl IngestQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        IngestQueue { sender, receiver }
    }

    /// A new producer handle.
    pub fn handle(&self) -> QueueHandle {
        QueueHandle {
            sender: self.sender.clone(),
        }
    }

    /// Blocking dequeue with no timeout.
    pub fn dequeue(&self) -> Result<IngestRequest> {
        self.receiver
            .recv()
            .map_err(|_| ShotDashError::Channel("ingestion queue closed".to_string()))
    }

    /// Dequeue with a timeout, so the worker loop can poll its running
    /// flag between batches.
    pub fn dequeue_timeout(&self, timeout: Duration) -> Option<IngestRequest> {
        match self.receiver.recv_timeout(timeout) {
            Ok(request) => Some(request),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Number of batches currently queued.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

/// Condition-protected pause flag for the ingestion worker.
///
/// The two consumer states (running/paused) are guarded by a single
/// condvar; waiting consumers are woken on resume rather than polling.
#[derive(Debug, Default)]
pub struct PauseGate {
    paused: Mutex<bool>,
    cond: Condvar,
}

impl PauseGate {
    /// Create a gate in the running state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defer processing of dequeued batches. Enqueueing is unaffected.
    pub fn pause(&self) {
        let mut paused = self.lock();
        *paused = true;
        tracing::info!("ingestion paused");
    }

    /// Resume processing and wake any waiting consumer.
    pub fn resume(&self) {
        let mut paused = self.lock();
        *paused = false;
        drop(paused);
        self.cond.notify_all();
        tracing::info!("ingestion resumed");
    }

    /// Current state.
    pub fn is_paused(&self) -> bool {
        *self.lock()
    }

    /// Block while paused, waking at most every `check_interval` so the
    /// caller can test its shutdown flag. Returns true once running.
    pub fn wait_while_paused(&self, check_interval: Duration) -> bool {
        let mut paused = self.lock();
        if *paused {
            let (guard, _timeout) = self
                .cond
                .wait_timeout(paused, check_interval)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            paused = guard;
        }
        !*paused
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, bool> {
        self.paused
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
