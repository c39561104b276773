//! Ingestion pipeline: queue, extraction, and the worker thread
//!
//! This module decouples network-triggered file arrivals from UI-thread
//! processing. The flow is:
//!
//! 1. The request listener (or the UI's add-files dialog) enqueues a
//!    batch of filepaths on the [`IngestQueue`] - never blocking.
//! 2. The [`IngestWorker`] thread dequeues batches in FIFO order,
//!    honoring the [`PauseGate`].
//! 3. For each file the worker runs the extractor off-thread, then hands
//!    the merge to the UI-owning thread as a [`UiTask`] and blocks until
//!    the UI confirms completion.
//!
//! Step 3 is what gives the pipeline backpressure: the queue, not the
//! worker, absorbs bursts, and the grid is only ever mutated from the
//! thread that owns it.

pub mod extractor;
pub mod queue;
pub mod worker;

pub use extractor::{extract, extract_with_retry};
pub use queue::{IngestKind, IngestQueue, IngestRequest, PauseGate, QueueHandle};
pub use worker::IngestWorker;

use crate::types::Record;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::path::PathBuf;

/// Work marshaled from the ingestion worker onto the UI-owning thread.
#[derive(Debug)]
pub enum UiTask {
    /// Merge an extracted record into the table and projection. The
    /// worker blocks on `done` until the merge has been applied.
    Merge {
        kind: IngestKind,
        record: Record,
        done: Sender<()>,
    },
    /// A non-blocking notification for the status surface.
    Note(IngestNote),
}

/// Operator-visible pipeline notifications.
#[derive(Debug, Clone)]
pub enum IngestNote {
    /// A file could not be extracted and was skipped
    ExtractionFailed { path: PathBuf, error: String },
    /// A batch was abandoned because the UI dispatch failed; the listed
    /// paths were not processed
    BatchAborted { remaining: Vec<PathBuf>, error: String },
}

/// Create the worker-to-UI task channel.
///
/// Unbounded: the worker serializes itself by blocking on each merge's
/// completion, so at most one merge task is ever in flight.
pub fn ui_task_channel() -> (Sender<UiTask>, Receiver<UiTask>) {
    unbounded()
}
