//! Ingestion worker thread
//!
//! The worker owns the consumer side of the ingestion queue. Its loop:
//! wait out the pause gate, dequeue one batch, extract each file, and
//! dispatch each merge to the UI-owning thread, blocking until the UI
//! confirms it. Files are processed in FIFO enqueue order within a batch
//! and across batches.
//!
//! # Failure isolation
//!
//! One bad file must not abort its siblings: extraction failures are
//! logged, reported via [`IngestNote::ExtractionFailed`], and the loop
//! moves on. A failed UI dispatch is different - the grid can no longer
//! be updated, so the rest of the batch is reported as unprocessed via
//! [`IngestNote::BatchAborted`] rather than silently dropped.

use crate::error::{Result, ShotDashError};
use crate::ingest::{extractor, IngestNote, IngestQueue, IngestRequest, PauseGate, UiTask};
use crate::types::Record;
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How often the worker re-checks its running flag while idle or paused.
const IDLE_POLL: Duration = Duration::from_millis(100);

/// Tunables for the worker, sourced from the app configuration.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Read attempts for a possibly-locked shot file
    pub open_retries: u32,
    /// Delay between read attempts
    pub retry_delay: Duration,
    /// How long to wait for the UI thread to apply one merge
    pub dispatch_timeout: Duration,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        WorkerSettings {
            open_retries: extractor::DEFAULT_OPEN_RETRIES,
            retry_delay: extractor::DEFAULT_RETRY_DELAY,
            dispatch_timeout: Duration::from_secs(10),
        }
    }
}

/// The ingestion worker that runs the consumer loop.
pub struct IngestWorker {
    queue: IngestQueue,
    gate: Arc<PauseGate>,
    ui_tx: Sender<UiTask>,
    running: Arc<AtomicBool>,
    settings: WorkerSettings,
}

impl IngestWorker {
    /// Create a new worker.
    pub fn new(
        queue: IngestQueue,
        gate: Arc<PauseGate>,
        ui_tx: Sender<UiTask>,
        running: Arc<AtomicBool>,
        settings: WorkerSettings,
    ) -> Self {
        IngestWorker {
            queue,
            gate,
            ui_tx,
            running,
            settings,
        }
    }

    /// Run the consumer loop until the running flag clears.
    pub fn run(&self) {
        tracing::info!("ingestion worker started");

        while self.running.load(Ordering::SeqCst) {
            // Batches stay queued while paused; only processing defers.
            if !self.gate.wait_while_paused(IDLE_POLL) {
                continue;
            }
            let Some(request) = self.queue.dequeue_timeout(IDLE_POLL) else {
                continue;
            };
            self.process_batch(request);
        }

        tracing::info!("ingestion worker stopped");
    }

    /// Process one dequeued batch, isolating per-file failures.
    fn process_batch(&self, request: IngestRequest) {
        tracing::debug!(kind = ?request.kind, files = request.paths.len(), "processing batch");

        for (i, path) in request.paths.iter().enumerate() {
            let record = match extractor::extract_with_retry(
                path,
                self.settings.open_retries,
                self.settings.retry_delay,
            ) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "extraction failed, skipping file");
                    self.note(IngestNote::ExtractionFailed {
                        path: path.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            if let Err(e) = self.dispatch_merge(request.kind, record) {
                tracing::error!(path = %path.display(), error = %e, "UI dispatch failed, abandoning batch");
                self.note(IngestNote::BatchAborted {
                    remaining: request.paths[i..].to_vec(),
                    error: e.to_string(),
                });
                return;
            }
        }
    }

    /// Hand one merge to the UI thread and block until it completes.
    ///
    /// This block is the pipeline's backpressure point: the next file is
    /// not touched until the previous merge is visible in the grid.
    fn dispatch_merge(&self, kind: crate::ingest::IngestKind, record: Record) -> Result<()> {
        let (done_tx, done_rx) = bounded::<()>(1);
        self.ui_tx
            .send(UiTask::Merge {
                kind,
                record,
                done: done_tx,
            })
            .map_err(|_| ShotDashError::Schedule("UI task channel closed".to_string()))?;

        match done_rx.recv_timeout(self.settings.dispatch_timeout) {
            Ok(()) => Ok(()),
            Err(RecvTimeoutError::Timeout) => Err(ShotDashError::Schedule(format!(
                "UI thread did not apply merge within {:?}",
                self.settings.dispatch_timeout
            ))),
            Err(RecvTimeoutError::Disconnected) => Err(ShotDashError::Schedule(
                "UI thread dropped the merge confirmation".to_string(),
            )),
        }
    }

    fn note(&self, note: IngestNote) {
        let _ = self.ui_tx.send(UiTask::Note(note));
    }

    /// Spawn the worker on a dedicated thread.
    pub fn spawn(self) -> std::thread::JoinHandle<()> {
        std::thread::Builder::new()
            .name("shot-ingest".to_string())
            .spawn(move || self.run())
            .expect("failed to spawn ingestion worker")
    }
}

/// Convenience for tests and callers that act as the UI thread: apply a
/// merge task to a table, confirming completion back to the worker.
pub fn apply_merge(
    table: &mut crate::table::ShotTable,
    kind: crate::ingest::IngestKind,
    record: &Record,
) -> Option<crate::table::MergeOutcome> {
    match kind {
        crate::ingest::IngestKind::Add => table.add_record(record),
        crate::ingest::IngestKind::Refresh => match table.update_record(record) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::warn!(path = %record.filepath.display(), error = %e, "refresh failed");
                None
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{ui_task_channel, IngestKind};
    use crate::table::ShotTable;
    use std::io::Write;

    fn fast_settings() -> WorkerSettings {
        WorkerSettings {
            open_retries: 1,
            retry_delay: Duration::ZERO,
            dispatch_timeout: Duration::from_secs(2),
        }
    }

    fn write_shot(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_bad_file_does_not_abort_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_shot(&dir, "good.json", r#"{"temp": 1.0}"#);
        let bad = dir.path().join("missing.json");
        let good2 = write_shot(&dir, "good2.json", r#"{"temp": 2.0}"#);

        let queue = IngestQueue::new();
        queue
            .handle()
            .enqueue_add(vec![good.clone(), bad.clone(), good2.clone()])
            .unwrap();

        let (ui_tx, ui_rx) = ui_task_channel();
        let gate = Arc::new(PauseGate::new());
        let running = Arc::new(AtomicBool::new(true));
        let worker = IngestWorker::new(queue, gate, ui_tx, running.clone(), fast_settings());

        let worker_running = running.clone();
        let handle = std::thread::spawn(move || {
            worker.run();
        });

        // Act as the UI thread
        let mut table = ShotTable::new();
        let mut failures = Vec::new();
        while table.n_rows() < 2 || failures.is_empty() {
            match ui_rx.recv_timeout(Duration::from_secs(5)).unwrap() {
                UiTask::Merge { kind, record, done } => {
                    apply_merge(&mut table, kind, &record);
                    done.send(()).unwrap();
                }
                UiTask::Note(IngestNote::ExtractionFailed { path, .. }) => {
                    failures.push(path);
                }
                UiTask::Note(other) => panic!("unexpected note {:?}", other),
            }
        }

        assert_eq!(table.n_rows(), 2);
        assert_eq!(failures, vec![bad]);
        assert_eq!(table.get_row_by_filepath(&good).unwrap(), 0);
        assert_eq!(table.get_row_by_filepath(&good2).unwrap(), 1);

        worker_running.store(false, Ordering::SeqCst);
        handle.join().unwrap();
    }

    #[test]
    fn test_dispatch_timeout_reports_batch_unprocessed() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_shot(&dir, "a.json", r#"{"temp": 1.0}"#);
        let b = write_shot(&dir, "b.json", r#"{"temp": 2.0}"#);

        let queue = IngestQueue::new();
        queue.handle().enqueue_add(vec![a.clone(), b.clone()]).unwrap();

        let (ui_tx, ui_rx) = ui_task_channel();
        let gate = Arc::new(PauseGate::new());
        let running = Arc::new(AtomicBool::new(true));
        let mut settings = fast_settings();
        settings.dispatch_timeout = Duration::from_millis(50);
        let worker = IngestWorker::new(queue, gate, ui_tx, running.clone(), settings);

        let handle = std::thread::spawn(move || worker.run());

        // Never confirm the merge; the worker must give up and report
        let mut aborted = None;
        loop {
            match ui_rx.recv_timeout(Duration::from_secs(5)).unwrap() {
                UiTask::Merge { done, .. } => drop(done),
                UiTask::Note(IngestNote::BatchAborted { remaining, .. }) => {
                    aborted = Some(remaining);
                    break;
                }
                UiTask::Note(_) => {}
            }
        }

        let remaining = aborted.unwrap();
        assert_eq!(remaining, vec![a, b]);

        running.store(false, Ordering::SeqCst);
        handle.join().unwrap();
    }
}
