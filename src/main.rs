//! Shot Dashboard - Main Entry Point
//!
//! Wires the pieces together: configuration, the shared table, the
//! ingestion queue and worker thread, the network request listener, and
//! the eframe application on the main (UI-owning) thread.

use anyhow::Context;
use shotdash::config::AppConfig;
use shotdash::frontend::ShotDashApp;
use shotdash::ingest::worker::WorkerSettings;
use shotdash::ingest::{ui_task_channel, IngestQueue, IngestWorker, PauseGate};
use shotdash::server::RequestListener;
use shotdash::table;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,shotdash=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting shot dashboard");

    let config = AppConfig::load_or_default();

    // Shared state: the table, the queue, and the pause gate
    let shared_table = table::new_shared();
    let queue = IngestQueue::new();
    let queue_handle = queue.handle();
    let gate = Arc::new(PauseGate::new());
    let running = Arc::new(AtomicBool::new(true));
    let (ui_tx, ui_rx) = ui_task_channel();

    // Ingestion worker thread
    let worker = IngestWorker::new(
        queue,
        gate.clone(),
        ui_tx,
        running.clone(),
        WorkerSettings {
            open_retries: config.ingest.open_retries,
            retry_delay: config.ingest.retry_delay(),
            dispatch_timeout: config.ingest.dispatch_timeout(),
        },
    );
    let worker_handle = worker.spawn();

    // Network request listener thread
    let listener = RequestListener::bind(
        config.server.port,
        shared_table.clone(),
        queue_handle.clone(),
        config.paths.clone(),
    )
    .context("failed to bind request listener")?;
    listener.spawn();

    // Run the eframe application on this thread
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 480.0])
            .with_title("Shot Dashboard"),
        ..Default::default()
    };

    let result = eframe::run_native(
        "Shot Dashboard",
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(ShotDashApp::new(
                cc,
                config,
                shared_table,
                ui_rx,
                queue_handle,
                gate,
            )))
        }),
    );

    tracing::info!("shutting down");
    running.store(false, Ordering::SeqCst);
    let _ = worker_handle.join();

    result.map_err(|e| anyhow::anyhow!("eframe error: {e}"))
}
