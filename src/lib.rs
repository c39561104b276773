//! # shotdash: laboratory shot-file dashboard
//!
//! A desktop tool that ingests experiment result ("shot") files as they
//! arrive over the network, extracts every scalar measurement from each,
//! and aggregates them into a live, growing table.
//!
//! ## Architecture
//!
//! - **Table**: [`table::ShotTable`] is the authoritative dataset - one
//!   row per shot file, a column set that grows as new files expose new
//!   measurements, with every mutation emitting change events.
//! - **Ingestion**: an unbounded queue plus a dedicated worker thread
//!   decouple bursty network arrivals from processing; extraction runs
//!   off-thread and the merge is marshaled to the UI-owning thread.
//! - **Frontend**: eframe/egui renders the grid; a projection layer
//!   applies table change events incrementally instead of rebuilding.
//! - **Listener**: a small line-JSON TCP server accepts file-add
//!   requests and dataframe snapshot queries from other lab machines.
//! - **Communication**: crossbeam channels for thread-safe handoff.
//!
//! ## Example
//!
//! ```ignore
//! use shotdash::{
//!     config::AppConfig,
//!     frontend::ShotDashApp,
//!     ingest::{ui_task_channel, IngestQueue, IngestWorker, PauseGate},
//!     table,
//! };
//!
//! let config = AppConfig::load_or_default();
//! let shared = table::new_shared();
//! let queue = IngestQueue::new();
//! let handle = queue.handle();
//! let gate = std::sync::Arc::new(PauseGate::new());
//! let (ui_tx, ui_rx) = ui_task_channel();
//! // spawn IngestWorker with the queue, then run the eframe app with
//! // (shared, ui_rx, handle, gate)
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod frontend;
pub mod ingest;
pub mod server;
pub mod table;
pub mod types;

// Re-export commonly used types
pub use app::ShotDashApp;
pub use config::AppConfig;
pub use error::{Result, ShotDashError};
pub use ingest::{IngestKind, IngestQueue, IngestWorker, PauseGate, QueueHandle};
pub use table::{get_dataframe, ShotTable, TableEvent};
pub use types::{CellValue, ColumnId, Record};
