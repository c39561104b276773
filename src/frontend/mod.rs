//! Frontend module for the egui UI
//!
//! The frontend owns the interactive grid and is the only place the
//! shot table is ever mutated. The ingestion worker hands extracted
//! records over a channel; every frame the app drains pending tasks,
//! applies each merge under the table's write lock, replays the change
//! events against the grid projection, and confirms completion back to
//! the (blocked) worker.
//!
//! # Main Types
//!
//! - [`ShotDashApp`] - Main application state implementing [`eframe::App`]
//! - [`GridProjection`] - Incremental mirror of the table (in `grid`)
//! - [`ColumnEditorState`] - Column visibility editor (in `column_editor`)

pub mod column_editor;
pub mod grid;
pub mod status_bar;

pub use column_editor::{ColumnAction, ColumnEditorState, VisibilitySummary};
pub use grid::{GridAction, GridProjection, SortDirection};

use crate::config::AppConfig;
use crate::ingest::worker::apply_merge;
use crate::ingest::{IngestNote, PauseGate, QueueHandle, UiTask};
use crate::table::SharedTable;
use chrono::{DateTime, Local};
use crossbeam_channel::Receiver;
use std::sync::Arc;
use std::time::Duration;

/// Main application state for the shot dashboard.
pub struct ShotDashApp {
    config: AppConfig,

    // === Data ===
    table: SharedTable,
    grid: GridProjection,

    // === Pipeline handles ===
    ui_rx: Receiver<UiTask>,
    queue: QueueHandle,
    gate: Arc<PauseGate>,

    // === Dialogs and status ===
    column_editor_open: bool,
    column_editor: ColumnEditorState,
    last_ingest: Option<DateTime<Local>>,
    last_error: Option<String>,
}

impl ShotDashApp {
    /// Create the application, mirroring whatever is already in the table.
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        table: SharedTable,
        ui_rx: Receiver<UiTask>,
        queue: QueueHandle,
        gate: Arc<PauseGate>,
    ) -> Self {
        let grid = {
            let table = table
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            GridProjection::from_table(&table)
        };
        ShotDashApp {
            config,
            table,
            grid,
            ui_rx,
            queue,
            gate,
            column_editor_open: false,
            column_editor: ColumnEditorState::default(),
            last_ingest: None,
            last_error: None,
        }
    }

    /// Apply all pending worker tasks. Each merge is confirmed back to
    /// the worker only after the grid reflects it.
    fn drain_ui_tasks(&mut self) {
        while let Ok(task) = self.ui_rx.try_recv() {
            match task {
                UiTask::Merge { kind, record, done } => {
                    let events = {
                        let mut table = self
                            .table
                            .write()
                            .unwrap_or_else(|poisoned| poisoned.into_inner());
                        apply_merge(&mut table, kind, &record).map(|outcome| outcome.events)
                    };
                    if let Some(events) = events {
                        let table = self
                            .table
                            .read()
                            .unwrap_or_else(|poisoned| poisoned.into_inner());
                        self.grid.apply_all(&table, &events);
                        drop(table);
                        self.column_editor.recompute_summary(self.grid.columns());
                        self.last_ingest = Some(Local::now());
                    }
                    let _ = done.send(());
                }
                UiTask::Note(note) => self.apply_note(note),
            }
        }
    }

    fn apply_note(&mut self, note: IngestNote) {
        match note {
            IngestNote::ExtractionFailed { path, error } => {
                self.last_error = Some(format!("{}: {error}", path.display()));
            }
            IngestNote::BatchAborted { remaining, error } => {
                self.last_error = Some(format!(
                    "batch aborted, {} file(s) unprocessed: {error}",
                    remaining.len()
                ));
            }
        }
    }

    fn apply_column_actions(&mut self, actions: Vec<ColumnAction>) {
        if actions.is_empty() {
            return;
        }
        let mut table = self
            .table
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for action in actions {
            match action {
                ColumnAction::SetVisible { id, visible } => {
                    if table.set_column_visible(&id, visible) {
                        if let Some(slot) = table.slot_of(&id) {
                            self.grid.set_column_visible(slot, visible);
                        }
                    }
                }
            }
        }
        drop(table);
        self.column_editor.recompute_summary(self.grid.columns());
    }

    fn apply_grid_actions(&mut self, actions: Vec<GridAction>) {
        for action in actions {
            match action {
                GridAction::ToggleSort { slot } => {
                    let table = self
                        .table
                        .read()
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                    self.grid.toggle_sort(&table, slot);
                }
            }
        }
    }

    fn render_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let pause_label = if self.gate.is_paused() {
                "▶ Resume"
            } else {
                "⏸ Pause"
            };
            if ui.button(pause_label).clicked() {
                if self.gate.is_paused() {
                    self.gate.resume();
                } else {
                    self.gate.pause();
                }
            }

            if ui.button("Add shots…").clicked() {
                let files = rfd::FileDialog::new()
                    .set_directory(&self.config.paths.shot_storage)
                    .pick_files();
                if let Some(files) = files {
                    if let Err(e) = self.queue.enqueue_add(files) {
                        self.last_error = Some(e.to_string());
                    }
                }
            }

            if ui.button("Refresh all").clicked() {
                let paths: Vec<_> = {
                    let table = self
                        .table
                        .read()
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                    table.rows().iter().map(|r| r.filepath.clone()).collect()
                };
                if !paths.is_empty() {
                    if let Err(e) = self.queue.enqueue_refresh(paths) {
                        self.last_error = Some(e.to_string());
                    }
                }
            }

            if ui.button("Columns…").clicked() {
                self.column_editor_open = !self.column_editor_open;
            }

            ui.separator();
            ui.label("Filter:");
            ui.text_edit_singleline(self.grid.filter_mut());
        });
    }
}

impl eframe::App for ShotDashApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Blocked worker dispatches must be picked up even when the UI is
        // otherwise idle.
        ctx.request_repaint_after(Duration::from_millis(50));

        self.drain_ui_tasks();

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.render_toolbar(ui);
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            let (rows, columns) = {
                let table = self
                    .table
                    .read()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                (table.n_rows(), table.n_columns())
            };
            status_bar::render(
                ui,
                &status_bar::StatusInfo {
                    rows,
                    columns,
                    queue_depth: self.queue.depth(),
                    paused: self.gate.is_paused(),
                    last_ingest: self.last_ingest,
                    last_error: self.last_error.as_deref(),
                },
            );
        });

        let mut column_actions = Vec::new();
        let mut editor_open = self.column_editor_open;
        egui::Window::new("Edit columns")
            .open(&mut editor_open)
            .show(ctx, |ui| {
                column_actions = self.column_editor.render(ui, self.grid.columns());
            });
        self.column_editor_open = editor_open;
        self.apply_column_actions(column_actions);

        let mut grid_actions = Vec::new();
        egui::CentralPanel::default().show(ctx, |ui| {
            grid_actions = self.grid.render(ui);
        });
        self.apply_grid_actions(grid_actions);
    }
}
