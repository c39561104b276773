//! Bottom status bar

use chrono::{DateTime, Local};

/// Snapshot of the figures the status bar shows.
pub struct StatusInfo<'a> {
    pub rows: usize,
    pub columns: usize,
    pub queue_depth: usize,
    pub paused: bool,
    pub last_ingest: Option<DateTime<Local>>,
    pub last_error: Option<&'a str>,
}

/// Render the status line.
pub fn render(ui: &mut egui::Ui, info: &StatusInfo<'_>) {
    ui.horizontal(|ui| {
        ui.label(format!("{} shots", info.rows));
        ui.separator();
        ui.label(format!("{} columns", info.columns));
        ui.separator();
        ui.label(format!("queue: {}", info.queue_depth));
        if info.paused {
            ui.separator();
            ui.colored_label(egui::Color32::YELLOW, "paused");
        }
        if let Some(at) = info.last_ingest {
            ui.separator();
            ui.label(format!("last shot {}", at.format("%H:%M:%S")));
        }
        if let Some(error) = info.last_error {
            ui.separator();
            ui.colored_label(egui::Color32::LIGHT_RED, error);
        }
    });
}
