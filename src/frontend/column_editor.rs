//! Column visibility editor
//!
//! A secondary controlling surface for the grid: filter columns by a
//! name substring, toggle them individually, or bulk-toggle the whole
//! filtered set. A tri-state summary (all / none / mixed) is recomputed
//! after every visibility change.
//!
//! The editor emits actions rather than mutating state itself; the app
//! applies each action to both the table metadata and the grid
//! projection so the two never diverge.

use crate::frontend::grid::GridColumn;
use crate::types::ColumnId;

/// Aggregate visibility of the filtered column set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisibilitySummary {
    #[default]
    All,
    None,
    Mixed,
}

impl VisibilitySummary {
    /// Label for the summary indicator.
    pub fn label(&self) -> &'static str {
        match self {
            VisibilitySummary::All => "all shown",
            VisibilitySummary::None => "all hidden",
            VisibilitySummary::Mixed => "mixed",
        }
    }
}

/// Visibility changes requested by the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnAction {
    SetVisible { id: ColumnId, visible: bool },
}

/// State for the column editor window.
#[derive(Debug, Default)]
pub struct ColumnEditorState {
    /// Substring filter over column labels (case-insensitive)
    pub filter: String,
    /// Tri-state summary of the filtered set
    pub summary: VisibilitySummary,
}

impl ColumnEditorState {
    /// Slots whose labels match the current filter.
    pub fn filtered_slots(&self, columns: &[GridColumn]) -> Vec<usize> {
        let needle = self.filter.to_lowercase();
        columns
            .iter()
            .enumerate()
            .filter(|(_, c)| needle.is_empty() || c.label.to_lowercase().contains(&needle))
            .map(|(slot, _)| slot)
            .collect()
    }

    /// Recompute the tri-state summary over the filtered set.
    pub fn recompute_summary(&mut self, columns: &[GridColumn]) {
        let slots = self.filtered_slots(columns);
        let shown = slots.iter().filter(|&&s| columns[s].visible).count();
        self.summary = if slots.is_empty() || shown == slots.len() {
            VisibilitySummary::All
        } else if shown == 0 {
            VisibilitySummary::None
        } else {
            VisibilitySummary::Mixed
        };
    }

    /// Render the editor contents; returns the requested changes.
    pub fn render(&mut self, ui: &mut egui::Ui, columns: &[GridColumn]) -> Vec<ColumnAction> {
        let mut actions = Vec::new();

        ui.horizontal(|ui| {
            ui.label("Filter:");
            ui.text_edit_singleline(&mut self.filter);
            ui.label(self.summary.label());
        });
        ui.separator();

        let slots = self.filtered_slots(columns);

        ui.horizontal(|ui| {
            if ui.button("Show all").clicked() {
                for &slot in &slots {
                    actions.push(ColumnAction::SetVisible {
                        id: columns[slot].id.clone(),
                        visible: true,
                    });
                }
            }
            if ui.button("Hide all").clicked() {
                for &slot in &slots {
                    actions.push(ColumnAction::SetVisible {
                        id: columns[slot].id.clone(),
                        visible: false,
                    });
                }
            }
        });

        egui::ScrollArea::vertical().show(ui, |ui| {
            for &slot in &slots {
                let column = &columns[slot];
                let mut visible = column.visible;
                if ui.checkbox(&mut visible, &column.label).changed() {
                    actions.push(ColumnAction::SetVisible {
                        id: column.id.clone(),
                        visible,
                    });
                }
            }
        });

        actions
    }
}
