//! Grid projection of the shot table
//!
//! [`GridProjection`] mirrors [`ShotTable`] into the interactive grid.
//! It is a derived, read-mostly view keyed by the same column slots, and
//! it reacts to every table mutation by applying the corresponding
//! [`TableEvent`] incrementally - a single-row change never rebuilds the
//! grid.
//!
//! Cells store the dual rendering required by the display contract: a
//! short one-line string shown in the cell and the full value shown as
//! hover detail.
//!
//! Two reserved per-row pseudo-columns live here rather than in the
//! table: the "active" flag (whether the row participates in downstream
//! analysis) and the "status" percentage (progress of that analysis).
//! They are view metadata and can never collide with extracted columns.

use crate::table::{ShotTable, TableEvent};
use crate::types::{CellValue, ColumnId};
use std::cmp::Ordering;
use std::path::PathBuf;

/// Sort direction for a grid column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Display state of one column, slot-aligned with the table registry.
#[derive(Debug, Clone)]
pub struct GridColumn {
    pub id: ColumnId,
    pub label: String,
    pub visible: bool,
}

/// Dual rendering of one cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridCell {
    /// One-line text shown in the grid
    pub short: String,
    /// Full value shown as hover detail
    pub full: String,
}

impl GridCell {
    fn from_value(value: &CellValue) -> Self {
        GridCell {
            short: value.display_short(),
            full: value.display_full(),
        }
    }
}

/// Display state of one row.
#[derive(Debug, Clone)]
pub struct GridRow {
    pub filepath: PathBuf,
    /// Participates in downstream analysis
    pub active: bool,
    /// Downstream processing progress, 0-100
    pub status_percent: f32,
    /// Slot-aligned cells
    pub cells: Vec<GridCell>,
}

/// Actions the grid rendering hands back to the app for it to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridAction {
    /// A column header was clicked
    ToggleSort { slot: usize },
}

/// The interactive view-model mirroring the shot table.
#[derive(Debug, Default)]
pub struct GridProjection {
    columns: Vec<GridColumn>,
    rows: Vec<GridRow>,
    /// Display order: indices into `rows`
    order: Vec<usize>,
    sort: Option<(usize, SortDirection)>,
    /// Substring filter on row filepaths
    filter: String,
}

impl GridProjection {
    /// Build a projection mirroring the current table state.
    pub fn from_table(table: &ShotTable) -> Self {
        let mut grid = GridProjection::default();
        for meta in table.columns() {
            grid.columns.push(GridColumn {
                id: meta.id.clone(),
                label: meta.id.label(),
                visible: meta.visible,
            });
        }
        for row in table.rows() {
            grid.push_row_from(row);
        }
        grid
    }

    fn push_row_from(&mut self, row: &crate::table::Row) {
        self.rows.push(GridRow {
            filepath: row.filepath.clone(),
            active: true,
            status_percent: 0.0,
            cells: row.cells.iter().map(GridCell::from_value).collect(),
        });
        self.order.push(self.rows.len() - 1);
    }

    /// Apply one table change incrementally.
    pub fn apply(&mut self, table: &ShotTable, event: &TableEvent) {
        match *event {
            TableEvent::ColumnAdded { slot } => {
                let meta = &table.columns()[slot];
                debug_assert_eq!(slot, self.columns.len());
                self.columns.push(GridColumn {
                    id: meta.id.clone(),
                    label: meta.id.label(),
                    visible: meta.visible,
                });
                // Backfill: prior rows render the null marker here
                for row in &mut self.rows {
                    row.cells.push(GridCell::default());
                }
            }
            TableEvent::RowAdded { row } => {
                debug_assert_eq!(row, self.rows.len());
                self.push_row_from(&table.rows()[row]);
                if self.sort.is_some() {
                    self.resort(table);
                }
            }
            TableEvent::RowUpdated { row } => {
                let source = &table.rows()[row];
                let target = &mut self.rows[row];
                for (slot, value) in source.cells.iter().enumerate() {
                    let cell = GridCell::from_value(value);
                    if target.cells.get(slot) != Some(&cell) {
                        target.cells[slot] = cell;
                    }
                }
                if self.sort.is_some() {
                    self.resort(table);
                }
            }
        }
    }

    /// Apply a batch of changes.
    pub fn apply_all(&mut self, table: &ShotTable, events: &[TableEvent]) {
        for event in events {
            self.apply(table, event);
        }
    }

    /// Columns in slot order.
    pub fn columns(&self) -> &[GridColumn] {
        &self.columns
    }

    /// Rows in arrival order.
    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }

    /// Current display order (row indices after sorting).
    pub fn display_order(&self) -> &[usize] {
        &self.order
    }

    /// Row indices in display order with the filepath filter applied.
    pub fn visible_rows(&self) -> Vec<usize> {
        self.order
            .iter()
            .copied()
            .filter(|&i| self.row_matches_filter(&self.rows[i]))
            .collect()
    }

    fn row_matches_filter(&self, row: &GridRow) -> bool {
        self.filter.is_empty()
            || row
                .filepath
                .to_string_lossy()
                .to_lowercase()
                .contains(&self.filter.to_lowercase())
    }

    /// Set the filepath substring filter.
    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
    }

    /// Mutable access to the filter for the toolbar text box.
    pub fn filter_mut(&mut self) -> &mut String {
        &mut self.filter
    }

    /// Current sort, if any.
    pub fn sort(&self) -> Option<(usize, SortDirection)> {
        self.sort
    }

    /// Click behavior for a header: sort ascending, then descending,
    /// then back to arrival order.
    pub fn toggle_sort(&mut self, table: &ShotTable, slot: usize) {
        self.sort = match self.sort {
            Some((s, SortDirection::Descending)) if s == slot => None,
            Some((s, dir)) if s == slot => Some((slot, dir.flipped())),
            _ => Some((slot, SortDirection::Ascending)),
        };
        self.resort(table);
    }

    fn resort(&mut self, table: &ShotTable) {
        match self.sort {
            None => {
                self.order = (0..self.rows.len()).collect();
            }
            Some((slot, direction)) => {
                self.order = (0..self.rows.len()).collect();
                self.order.sort_by(|&a, &b| {
                    let ord = table.cell(a, slot).sort_cmp(table.cell(b, slot));
                    match direction {
                        SortDirection::Ascending => ord,
                        SortDirection::Descending => ord.reverse(),
                    }
                });
            }
        }
    }

    /// Toggle a column's display without touching the table data.
    pub fn set_column_visible(&mut self, slot: usize, visible: bool) {
        if let Some(column) = self.columns.get_mut(slot) {
            column.visible = visible;
        }
    }

    /// Set the active flag for a row.
    pub fn set_active(&mut self, row: usize, active: bool) {
        if let Some(r) = self.rows.get_mut(row) {
            r.active = active;
        }
    }

    /// Set the downstream-progress percentage for a row.
    pub fn set_status(&mut self, row: usize, percent: f32) {
        if let Some(r) = self.rows.get_mut(row) {
            r.status_percent = percent.clamp(0.0, 100.0);
        }
    }

    /// Render the grid. Header clicks come back as actions for the app
    /// to apply under the table lock.
    pub fn render(&mut self, ui: &mut egui::Ui) -> Vec<GridAction> {
        let mut actions = Vec::new();
        let visible_rows = self.visible_rows();
        let column_visible: Vec<bool> = self.columns.iter().map(|c| c.visible).collect();

        egui::ScrollArea::both()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                egui::Grid::new("shot_grid")
                    .striped(true)
                    .min_col_width(24.0)
                    .show(ui, |ui| {
                        // Header: pseudo-columns first, then visible data columns
                        ui.strong("active");
                        ui.strong("status");
                        for (slot, column) in self.columns.iter().enumerate() {
                            if !column.visible {
                                continue;
                            }
                            let marker = match self.sort {
                                Some((s, SortDirection::Ascending)) if s == slot => " ⏶",
                                Some((s, SortDirection::Descending)) if s == slot => " ⏷",
                                _ => "",
                            };
                            if ui
                                .button(format!("{}{marker}", column.label))
                                .clicked()
                            {
                                actions.push(GridAction::ToggleSort { slot });
                            }
                        }
                        ui.end_row();

                        for &row_index in &visible_rows {
                            let row = &mut self.rows[row_index];
                            ui.checkbox(&mut row.active, "");
                            ui.add(
                                egui::ProgressBar::new(row.status_percent / 100.0)
                                    .desired_width(60.0),
                            );
                            for (slot, cell) in row.cells.iter().enumerate() {
                                if !column_visible[slot] {
                                    continue;
                                }
                                let response = ui.label(&cell.short);
                                if cell.full != cell.short && !cell.full.is_empty() {
                                    response.on_hover_text(&cell.full);
                                }
                            }
                            ui.end_row();
                        }
                    });
            });

        actions
    }
}
