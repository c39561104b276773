//! The authoritative in-memory shot dataset
//!
//! This module owns the tabular data model at the center of the dashboard:
//! one row per ingested shot file, a column set that grows as new files
//! expose previously-unseen measurements, and per-column display metadata.
//!
//! # Architecture
//!
//! [`ShotTable`] is the single source of truth. Every mutation returns a
//! list of [`TableEvent`]s describing exactly what changed, and the grid
//! projection in the frontend applies those events incrementally instead
//! of rebuilding itself.
//!
//! The column set is an append-only registry: each [`ColumnId`] receives a
//! stable integer slot when it is first seen, and row cells are stored in
//! slot order. Identity-to-slot lookup is O(1) via a hash map that is
//! rebuilt only when the schema depth (`nlevels`) grows and every identity
//! has to be re-padded.
//!
//! # Threading
//!
//! The table is shared as [`SharedTable`] (`Arc<RwLock<ShotTable>>`).
//! Mutations happen only on the UI-owning thread; any thread may take a
//! read snapshot via [`get_dataframe`], which therefore never observes a
//! partially-merged state.

pub mod merge;

pub use merge::{concat_with_padding, replace_with_padding, MergeOutcome};

use crate::error::{Result, ShotDashError};
use crate::types::{CellValue, ColumnId, Record};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Per-column display metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    /// Column identity, always padded to the table's current `nlevels`
    pub id: ColumnId,
    /// Stable display slot, assigned at insertion and never reused
    pub slot: usize,
    /// Whether the column is shown in the grid
    pub visible: bool,
}

/// A structured change notification emitted by table mutations.
///
/// Consumers (the grid projection) apply these incrementally; a single
/// row ingestion never triggers a full rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    /// A new column was appended at `slot`; prior rows hold nulls there
    ColumnAdded { slot: usize },
    /// A new row was appended at `row`
    RowAdded { row: usize },
    /// The row at `row` was overwritten in place
    RowUpdated { row: usize },
}

/// One table row: the source file plus its cells in slot order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Row key; unique across the table
    pub filepath: PathBuf,
    /// Cell values, aligned with the column registry
    pub cells: Vec<CellValue>,
}

/// The authoritative dataset: one row per shot file, growing column set.
#[derive(Debug, Clone)]
pub struct ShotTable {
    /// Column registry in slot order
    columns: Vec<ColumnMeta>,
    /// O(1) identity-to-slot lookup (identities stored padded)
    slots: HashMap<ColumnId, usize>,
    /// Rows in arrival order
    rows: Vec<Row>,
    /// Row key index for idempotent updates
    row_index: HashMap<PathBuf, usize>,
    /// Current schema depth; every column identity has exactly this many segments
    nlevels: usize,
}

impl Default for ShotTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ShotTable {
    /// Create an empty table with the bootstrap `filepath` column.
    pub fn new() -> Self {
        let filepath = ColumnId::filepath(1);
        let mut slots = HashMap::new();
        slots.insert(filepath.clone(), 0);
        ShotTable {
            columns: vec![ColumnMeta {
                id: filepath,
                slot: 0,
                visible: true,
            }],
            slots,
            rows: Vec::new(),
            row_index: HashMap::new(),
            nlevels: 1,
        }
    }

    /// Current schema depth.
    pub fn nlevels(&self) -> usize {
        self.nlevels
    }

    /// Number of data rows.
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns, including the bootstrap `filepath` column.
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// The column registry in slot order.
    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    /// The rows in arrival order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// A single row by position.
    pub fn row(&self, row: usize) -> Option<&Row> {
        self.rows.get(row)
    }

    /// A single cell; `Null` for rows shorter than the registry.
    pub fn cell(&self, row: usize, slot: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.cells.get(slot))
            .unwrap_or(&CellValue::Null)
    }

    /// Slot of a column identity, at any padding depth.
    pub fn slot_of(&self, id: &ColumnId) -> Option<usize> {
        self.slots.get(&id.padded(self.nlevels)).copied()
    }

    /// Whether a file already has a row.
    pub fn contains_file(&self, path: impl AsRef<Path>) -> bool {
        self.row_index.contains_key(path.as_ref())
    }

    /// Row position of a file.
    ///
    /// Scans the row store rather than trusting the index so that a
    /// duplicate-key violation surfaces as an integrity error instead of
    /// a silent pick.
    pub fn get_row_by_filepath(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let mut found: Option<usize> = None;
        for (i, row) in self.rows.iter().enumerate() {
            if row.filepath == path {
                if let Some(first) = found {
                    return Err(ShotDashError::Integrity(format!(
                        "duplicate rows {} and {} for {}",
                        first,
                        i,
                        path.display()
                    )));
                }
                found = Some(i);
            }
        }
        found.ok_or_else(|| ShotDashError::Lookup(path.to_path_buf()))
    }

    /// Append a record as a new row; no-op if the file is already present.
    ///
    /// Returns the new row position and the change events, or `None` for
    /// the idempotent duplicate case.
    pub fn add_record(&mut self, record: &Record) -> Option<MergeOutcome> {
        if self.contains_file(&record.filepath) {
            tracing::debug!(path = %record.filepath.display(), "file already present, skipping");
            return None;
        }
        Some(concat_with_padding(self, record))
    }

    /// Re-merge a record into its existing row, refreshing stale values.
    pub fn update_record(&mut self, record: &Record) -> Result<MergeOutcome> {
        let row = self.get_row_by_filepath(&record.filepath)?;
        Ok(replace_with_padding(self, record, row))
    }

    /// Toggle a column's grid visibility. Pure metadata; stored values are
    /// untouched. Returns false if the column does not exist.
    pub fn set_column_visible(&mut self, id: &ColumnId, visible: bool) -> bool {
        match self.slot_of(id) {
            Some(slot) => {
                self.columns[slot].visible = visible;
                true
            }
            None => false,
        }
    }

    /// Serialize a snapshot for the request listener.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "nlevels": self.nlevels,
            "columns": self.columns.iter().map(|c| c.id.segments()).collect::<Vec<_>>(),
            "rows": self.rows.iter().map(|r| &r.cells).collect::<Vec<_>>(),
        })
    }

    // --- mutation primitives used by the merge functions ---

    /// Grow the schema depth, re-padding every column identity and
    /// rebuilding the slot map. Cells are unaffected; slots are stable.
    pub(crate) fn repad(&mut self, nlevels: usize) {
        if nlevels <= self.nlevels {
            return;
        }
        self.nlevels = nlevels;
        self.slots.clear();
        for meta in &mut self.columns {
            meta.id = meta.id.padded(nlevels);
            self.slots.insert(meta.id.clone(), meta.slot);
        }
    }

    /// Register a column if unseen, padding all prior rows with nulls.
    /// Returns the slot and whether the column was newly added.
    pub(crate) fn ensure_column(&mut self, id: &ColumnId) -> (usize, bool) {
        let id = id.padded(self.nlevels);
        if let Some(&slot) = self.slots.get(&id) {
            return (slot, false);
        }
        let slot = self.columns.len();
        self.slots.insert(id.clone(), slot);
        self.columns.push(ColumnMeta {
            id,
            slot,
            visible: true,
        });
        for row in &mut self.rows {
            row.cells.push(CellValue::Null);
        }
        (slot, true)
    }

    /// Append a fully-padded row.
    pub(crate) fn push_row(&mut self, row: Row) -> usize {
        debug_assert_eq!(row.cells.len(), self.columns.len());
        let index = self.rows.len();
        self.row_index.insert(row.filepath.clone(), index);
        self.rows.push(row);
        index
    }

    /// Overwrite the row at `row` with fully-padded cells.
    pub(crate) fn overwrite_row(&mut self, row: usize, cells: Vec<CellValue>) {
        debug_assert_eq!(cells.len(), self.columns.len());
        self.rows[row].cells = cells;
    }
}

/// Thread-shared handle to the table. Writes happen only on the UI
/// thread; reads are safe from anywhere.
pub type SharedTable = Arc<RwLock<ShotTable>>;

/// Create a fresh shared table.
pub fn new_shared() -> SharedTable {
    Arc::new(RwLock::new(ShotTable::new()))
}

/// Synchronous, thread-safe snapshot of the current table.
///
/// Because all writers run on the UI thread under the write lock, a
/// reader sees either the pre-merge or post-merge state, never a torn
/// intermediate.
pub fn get_dataframe(table: &SharedTable) -> ShotTable {
    table
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;

    fn record(path: &str, values: &[(&[&str], CellValue)]) -> Record {
        let mut rec = Record::new(path);
        for (segments, value) in values {
            rec.insert(ColumnId::new(segments.iter().copied()), value.clone());
        }
        rec
    }

    #[test]
    fn test_new_table_has_bootstrap_column() {
        let table = ShotTable::new();
        assert_eq!(table.n_rows(), 0);
        assert_eq!(table.n_columns(), 1);
        assert_eq!(table.nlevels(), 1);
        assert_eq!(table.columns()[0].id, ColumnId::filepath(1));
    }

    #[test]
    fn test_add_record_is_idempotent() {
        let mut table = ShotTable::new();
        let rec = record("/a.h5", &[(&["temp"], CellValue::Float(1.0))]);

        assert!(table.add_record(&rec).is_some());
        assert!(table.add_record(&rec).is_none());
        assert_eq!(table.n_rows(), 1);
    }

    #[test]
    fn test_get_row_by_filepath() {
        let mut table = ShotTable::new();
        table.add_record(&record("/a.h5", &[])).unwrap();
        assert_eq!(table.get_row_by_filepath("/a.h5").unwrap(), 0);

        table.add_record(&record("/b.h5", &[])).unwrap();
        assert_eq!(table.get_row_by_filepath("/b.h5").unwrap(), 1);

        match table.get_row_by_filepath("/missing.h5") {
            Err(ShotDashError::Lookup(path)) => {
                assert_eq!(path, PathBuf::from("/missing.h5"));
            }
            other => panic!("expected lookup error, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_rows_are_an_integrity_error() {
        let mut table = ShotTable::new();
        table.add_record(&record("/a.h5", &[])).unwrap();
        // Force the invariant violation directly
        let dup = table.rows()[0].clone();
        table.rows.push(dup);

        assert!(matches!(
            table.get_row_by_filepath("/a.h5"),
            Err(ShotDashError::Integrity(_))
        ));
    }

    #[test]
    fn test_update_record_requires_existing_row() {
        let mut table = ShotTable::new();
        let rec = record("/a.h5", &[(&["temp"], CellValue::Float(1.0))]);
        assert!(matches!(
            table.update_record(&rec),
            Err(ShotDashError::Lookup(_))
        ));
    }

    #[test]
    fn test_update_record_refreshes_in_place() {
        let mut table = ShotTable::new();
        table
            .add_record(&record("/a.h5", &[(&["temp"], CellValue::Float(1.0))]))
            .unwrap();
        table.add_record(&record("/b.h5", &[])).unwrap();

        let outcome = table
            .update_record(&record("/a.h5", &[(&["temp"], CellValue::Float(2.0))]))
            .unwrap();
        assert_eq!(outcome.row, 0);
        assert_eq!(table.n_rows(), 2);

        let slot = table.slot_of(&ColumnId::single("temp")).unwrap();
        assert_eq!(table.cell(0, slot), &CellValue::Float(2.0));
    }

    #[test]
    fn test_set_column_visible_is_metadata_only() {
        let mut table = ShotTable::new();
        table
            .add_record(&record("/a.h5", &[(&["temp"], CellValue::Float(1.0))]))
            .unwrap();

        let id = ColumnId::single("temp");
        assert!(table.set_column_visible(&id, false));
        let slot = table.slot_of(&id).unwrap();
        assert!(!table.columns()[slot].visible);
        assert_eq!(table.cell(0, slot), &CellValue::Float(1.0));

        assert!(!table.set_column_visible(&ColumnId::single("nope"), false));
    }

    #[test]
    fn test_visibility_survives_repad() {
        let mut table = ShotTable::new();
        table
            .add_record(&record("/a.h5", &[(&["temp"], CellValue::Float(1.0))]))
            .unwrap();
        table.set_column_visible(&ColumnId::single("temp"), false);

        // Deeper record forces a repad of every identity
        table
            .add_record(&record(
                "/b.h5",
                &[(&["laser", "power"], CellValue::Float(3.5))],
            ))
            .unwrap();

        assert_eq!(table.nlevels(), 2);
        let slot = table.slot_of(&ColumnId::single("temp")).unwrap();
        assert!(!table.columns()[slot].visible);
    }

    #[test]
    fn test_snapshot_from_any_thread() {
        let shared = new_shared();
        {
            let mut table = shared.write().unwrap();
            table
                .add_record(&record("/a.h5", &[(&["temp"], CellValue::Float(1.0))]))
                .unwrap();
        }
        let shared2 = shared.clone();
        let snapshot = std::thread::spawn(move || get_dataframe(&shared2))
            .join()
            .unwrap();
        assert_eq!(snapshot.n_rows(), 1);
    }

    #[test]
    fn test_to_json_shape() {
        let mut table = ShotTable::new();
        table
            .add_record(&record("/a.h5", &[(&["temp"], CellValue::Float(1.0))]))
            .unwrap();
        let json = table.to_json();
        assert_eq!(json["nlevels"], 1);
        assert_eq!(json["columns"].as_array().unwrap().len(), 2);
        assert_eq!(json["rows"].as_array().unwrap().len(), 1);
    }
}
