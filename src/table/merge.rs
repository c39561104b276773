//! Column-union merge of a record into the table
//!
//! Both operations share the same padding logic: the result column set is
//! the union of the table's and the record's, the result `nlevels` is the
//! max of the two, columns the record lacks are padded with the null
//! marker, and columns the table lacks are appended to the registry (all
//! prior rows receiving nulls there).
//!
//! New columns are assigned display slots in sorted identity order. The
//! record stores its values in a sorted map, so the slot layout for a
//! given input set is reproducible across runs regardless of extraction
//! order.

use crate::table::{Row, ShotTable, TableEvent};
use crate::types::{CellValue, Record};

/// Result of a merge: the affected row plus the change events to replay
/// against the grid projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Row position that was appended or overwritten
    pub row: usize,
    /// Changes in application order (columns before rows)
    pub events: Vec<TableEvent>,
}

/// Append `record` as a new row, expanding the column set as needed.
pub fn concat_with_padding(table: &mut ShotTable, record: &Record) -> MergeOutcome {
    let mut events = merge_schema(table, record);
    let cells = padded_cells(table, record);
    let row = table.push_row(Row {
        filepath: record.filepath.clone(),
        cells,
    });
    events.push(TableEvent::RowAdded { row });
    MergeOutcome { row, events }
}

/// Overwrite the row at `row` with `record`, expanding the column set as
/// needed. Same union/padding semantics as [`concat_with_padding`].
pub fn replace_with_padding(table: &mut ShotTable, record: &Record, row: usize) -> MergeOutcome {
    debug_assert_eq!(
        table.row(row).map(|r| r.filepath.as_path()),
        Some(record.filepath.as_path()),
        "replacement row key mismatch"
    );
    let mut events = merge_schema(table, record);
    let cells = padded_cells(table, record);
    table.overwrite_row(row, cells);
    events.push(TableEvent::RowUpdated { row });
    MergeOutcome { row, events }
}

/// Union the record's columns into the table schema, growing `nlevels`
/// first so every registered identity stays fully padded.
fn merge_schema(table: &mut ShotTable, record: &Record) -> Vec<TableEvent> {
    table.repad(record.nlevels());
    let mut events = Vec::new();
    for id in record.values.keys() {
        let (slot, added) = table.ensure_column(id);
        if added {
            events.push(TableEvent::ColumnAdded { slot });
        }
    }
    events
}

/// Build a full-width cell vector for the record: nulls everywhere the
/// record has no value, the filepath in the bootstrap column.
fn padded_cells(table: &ShotTable, record: &Record) -> Vec<CellValue> {
    let mut cells = vec![CellValue::Null; table.n_columns()];
    let filepath_slot = table
        .slot_of(&crate::types::ColumnId::filepath(1))
        .unwrap_or(0);
    cells[filepath_slot] = CellValue::Text(record.filepath.display().to_string());
    for (id, value) in &record.values {
        if let Some(slot) = table.slot_of(id) {
            cells[slot] = value.clone();
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnId;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn record(path: &str, values: &[(&[&str], f64)]) -> Record {
        let mut rec = Record::new(path);
        for (segments, v) in values {
            rec.insert(
                ColumnId::new(segments.iter().copied()),
                CellValue::Float(*v),
            );
        }
        rec
    }

    #[test]
    fn test_concat_unions_columns_and_pads() {
        // file1 has {filepath, temp}; file2 has {filepath, temp, pressure}
        let mut table = ShotTable::new();
        concat_with_padding(&mut table, &record("/f1.h5", &[(&["temp"], 1.0)]));
        concat_with_padding(
            &mut table,
            &record("/f2.h5", &[(&["temp"], 2.0), (&["pressure"], 3.0)]),
        );

        let labels: BTreeSet<String> = table.columns().iter().map(|c| c.id.label()).collect();
        assert_eq!(
            labels,
            BTreeSet::from(["filepath".into(), "temp".into(), "pressure".into()])
        );

        let pressure = table.slot_of(&ColumnId::single("pressure")).unwrap();
        let temp = table.slot_of(&ColumnId::single("temp")).unwrap();
        assert_eq!(table.cell(0, pressure), &CellValue::Null);
        assert_eq!(table.cell(0, temp), &CellValue::Float(1.0));
        assert_eq!(table.cell(1, pressure), &CellValue::Float(3.0));
        assert_eq!(table.cell(1, temp), &CellValue::Float(2.0));
    }

    #[test]
    fn test_concat_union_in_either_order() {
        let wide = record("/w.h5", &[(&["temp"], 2.0), (&["pressure"], 3.0)]);
        let narrow = record("/n.h5", &[(&["temp"], 1.0)]);

        let mut ab = ShotTable::new();
        concat_with_padding(&mut ab, &narrow);
        concat_with_padding(&mut ab, &wide);

        let mut ba = ShotTable::new();
        concat_with_padding(&mut ba, &wide);
        concat_with_padding(&mut ba, &narrow);

        let cols = |t: &ShotTable| -> BTreeSet<ColumnId> {
            t.columns().iter().map(|c| c.id.clone()).collect()
        };
        assert_eq!(cols(&ab), cols(&ba));
        assert_eq!(ab.n_rows(), 2);
        assert_eq!(ba.n_rows(), 2);
    }

    #[test]
    fn test_nlevels_is_max_of_operands() {
        let mut table = ShotTable::new();
        assert_eq!(table.nlevels(), 1);

        concat_with_padding(&mut table, &record("/a.h5", &[(&["temp"], 1.0)]));
        assert_eq!(table.nlevels(), 1);

        concat_with_padding(&mut table, &record("/b.h5", &[(&["laser", "power"], 2.0)]));
        assert_eq!(table.nlevels(), 2);

        // Shallower record never shrinks the depth
        concat_with_padding(&mut table, &record("/c.h5", &[(&["temp"], 3.0)]));
        assert_eq!(table.nlevels(), 2);
    }

    #[test]
    fn test_all_identities_padded_to_nlevels_after_merge() {
        let mut table = ShotTable::new();
        concat_with_padding(&mut table, &record("/a.h5", &[(&["temp"], 1.0)]));
        concat_with_padding(
            &mut table,
            &record("/b.h5", &[(&["mot", "coil", "current"], 2.0)]),
        );

        assert_eq!(table.nlevels(), 3);
        for meta in table.columns() {
            assert_eq!(meta.id.depth(), 3, "column {} not repadded", meta.id);
        }
        // Padded and unpadded lookups agree
        assert_eq!(
            table.slot_of(&ColumnId::single("temp")),
            table.slot_of(&ColumnId::new(["temp", "", ""]))
        );
    }

    #[test]
    fn test_new_columns_get_slots_in_sorted_order() {
        let mut table = ShotTable::new();
        // Insertion order in the record is irrelevant: the sorted map
        // drives slot assignment.
        let mut rec = Record::new("/a.h5");
        rec.insert(ColumnId::single("zeta"), CellValue::Float(1.0));
        rec.insert(ColumnId::single("alpha"), CellValue::Float(2.0));
        rec.insert(ColumnId::single("mid"), CellValue::Float(3.0));
        concat_with_padding(&mut table, &rec);

        let labels: Vec<String> = table
            .columns()
            .iter()
            .skip(1) // bootstrap filepath column
            .map(|c| c.id.label())
            .collect();
        assert_eq!(labels, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_events_report_columns_before_row() {
        let mut table = ShotTable::new();
        let outcome = concat_with_padding(&mut table, &record("/a.h5", &[(&["temp"], 1.0)]));

        assert_eq!(outcome.row, 0);
        assert_eq!(
            outcome.events,
            vec![
                TableEvent::ColumnAdded { slot: 1 },
                TableEvent::RowAdded { row: 0 }
            ]
        );

        // A second file with the same columns adds no column events
        let outcome = concat_with_padding(&mut table, &record("/b.h5", &[(&["temp"], 2.0)]));
        assert_eq!(outcome.events, vec![TableEvent::RowAdded { row: 1 }]);
    }

    #[test]
    fn test_replace_pads_missing_columns_with_null() {
        let mut table = ShotTable::new();
        concat_with_padding(
            &mut table,
            &record("/a.h5", &[(&["temp"], 1.0), (&["pressure"], 2.0)]),
        );

        let outcome = replace_with_padding(&mut table, &record("/a.h5", &[(&["temp"], 9.0)]), 0);
        assert_eq!(outcome.events, vec![TableEvent::RowUpdated { row: 0 }]);

        let temp = table.slot_of(&ColumnId::single("temp")).unwrap();
        let pressure = table.slot_of(&ColumnId::single("pressure")).unwrap();
        assert_eq!(table.cell(0, temp), &CellValue::Float(9.0));
        assert_eq!(table.cell(0, pressure), &CellValue::Null);
        assert_eq!(table.n_rows(), 1);
    }

    #[test]
    fn test_filepath_cell_is_populated() {
        let mut table = ShotTable::new();
        concat_with_padding(&mut table, &record("/shots/a.h5", &[(&["temp"], 1.0)]));
        assert_eq!(
            table.cell(0, 0),
            &CellValue::Text("/shots/a.h5".to_string())
        );
    }

    proptest! {
        /// Row count equals the number of distinct filepaths, every row is
        /// full width, and every identity is padded to the final nlevels.
        #[test]
        fn prop_merge_invariants(
            files in proptest::collection::vec(
                (
                    "[a-z]{1,6}",
                    proptest::collection::btree_map(
                        proptest::collection::vec("[a-z]{1,4}", 1..3),
                        -1e6f64..1e6f64,
                        0..5,
                    ),
                ),
                1..12,
            )
        ) {
            let mut table = ShotTable::new();
            let mut distinct = BTreeSet::new();
            for (name, values) in &files {
                let path = format!("/shots/{name}.h5");
                let mut rec = Record::new(&path);
                for (segments, v) in values {
                    rec.insert(ColumnId::new(segments.iter().cloned()), CellValue::Float(*v));
                }
                table.add_record(&rec);
                distinct.insert(path);
            }

            prop_assert_eq!(table.n_rows(), distinct.len());
            for meta in table.columns() {
                prop_assert_eq!(meta.id.depth(), table.nlevels());
            }
            for row in table.rows() {
                prop_assert_eq!(row.cells.len(), table.n_columns());
            }
        }
    }
}
