//! Core data types for the shot dashboard
//!
//! This module contains the fundamental data structures used throughout
//! the application for representing extracted shot data.
//!
//! # Main Types
//!
//! - [`ColumnId`] - Hierarchical column identity (tuple of name segments)
//! - [`CellValue`] - A single table cell: float, text, or an explicit null
//! - [`Record`] - One shot file's extracted scalars as a single row
//!
//! # Column Identities
//!
//! Shot files expose hierarchical scalar names such as `laser/power` or
//! `mot/detuning`. A [`ColumnId`] stores the segments of such a name. The
//! table keeps every identity right-padded with empty segments to a common
//! depth (`nlevels`), so `("filepath",)` becomes `("filepath", "")` once a
//! two-level column exists anywhere in the table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the bootstrap column every table starts with.
pub const FILEPATH_COLUMN: &str = "filepath";

/// Hierarchical identity of a table column.
///
/// Ordering is lexicographic over the segments, which gives the
/// deterministic column layout used when assigning display slots.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnId(Vec<String>);

impl ColumnId {
    /// Create an identity from name segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        debug_assert!(!segments.is_empty(), "column identity needs a name");
        ColumnId(segments)
    }

    /// A single-level identity.
    pub fn single(name: impl Into<String>) -> Self {
        ColumnId(vec![name.into()])
    }

    /// The bootstrap `filepath` identity at the given depth.
    pub fn filepath(nlevels: usize) -> Self {
        ColumnId::single(FILEPATH_COLUMN).padded(nlevels)
    }

    /// Number of segments, including padding.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Number of segments with trailing padding stripped.
    pub fn significant_depth(&self) -> usize {
        self.0
            .iter()
            .rposition(|s| !s.is_empty())
            .map_or(1, |i| i + 1)
    }

    /// This identity right-padded with empty segments to `nlevels`.
    pub fn padded(&self, nlevels: usize) -> Self {
        let mut segments = self.0.clone();
        segments.resize(nlevels.max(segments.len()), String::new());
        ColumnId(segments)
    }

    /// The identity's segments.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Human-readable label: non-empty segments joined with `/`.
    pub fn label(&self) -> String {
        self.0
            .iter()
            .filter(|s| !s.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A single table cell.
///
/// `Null` is the explicit null marker: a cell whose column exists in the
/// schema but for which the row's shot file had no value. It is distinct
/// from zero and from the empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// Explicit "no value" marker
    Null,
    /// Numeric scalar
    Float(f64),
    /// Text scalar
    Text(String),
}

impl CellValue {
    /// Whether this is the null marker.
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Short, one-line rendering for a grid cell.
    ///
    /// Non-integral floats use fixed-significant-figure scientific form;
    /// multi-line or long text is truncated to a one-line summary. The
    /// full value remains available via [`CellValue::display_full`].
    pub fn display_short(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Float(v) => format_compact(*v),
            CellValue::Text(s) => summarize_text(s),
        }
    }

    /// Full-fidelity rendering, suitable for a tooltip or detail view.
    pub fn display_full(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Float(v) => {
                if v.fract() == 0.0 && v.is_finite() && v.abs() < 1e15 {
                    format!("{}", *v as i64)
                } else {
                    format!("{v}")
                }
            }
            CellValue::Text(s) => s.clone(),
        }
    }

    /// Ordering used by grid sorting: nulls first, then numbers by value,
    /// then text lexicographically.
    pub fn sort_cmp(&self, other: &CellValue) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (self, other) {
            (CellValue::Null, CellValue::Null) => Ordering::Equal,
            (CellValue::Null, _) => Ordering::Less,
            (_, CellValue::Null) => Ordering::Greater,
            (CellValue::Float(a), CellValue::Float(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (CellValue::Float(_), CellValue::Text(_)) => Ordering::Less,
            (CellValue::Text(_), CellValue::Float(_)) => Ordering::Greater,
            (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
        }
    }
}

/// Compact rendering for numeric cells.
///
/// Integral values render as plain integers; everything else uses
/// five-significant-figure scientific notation so wildly different
/// magnitudes stay scannable in a fixed-width column.
pub fn format_compact(v: f64) -> String {
    if !v.is_finite() {
        return format!("{v}");
    }
    if v.fract() == 0.0 && v.abs() < 1e12 {
        return format!("{}", v as i64);
    }
    format!("{v:.4e}")
}

/// One-line summary of a text value; the full value is kept elsewhere.
fn summarize_text(s: &str) -> String {
    const MAX_LEN: usize = 60;
    let first_line = s.lines().next().unwrap_or("");
    let truncated = first_line.chars().count() > MAX_LEN || first_line.len() < s.len();
    if truncated {
        let cut: String = first_line.chars().take(MAX_LEN).collect();
        format!("{cut}…")
    } else {
        first_line.to_string()
    }
}

/// One shot file's extracted scalar data: a single future table row.
///
/// Values are keyed by natural (unpadded) column identity in a sorted map,
/// which is what makes new-column slot assignment deterministic across runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Source file; doubles as the row key in the table.
    pub filepath: PathBuf,
    /// Extracted scalars, sorted by column identity.
    pub values: std::collections::BTreeMap<ColumnId, CellValue>,
}

impl Record {
    /// Create an empty record for a file.
    pub fn new(filepath: impl AsRef<Path>) -> Self {
        Record {
            filepath: filepath.as_ref().to_path_buf(),
            values: std::collections::BTreeMap::new(),
        }
    }

    /// Insert a scalar value.
    pub fn insert(&mut self, id: ColumnId, value: CellValue) {
        self.values.insert(id, value);
    }

    /// Maximum identity depth among this record's columns (at least 1,
    /// the depth of the implicit `filepath` column).
    pub fn nlevels(&self) -> usize {
        self.values.keys().map(ColumnId::depth).max().unwrap_or(1)
    }
}
