//! Parsed tables and sheet results

use crate::types::{Dtype, Label, Value};
use indexmap::IndexMap;

/// A named, uniformly typed column
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Column {
    pub label: Label,
    pub dtype: Dtype,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(label: Label, dtype: Dtype, values: Vec<Value>) -> Self {
        Column {
            label,
            dtype,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One level of row labels
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IndexLevel {
    pub name: Option<String>,
    pub dtype: Dtype,
    pub values: Vec<Value>,
}

/// Table of named columns with optional row labels.
///
/// An empty `index` means the default `0..n_rows` row numbering.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Table {
    columns: Vec<Column>,
    index: Vec<IndexLevel>,
    /// Names of the header levels (multi-level headers only)
    column_names: Vec<Option<String>>,
    rows: usize,
}

impl Table {
    pub(crate) fn new(
        columns: Vec<Column>,
        index: Vec<IndexLevel>,
        column_names: Vec<Option<String>>,
        rows: usize,
    ) -> Self {
        debug_assert!(columns.iter().all(|c| c.len() == rows));
        debug_assert!(index.iter().all(|l| l.values.len() == rows));
        Table {
            columns,
            index,
            column_names,
            rows,
        }
    }

    /// Table with no rows and no columns
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn n_rows(&self) -> usize {
        self.rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// No rows (columns may still be present)
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_labels(&self) -> Vec<&Label> {
        self.columns.iter().map(|c| &c.label).collect()
    }

    /// Look up a column by label
    pub fn column(&self, label: impl Into<Label>) -> Option<&Column> {
        let label = label.into();
        self.columns.iter().find(|c| c.label == label)
    }

    /// Row labels; empty for the default numbering
    pub fn index(&self) -> &[IndexLevel] {
        &self.index
    }

    pub fn index_names(&self) -> Vec<Option<&str>> {
        self.index.iter().map(|l| l.name.as_deref()).collect()
    }

    /// Names of the column header levels
    pub fn column_names(&self) -> &[Option<String>] {
        &self.column_names
    }

    /// Values of one row, in column order
    pub fn row(&self, row: usize) -> Option<Vec<&Value>> {
        (row < self.rows).then(|| self.columns.iter().map(|c| &c.values[row]).collect())
    }

    pub(crate) fn into_parts(self) -> (Vec<Column>, Vec<IndexLevel>) {
        (self.columns, self.index)
    }
}

/// A single labeled column, produced by `squeeze`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Series {
    pub name: Label,
    pub dtype: Dtype,
    pub values: Vec<Value>,
    pub index: Vec<IndexLevel>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Parse output for one sheet
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Parsed {
    Table(Table),
    Series(Series),
}

impl Parsed {
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Parsed::Table(t) => Some(t),
            Parsed::Series(_) => None,
        }
    }

    pub fn as_series(&self) -> Option<&Series> {
        match self {
            Parsed::Series(s) => Some(s),
            Parsed::Table(_) => None,
        }
    }

    pub fn into_table(self) -> Option<Table> {
        match self {
            Parsed::Table(t) => Some(t),
            Parsed::Series(_) => None,
        }
    }

    /// Collapse a one-column table into a series
    pub(crate) fn squeeze(table: Table) -> Self {
        if table.n_cols() != 1 {
            return Parsed::Table(table);
        }
        let (mut columns, index) = table.into_parts();
        let column = columns.remove(0);
        Parsed::Series(Series {
            name: column.label,
            dtype: column.dtype,
            values: column.values,
            index,
        })
    }
}

/// Result of parsing one or several sheets
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SheetResult {
    /// A single sheet was requested
    Single(Parsed),
    /// Several sheets, keyed by sheet name in request order
    Many(IndexMap<String, Parsed>),
}

impl SheetResult {
    /// The table of a single-sheet result
    pub fn table(&self) -> Option<&Table> {
        match self {
            SheetResult::Single(parsed) => parsed.as_table(),
            SheetResult::Many(_) => None,
        }
    }

    pub fn into_table(self) -> Option<Table> {
        match self {
            SheetResult::Single(parsed) => parsed.into_table(),
            SheetResult::Many(_) => None,
        }
    }

    pub fn series(&self) -> Option<&Series> {
        match self {
            SheetResult::Single(parsed) => parsed.as_series(),
            SheetResult::Many(_) => None,
        }
    }

    pub fn sheets(&self) -> Option<&IndexMap<String, Parsed>> {
        match self {
            SheetResult::Many(map) => Some(map),
            SheetResult::Single(_) => None,
        }
    }
}
