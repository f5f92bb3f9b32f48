//! Cell grid abstraction over decoded worksheets
//!
//! A [`Grid`] is the rectangular, immutable view of one sheet that the parser
//! works on. Workbook backends implement [`Workbook`]; [`MemoryWorkbook`] is a
//! backend holding grids built in code.

use crate::error::{ExcelError, Result};
use crate::types::{CellValue, DateEpoch};

/// Immutable rectangular grid of cells (row-major)
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    cells: Vec<CellValue>,
    rows: usize,
    cols: usize,
    epoch: DateEpoch,
}

static EMPTY: CellValue = CellValue::Empty;

impl Grid {
    /// Build a grid from rows of possibly different lengths.
    ///
    /// Short rows are padded with [`CellValue::Empty`].
    pub fn from_rows(rows: Vec<Vec<CellValue>>, epoch: DateEpoch) -> Self {
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        let row_count = rows.len();
        let mut cells = Vec::with_capacity(row_count * cols);
        for mut row in rows {
            row.resize(cols, CellValue::Empty);
            cells.extend(row);
        }
        Grid {
            cells,
            rows: row_count,
            cols,
            epoch,
        }
    }

    /// Get the dimensions (rows, cols)
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn epoch(&self) -> DateEpoch {
        self.epoch
    }

    /// Cell at (row, col); out-of-bounds positions read as empty
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        if row < self.rows && col < self.cols {
            &self.cells[row * self.cols + col]
        } else {
            &EMPTY
        }
    }

    /// Get one row as a slice
    pub fn row(&self, row: usize) -> &[CellValue] {
        if row < self.rows {
            &self.cells[row * self.cols..(row + 1) * self.cols]
        } else {
            &[]
        }
    }

    /// True when the grid holds no non-empty cell
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(CellValue::is_empty)
    }
}

/// A decoded workbook: ordered, named sheets
pub trait Workbook {
    /// Sheet names in workbook order
    fn sheet_names(&self) -> Vec<String>;

    /// Decode the sheet at `index` (0-based)
    fn sheet_at(&mut self, index: usize) -> Result<Grid>;

    /// Position of the sheet called `name`
    fn sheet_index(&self, name: &str) -> Result<usize> {
        let names = self.sheet_names();
        names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| ExcelError::SheetNotFound {
                sheet: name.to_string(),
                available: names.join(", "),
            })
    }
}

/// Workbook whose sheets are built in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    sheets: Vec<(String, Vec<Vec<CellValue>>)>,
    epoch: DateEpoch,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the date system used by every sheet
    pub fn with_epoch(mut self, epoch: DateEpoch) -> Self {
        self.epoch = epoch;
        self
    }

    /// Append a sheet
    pub fn with_sheet(mut self, name: &str, rows: Vec<Vec<CellValue>>) -> Self {
        self.sheets.push((name.to_string(), rows));
        self
    }
}

impl Workbook for MemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn sheet_at(&mut self, index: usize) -> Result<Grid> {
        let (_, rows) = self.sheets.get(index).ok_or_else(|| ExcelError::SheetNotFound {
            sheet: format!("index {}", index),
            available: self.sheet_names().join(", "),
        })?;
        Ok(Grid::from_rows(rows.clone(), self.epoch))
    }
}

/// Build a row of cells from anything convertible into [`CellValue`]
#[macro_export]
macro_rules! row {
    ($($cell:expr),* $(,)?) => {
        vec![$($crate::types::CellValue::from($cell)),*]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_pads_short_rows() {
        let grid = Grid::from_rows(
            vec![row!["a", "b", "c"], row!["x"]],
            DateEpoch::Excel1900,
        );
        assert_eq!(grid.dimensions(), (2, 3));
        assert_eq!(grid.cell(1, 2), &CellValue::Empty);
        assert_eq!(grid.cell(9, 9), &CellValue::Empty);
        assert_eq!(grid.row(0).len(), 3);
    }

    #[test]
    fn test_memory_workbook_lookup() {
        let mut wb = MemoryWorkbook::new()
            .with_sheet("Charlie", vec![row!["a"]])
            .with_sheet("Alpha", vec![]);
        assert_eq!(wb.sheet_names(), vec!["Charlie", "Alpha"]);
        assert_eq!(wb.sheet_index("Alpha").unwrap(), 1);
        assert!(wb.sheet_at(1).unwrap().is_blank());

        match wb.sheet_index("asdf") {
            Err(ExcelError::SheetNotFound { sheet, available }) => {
                assert_eq!(sheet, "asdf");
                assert_eq!(available, "Charlie, Alpha");
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(wb.sheet_at(5).is_err());
    }
}
