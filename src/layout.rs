//! Header and index reconstruction
//!
//! Splits a sheet grid into column labels, row labels and the data region.
//! Row skipping happens first; header row numbers then count within the rows
//! that remain.

use crate::columns::ColumnSpec;
use crate::error::{ExcelError, Result};
use crate::grid::Grid;
use crate::types::{unnamed, CellValue, Label};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Predicate over absolute row numbers
pub type RowPredicate = Arc<dyn Fn(usize) -> bool + Send + Sync>;

/// Which rows hold column labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderSpec {
    /// No header; columns are labelled `Unnamed: <position>`
    None,
    Row(usize),
    /// Multi-level header; strictly ascending
    Rows(Vec<usize>),
}

impl Default for HeaderSpec {
    fn default() -> Self {
        HeaderSpec::Row(0)
    }
}

impl HeaderSpec {
    /// Validated header row numbers
    pub fn rows(&self) -> Result<Vec<usize>> {
        match self {
            HeaderSpec::None => Ok(Vec::new()),
            HeaderSpec::Row(row) => Ok(vec![*row]),
            HeaderSpec::Rows(rows) if rows.is_empty() => Err(ExcelError::HeaderSpec(
                "header row list must not be empty".to_string(),
            )),
            HeaderSpec::Rows(rows) => {
                if rows.windows(2).any(|w| w[0] >= w[1]) {
                    return Err(ExcelError::HeaderSpec(format!(
                        "header rows must be strictly ascending, got {:?}",
                        rows
                    )));
                }
                Ok(rows.clone())
            }
        }
    }
}

/// Which selected columns hold row labels
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IndexSpec {
    #[default]
    None,
    Column(usize),
    /// Multi-level index; blank cells are filled from the row above
    Columns(Vec<usize>),
}

impl IndexSpec {
    /// Positions within the selected columns
    pub fn positions(&self) -> Vec<usize> {
        match self {
            IndexSpec::None => Vec::new(),
            IndexSpec::Column(p) => vec![*p],
            IndexSpec::Columns(ps) => ps.clone(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.positions().is_empty()
    }
}

/// Rows dropped before the header is read
#[derive(Clone, Default)]
pub enum SkipRows {
    #[default]
    None,
    /// The first n rows
    Count(usize),
    /// Absolute row numbers
    Rows(Vec<usize>),
    /// Rows for which the predicate returns true
    Predicate(RowPredicate),
}

impl fmt::Debug for SkipRows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipRows::None => f.write_str("None"),
            SkipRows::Count(n) => f.debug_tuple("Count").field(n).finish(),
            SkipRows::Rows(rows) => f.debug_tuple("Rows").field(rows).finish(),
            SkipRows::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl SkipRows {
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(usize) -> bool + Send + Sync + 'static,
    {
        SkipRows::Predicate(Arc::new(f))
    }

    fn skips(&self, row: usize) -> bool {
        match self {
            SkipRows::None => false,
            SkipRows::Count(n) => row < *n,
            SkipRows::Rows(rows) => rows.contains(&row),
            SkipRows::Predicate(pred) => pred(row),
        }
    }
}

/// Layout directives for one sheet
#[derive(Debug, Clone, Copy)]
pub struct LayoutOptions<'a> {
    pub header: &'a HeaderSpec,
    pub index_col: &'a IndexSpec,
    pub usecols: Option<&'a ColumnSpec>,
    pub skiprows: &'a SkipRows,
    pub skipfooter: usize,
    pub nrows: Option<usize>,
    pub mangle_dupe_cols: bool,
}

/// Raw cells of one selected column
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutColumn {
    /// Position among the selected columns
    pub position: usize,
    pub label: Label,
    pub cells: Vec<CellValue>,
}

/// A sheet split into labels and data
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetLayout {
    pub index: Vec<LayoutColumn>,
    pub index_names: Vec<Option<String>>,
    pub columns: Vec<LayoutColumn>,
    /// Header level names, multi-level headers only
    pub column_names: Vec<Option<String>>,
    pub rows: usize,
}

impl SheetLayout {
    /// Interpret `grid` according to `opts`.
    ///
    /// A blank sheet, or one whose rows were all skipped, yields an empty
    /// layout without columns.
    pub fn build(grid: &Grid, opts: &LayoutOptions<'_>) -> Result<Self> {
        if opts.skipfooter > 0 && opts.nrows.is_some() {
            return Err(ExcelError::Argument(
                "'skipfooter' not supported with 'nrows'".to_string(),
            ));
        }
        let header_rows = opts.header.rows()?;

        let (height, width) = grid.dimensions();
        let rows: Vec<usize> = (0..height).filter(|r| !opts.skiprows.skips(*r)).collect();
        if grid.is_blank() || rows.is_empty() {
            log::debug!("sheet has no rows to parse");
            return Ok(SheetLayout::default());
        }
        if let Some(last) = header_rows.last() {
            if *last >= rows.len() {
                return Err(ExcelError::HeaderSpec(format!(
                    "header row {} is beyond the last row {}",
                    last,
                    rows.len() - 1
                )));
            }
        }

        let labels: Vec<Label> = match header_rows.as_slice() {
            [] => (0..width).map(Label::unnamed).collect(),
            [row] => single_header(grid, rows[*row], width, opts.mangle_dupe_cols),
            many => {
                let abs: Vec<usize> = many.iter().map(|r| rows[*r]).collect();
                multi_header(grid, &abs, width)
            }
        };

        let selected = match opts.usecols {
            Some(spec) => spec.resolve(&labels)?,
            None => (0..width).collect(),
        };
        let index_positions = opts.index_col.positions();
        if let Some(p) = index_positions.iter().find(|p| **p >= selected.len()) {
            return Err(ExcelError::Argument(format!(
                "index_col {} is out of range for {} selected columns",
                p,
                selected.len()
            )));
        }
        let index_cols: Vec<usize> = index_positions.iter().map(|p| selected[*p]).collect();

        let mut data_start = header_rows.last().map_or(0, |r| r + 1);
        let mut index_names = vec![None; index_cols.len()];
        let mut column_names = Vec::new();

        if header_rows.len() > 1 {
            column_names = header_rows
                .iter()
                .map(|r| index_cols.last().and_then(|c| cell_name(grid.cell(rows[*r], *c))))
                .collect();
            // A row with only index cells filled carries the index names
            if let (false, Some(&row)) = (index_cols.is_empty(), rows.get(data_start)) {
                let names_row = selected
                    .iter()
                    .filter(|c| !index_cols.contains(c))
                    .all(|c| grid.cell(row, *c).is_empty());
                if names_row {
                    index_names = index_cols.iter().map(|c| cell_name(grid.cell(row, *c))).collect();
                    data_start += 1;
                }
            }
        } else if header_rows.len() == 1 {
            index_names = index_cols
                .iter()
                .map(|c| match &labels[*c] {
                    label if label.is_unnamed() => None,
                    label => Some(label.to_string()),
                })
                .collect();
        }

        let mut data: &[usize] = rows.get(data_start..).unwrap_or(&[]);
        if opts.skipfooter > 0 {
            data = &data[..data.len().saturating_sub(opts.skipfooter)];
        }
        if let Some(n) = opts.nrows {
            data = &data[..data.len().min(n)];
        }

        let extract = |position: usize, col: usize| LayoutColumn {
            position,
            label: labels[col].clone(),
            cells: data.iter().map(|r| grid.cell(*r, col).clone()).collect(),
        };

        let mut index: Vec<LayoutColumn> = index_positions
            .iter()
            .zip(&index_cols)
            .map(|(p, c)| extract(*p, *c))
            .collect();
        if matches!(opts.index_col, IndexSpec::Columns(_)) {
            for level in &mut index {
                forward_fill(&mut level.cells);
            }
        }

        let columns = selected
            .iter()
            .enumerate()
            .filter(|(_, c)| !index_cols.contains(c))
            .map(|(p, c)| extract(p, *c))
            .collect();

        log::debug!(
            "layout: {} header rows, {} index levels, {} data rows",
            header_rows.len(),
            index.len(),
            data.len()
        );

        Ok(SheetLayout {
            index,
            index_names,
            columns,
            column_names,
            rows: data.len(),
        })
    }

    /// True for a sheet without any columns
    pub fn is_blank(&self) -> bool {
        self.columns.is_empty() && self.index.is_empty()
    }
}

fn cell_name(cell: &CellValue) -> Option<String> {
    (!cell.is_empty()).then(|| cell.as_string())
}

fn single_header(grid: &Grid, row: usize, width: usize, mangle: bool) -> Vec<Label> {
    let mut names: Vec<String> = (0..width)
        .map(|c| cell_name(grid.cell(row, c)).unwrap_or_else(|| unnamed(c)))
        .collect();
    if mangle {
        mangle_duplicates(&mut names);
    }
    names.into_iter().map(Label::Name).collect()
}

/// Blank cells take the value to their left, unless a level above starts a
/// new group at that column.
fn multi_header(grid: &Grid, header_rows: &[usize], width: usize) -> Vec<Label> {
    let mut levels: Vec<Vec<String>> = vec![Vec::with_capacity(header_rows.len()); width];
    let mut bounded = vec![false; width];

    for &row in header_rows {
        let mut last: Option<String> = None;
        for (c, level) in levels.iter_mut().enumerate() {
            let value = cell_name(grid.cell(row, c));
            if bounded[c] {
                last = value.clone();
            }
            match value {
                Some(v) => {
                    bounded[c] = true;
                    last = Some(v.clone());
                    level.push(v);
                }
                None => level.push(last.clone().unwrap_or_else(|| unnamed(c))),
            }
        }
    }

    levels.into_iter().map(Label::Levels).collect()
}

/// Rename repeats: `a`, `a.1`, `a.2`
fn mangle_duplicates(names: &mut [String]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for name in names.iter_mut() {
        let mut current = name.clone();
        let mut count = counts.get(&current).copied().unwrap_or(0);
        while count > 0 {
            counts.insert(current.clone(), count + 1);
            current = format!("{}.{}", current, count);
            count = counts.get(&current).copied().unwrap_or(0);
        }
        counts.insert(current.clone(), count + 1);
        *name = current;
    }
}

fn forward_fill(cells: &mut [CellValue]) {
    let mut last: Option<CellValue> = None;
    for cell in cells.iter_mut() {
        if cell.is_empty() {
            if let Some(prev) = &last {
                *cell = prev.clone();
            }
        } else {
            last = Some(cell.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use crate::types::DateEpoch;

    fn grid(rows: Vec<Vec<CellValue>>) -> Grid {
        Grid::from_rows(rows, DateEpoch::Excel1900)
    }

    fn build(grid: &Grid, header: HeaderSpec, index_col: IndexSpec) -> Result<SheetLayout> {
        SheetLayout::build(
            grid,
            &LayoutOptions {
                header: &header,
                index_col: &index_col,
                usecols: None,
                skiprows: &SkipRows::None,
                skipfooter: 0,
                nrows: None,
                mangle_dupe_cols: true,
            },
        )
    }

    fn labels(layout: &SheetLayout) -> Vec<String> {
        layout.columns.iter().map(|c| c.label.to_string()).collect()
    }

    #[test]
    fn test_single_header_labels() {
        let g = grid(vec![row!["a", "", "a", "a.1", 1], row![1, 2, 3, 4, 5]]);
        let layout = build(&g, HeaderSpec::Row(0), IndexSpec::None).unwrap();
        assert_eq!(labels(&layout), vec!["a", "Unnamed: 1", "a.1", "a.1.1", "1"]);
        assert_eq!(layout.rows, 1);
        assert_eq!(layout.columns[2].cells, vec![CellValue::Number(3.0)]);
    }

    #[test]
    fn test_no_header() {
        let g = grid(vec![row!["x", "y"], row![1, 2]]);
        let layout = build(&g, HeaderSpec::None, IndexSpec::None).unwrap();
        assert_eq!(labels(&layout), vec!["Unnamed: 0", "Unnamed: 1"]);
        assert_eq!(layout.rows, 2);
    }

    #[test]
    fn test_index_names_from_single_header() {
        let g = grid(vec![row!["", "key", "v"], row!["a", "x", 1], row!["", "y", 2]]);
        let layout = build(&g, HeaderSpec::Row(0), IndexSpec::Columns(vec![0, 1])).unwrap();
        assert_eq!(layout.index_names, vec![None, Some("key".to_string())]);
        // multi-level index cells are filled downwards
        assert_eq!(layout.index[0].cells, vec![CellValue::from("a"), CellValue::from("a")]);
        assert_eq!(labels(&layout), vec!["v"]);
        assert_eq!(layout.rows, 2);
    }

    #[test]
    fn test_multi_header_fill_is_bounded() {
        let g = grid(vec![
            row!["top", "", "other", ""],
            row!["a", "", "", "d"],
            row![1, 2, 3, 4],
        ]);
        let layout = build(&g, HeaderSpec::Rows(vec![0, 1]), IndexSpec::None).unwrap();
        assert_eq!(
            labels(&layout),
            vec!["(top, a)", "(top, a)", "(other, Unnamed: 2)", "(other, d)"]
        );
        assert_eq!(layout.column_names, vec![None, None]);
    }

    #[test]
    fn test_multi_header_with_index_names_row() {
        let g = grid(vec![
            row!["", "x", "x"],
            row!["lvl", "a", "b"],
            row!["idx", "", ""],
            row!["r1", 1, 2],
        ]);
        let layout = build(&g, HeaderSpec::Rows(vec![0, 1]), IndexSpec::Column(0)).unwrap();
        assert_eq!(layout.column_names, vec![None, Some("lvl".to_string())]);
        assert_eq!(layout.index_names, vec![Some("idx".to_string())]);
        assert_eq!(labels(&layout), vec!["(x, a)", "(x, b)"]);
        assert_eq!(layout.rows, 1);
    }

    #[test]
    fn test_skiprows_before_multi_header_and_index_names() {
        let g = grid(vec![
            row!["report", "", "", ""],
            row!["generated", 2013, "", ""],
            row!["", "c0", "A", "A"],
            row!["", "c1", "a", "b"],
            row!["i0", "i1", "", ""],
            row!["R0", "r0", 1, 2],
            row!["", "r1", 3, 4],
            row!["R1", "r2", 5, 6],
        ]);
        let layout = SheetLayout::build(
            &g,
            &LayoutOptions {
                header: &HeaderSpec::Rows(vec![0, 1]),
                index_col: &IndexSpec::Columns(vec![0, 1]),
                usecols: None,
                skiprows: &SkipRows::Count(2),
                skipfooter: 0,
                nrows: None,
                mangle_dupe_cols: true,
            },
        )
        .unwrap();
        assert_eq!(layout.column_names, vec![Some("c0".to_string()), Some("c1".to_string())]);
        assert_eq!(layout.index_names, vec![Some("i0".to_string()), Some("i1".to_string())]);
        assert_eq!(labels(&layout), vec!["(A, a)", "(A, b)"]);
        assert_eq!(layout.rows, 3);
        assert_eq!(
            layout.index[0].cells,
            vec![CellValue::from("R0"), CellValue::from("R0"), CellValue::from("R1")]
        );
        assert_eq!(
            layout.columns[1].cells,
            vec![CellValue::from(2), CellValue::from(4), CellValue::from(6)]
        );
    }

    #[test]
    fn test_skiprows_variants() {
        let g = grid(vec![row!["junk"], row!["h"], row![1], row![2], row![3]]);
        let run = |skip: SkipRows| {
            SheetLayout::build(
                &g,
                &LayoutOptions {
                    header: &HeaderSpec::Row(0),
                    index_col: &IndexSpec::None,
                    usecols: None,
                    skiprows: &skip,
                    skipfooter: 0,
                    nrows: None,
                    mangle_dupe_cols: true,
                },
            )
            .unwrap()
        };
        let counted = run(SkipRows::Count(1));
        assert_eq!(labels(&counted), vec!["h"]);
        assert_eq!(counted.rows, 3);

        let listed = run(SkipRows::Rows(vec![0, 3]));
        assert_eq!(listed.columns[0].cells, vec![CellValue::from(1), CellValue::from(3)]);

        let predicate = run(SkipRows::predicate(|r| r == 0 || r == 4));
        assert_eq!(predicate.rows, 2);
    }

    #[test]
    fn test_footer_and_nrows() {
        let g = grid(vec![row!["h"], row![1], row![2], row![3]]);
        let run = |skipfooter: usize, nrows: Option<usize>| {
            SheetLayout::build(
                &g,
                &LayoutOptions {
                    header: &HeaderSpec::Row(0),
                    index_col: &IndexSpec::None,
                    usecols: None,
                    skiprows: &SkipRows::None,
                    skipfooter,
                    nrows,
                    mangle_dupe_cols: true,
                },
            )
        };
        assert_eq!(run(1, None).unwrap().rows, 2);
        assert_eq!(run(0, Some(2)).unwrap().rows, 2);
        assert_eq!(run(0, Some(10)).unwrap().rows, 3);
        assert_eq!(run(0, Some(0)).unwrap().rows, 0);
        let err = run(1, Some(1)).unwrap_err();
        assert_eq!(err.to_string(), "'skipfooter' not supported with 'nrows'");
    }

    #[test]
    fn test_header_only_keeps_labels() {
        let g = grid(vec![row!["i", "a", "b"]]);
        let layout = build(&g, HeaderSpec::Row(0), IndexSpec::Column(0)).unwrap();
        assert_eq!(layout.rows, 0);
        assert_eq!(labels(&layout), vec!["a", "b"]);
        assert_eq!(layout.index_names, vec![Some("i".to_string())]);
    }

    #[test]
    fn test_blank_sheet() {
        let g = grid(vec![row!["", ""]]);
        let layout = build(&g, HeaderSpec::Row(0), IndexSpec::None).unwrap();
        assert!(layout.is_blank());
    }

    #[test]
    fn test_invalid_headers() {
        let g = grid(vec![row!["a"], row![1]]);
        assert!(matches!(
            build(&g, HeaderSpec::Row(5), IndexSpec::None),
            Err(ExcelError::HeaderSpec(_))
        ));
        assert!(matches!(
            build(&g, HeaderSpec::Rows(vec![1, 0]), IndexSpec::None),
            Err(ExcelError::HeaderSpec(_))
        ));
    }

    #[test]
    fn test_index_counts_within_selected_columns() {
        let g = grid(vec![
            row!["A", "B", "C", "D", "E"],
            row!["R1", 1, 2, 3, 4],
            row!["R2", 5, 6, 7, 8],
        ]);
        let usecols = ColumnSpec::Indices(vec![3, 0, 2]);
        let layout = SheetLayout::build(
            &g,
            &LayoutOptions {
                header: &HeaderSpec::Row(0),
                index_col: &IndexSpec::Column(0),
                usecols: Some(&usecols),
                skiprows: &SkipRows::None,
                skipfooter: 0,
                nrows: None,
                mangle_dupe_cols: true,
            },
        )
        .unwrap();
        assert_eq!(labels(&layout), vec!["C", "D"]);
        assert_eq!(layout.columns[0].position, 1);
        assert_eq!(layout.index[0].cells, vec![CellValue::from("R1"), CellValue::from("R2")]);
        assert_eq!(layout.index_names, vec![Some("A".to_string())]);
    }
}
