//! Workbook sessions and sheet resolution
//!
//! [`ExcelReader`] owns a decoded workbook until it is closed or dropped.
//! Each [`ExcelReader::parse`] call resolves the requested sheets, then runs
//! layout, column selection and coercion once per sheet.

use crate::coerce::{coerce_column, CoerceOptions};
use crate::engine::{CalamineWorkbook, Engine};
use crate::error::{ExcelError, Result};
use crate::grid::Workbook;
use crate::layout::SheetLayout;
use crate::options::ReadOptions;
use crate::table::{Column, IndexLevel, Parsed, SheetResult, Table};
use indexmap::IndexMap;
use std::path::Path;

/// One sheet, by position or name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SheetRef {
    Index(usize),
    Name(String),
}

impl From<usize> for SheetRef {
    fn from(index: usize) -> Self {
        SheetRef::Index(index)
    }
}

impl From<&str> for SheetRef {
    fn from(name: &str) -> Self {
        SheetRef::Name(name.to_string())
    }
}

impl From<String> for SheetRef {
    fn from(name: String) -> Self {
        SheetRef::Name(name)
    }
}

/// Which sheets to parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    /// One sheet by position; the result is not keyed
    Index(usize),
    /// One sheet by name; the result is not keyed
    Name(String),
    /// Several sheets, keyed by name in first-seen order
    List(Vec<SheetRef>),
    /// Every sheet in workbook order
    All,
}

impl Default for SheetSelector {
    fn default() -> Self {
        SheetSelector::Index(0)
    }
}

impl From<usize> for SheetSelector {
    fn from(index: usize) -> Self {
        SheetSelector::Index(index)
    }
}

impl From<&str> for SheetSelector {
    fn from(name: &str) -> Self {
        SheetSelector::Name(name.to_string())
    }
}

impl From<String> for SheetSelector {
    fn from(name: String) -> Self {
        SheetSelector::Name(name)
    }
}

impl From<Vec<SheetRef>> for SheetSelector {
    fn from(sheets: Vec<SheetRef>) -> Self {
        SheetSelector::List(sheets)
    }
}

/// An open workbook
///
/// Once closed, every further call fails with [`ExcelError::Closed`].
pub struct ExcelReader {
    workbook: Option<Box<dyn Workbook>>,
}

impl ExcelReader {
    /// Open a workbook file, detecting its format
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use excelframe::{ExcelReader, ReadOptions};
    ///
    /// let mut reader = ExcelReader::open("data.xlsx").unwrap();
    /// println!("Available sheets: {:?}", reader.sheet_names().unwrap());
    /// let result = reader.parse(&ReadOptions::new().with_sheet("Sheet1")).unwrap();
    /// reader.close();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_engine(path, Engine::Auto)
    }

    /// Open a workbook file with an explicit decoding backend
    pub fn open_with_engine<P: AsRef<Path>>(path: P, engine: Engine) -> Result<Self> {
        let workbook = CalamineWorkbook::open(path, engine)?;
        Ok(Self::from_workbook(workbook))
    }

    /// Decode a workbook held in memory
    pub fn from_bytes(bytes: Vec<u8>, engine: Engine) -> Result<Self> {
        let workbook = CalamineWorkbook::from_bytes(bytes, engine)?;
        Ok(Self::from_workbook(workbook))
    }

    /// Wrap any [`Workbook`] implementation
    pub fn from_workbook<W: Workbook + 'static>(workbook: W) -> Self {
        ExcelReader {
            workbook: Some(Box::new(workbook)),
        }
    }

    /// Open `path`, run `f` and close the reader, whether `f` succeeds or not
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use excelframe::ExcelReader;
    ///
    /// let names = ExcelReader::scoped("data.xlsx", |reader| reader.sheet_names()).unwrap();
    /// ```
    pub fn scoped<P, T, F>(path: P, f: F) -> Result<T>
    where
        P: AsRef<Path>,
        F: FnOnce(&mut ExcelReader) -> Result<T>,
    {
        let mut reader = Self::open(path)?;
        reader.run_scoped(f)
    }

    /// Run `f` against this reader and close it afterwards
    pub fn run_scoped<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut ExcelReader) -> Result<T>,
    {
        let result = f(self);
        self.close();
        result
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> Result<Vec<String>> {
        self.workbook
            .as_ref()
            .map(|wb| wb.sheet_names())
            .ok_or(ExcelError::Closed)
    }

    /// Release the workbook; calling it again has no effect
    pub fn close(&mut self) {
        if self.workbook.take().is_some() {
            log::debug!("workbook closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.workbook.is_none()
    }

    /// Parse the sheets selected by `options`.
    ///
    /// Every requested sheet is resolved before any of them is parsed, so an
    /// unknown sheet fails without doing any work.
    pub fn parse(&mut self, options: &ReadOptions) -> Result<SheetResult> {
        let workbook = self.workbook.as_mut().ok_or(ExcelError::Closed)?;
        let names = workbook.sheet_names();

        match options.sheet() {
            SheetSelector::Index(index) => {
                let index = resolve_sheet(&**workbook, &names, &SheetRef::Index(*index))?;
                parse_sheet(&mut **workbook, &names, index, options).map(SheetResult::Single)
            }
            SheetSelector::Name(name) => {
                let index = workbook.sheet_index(name)?;
                parse_sheet(&mut **workbook, &names, index, options).map(SheetResult::Single)
            }
            SheetSelector::List(refs) => {
                let mut order: Vec<usize> = Vec::with_capacity(refs.len());
                for sheet in refs {
                    let index = resolve_sheet(&**workbook, &names, sheet)?;
                    if !order.contains(&index) {
                        order.push(index);
                    }
                }
                parse_many(&mut **workbook, &names, &order, options)
            }
            SheetSelector::All => {
                let order: Vec<usize> = (0..names.len()).collect();
                parse_many(&mut **workbook, &names, &order, options)
            }
        }
    }
}

/// Read a workbook file in one call
///
/// # Examples
///
/// ```no_run
/// use excelframe::{read_excel, ReadOptions};
/// use excelframe::layout::IndexSpec;
///
/// let result = read_excel("data.xlsx", &ReadOptions::new().with_index_col(IndexSpec::Column(0))).unwrap();
/// let table = result.table().unwrap();
/// println!("{} rows x {} columns", table.n_rows(), table.n_cols());
/// ```
pub fn read_excel<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<SheetResult> {
    let mut reader = ExcelReader::open_with_engine(path, options.engine())?;
    reader.run_scoped(|reader| reader.parse(options))
}

fn resolve_sheet(workbook: &dyn Workbook, names: &[String], sheet: &SheetRef) -> Result<usize> {
    match sheet {
        SheetRef::Name(name) => workbook.sheet_index(name),
        SheetRef::Index(index) if *index < names.len() => Ok(*index),
        SheetRef::Index(index) => Err(ExcelError::SheetNotFound {
            sheet: format!("index {}", index),
            available: names.join(", "),
        }),
    }
}

fn parse_many(
    workbook: &mut dyn Workbook,
    names: &[String],
    order: &[usize],
    options: &ReadOptions,
) -> Result<SheetResult> {
    let mut sheets = IndexMap::with_capacity(order.len());
    for &index in order {
        let parsed = parse_sheet(workbook, names, index, options)?;
        sheets.insert(names[index].clone(), parsed);
    }
    Ok(SheetResult::Many(sheets))
}

fn parse_sheet(
    workbook: &mut dyn Workbook,
    names: &[String],
    index: usize,
    options: &ReadOptions,
) -> Result<Parsed> {
    log::debug!("parsing sheet '{}'", names[index]);
    let grid = workbook.sheet_at(index)?;
    let layout = SheetLayout::build(&grid, &options.layout())?;
    let table = build_table(layout, &options.coercion(grid.epoch()))?;
    Ok(if options.squeeze {
        Parsed::squeeze(table)
    } else {
        Parsed::Table(table)
    })
}

fn build_table(layout: SheetLayout, coerce: &CoerceOptions<'_>) -> Result<Table> {
    if layout.is_blank() {
        return Ok(Table::empty());
    }

    let index = layout
        .index
        .into_iter()
        .zip(layout.index_names)
        .map(|(level, name)| {
            let (dtype, values) = coerce_column(&level.cells, level.position, &level.label, coerce)?;
            Ok(IndexLevel {
                name,
                dtype,
                values,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let columns = layout
        .columns
        .into_iter()
        .map(|column| {
            let (dtype, values) =
                coerce_column(&column.cells, column.position, &column.label, coerce)?;
            Ok(Column::new(column.label, dtype, values))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Table::new(columns, index, layout.column_names, layout.rows))
}
