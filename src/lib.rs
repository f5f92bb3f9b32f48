//! # excelframe
//!
//! Read spreadsheet sheets into labeled, typed tables.
//!
//! ## Features
//!
//! - **Column Selection**: Pick columns by position, header label, letter range (`"A,C:D"`) or predicate
//! - **Headers & Indexes**: Single and multi-level headers, one or more index columns
//! - **Type Inference**: Integer, float, bool, string, date and time columns from raw cells
//! - **Converters & Dtypes**: Per-column functions and explicit casts that fail loudly
//! - **Missing Values**: Default NA tokens plus custom lists, globally or per column
//! - **Multiple Sheets**: Parse one sheet, a de-duplicated list, or the whole workbook
//! - **Multiple Formats**: XLSX, XLSM, XLS, XLSB and ODS via calamine
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use excelframe::{read_excel, ReadOptions};
//! use excelframe::columns::ColumnSpec;
//! use excelframe::layout::IndexSpec;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ReadOptions::new()
//!     .with_sheet("Sheet1")
//!     .with_usecols(ColumnSpec::Range("A,C:D".to_string()))
//!     .with_index_col(IndexSpec::Column(0));
//!
//! let result = read_excel("data.xlsx", &options)?;
//! if let Some(table) = result.table() {
//!     for column in table.columns() {
//!         println!("{} ({}): {:?}", column.label, column.dtype, column.values);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Keeping a Workbook Open
//!
//! ```rust,no_run
//! use excelframe::{ExcelReader, ReadOptions, SheetSelector};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let sheets = ExcelReader::scoped("data.xlsx", |reader| {
//!     println!("Sheets: {:?}", reader.sheet_names()?);
//!     reader.parse(&ReadOptions::new().with_sheet(SheetSelector::All))
//! })?;
//! # Ok(())
//! # }
//! ```

pub mod coerce;
pub mod columns;
pub mod engine;
pub mod error;
pub mod grid;
pub mod layout;
pub mod options;
pub mod reader;
pub mod table;
pub mod types;

pub use coerce::{Converters, DtypeMap, NaValues, DEFAULT_NA_VALUES};
pub use columns::{ColumnRef, ColumnSpec};
pub use engine::Engine;
pub use error::{ErrorKind, ExcelError, Result};
pub use grid::{Grid, MemoryWorkbook, Workbook};
pub use layout::{HeaderSpec, IndexSpec, SkipRows};
pub use options::{Arg, ReadOptions};
pub use reader::{read_excel, ExcelReader, SheetRef, SheetSelector};
pub use table::{Column, IndexLevel, Parsed, Series, SheetResult, Table};
pub use types::{CellValue, DateEpoch, Dtype, Label, Value};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_imports() {
        // Test that all public types are accessible
        let _ = std::marker::PhantomData::<ExcelError>;
        let _ = std::marker::PhantomData::<ExcelReader>;
        let _ = std::marker::PhantomData::<ReadOptions>;
        let _ = std::marker::PhantomData::<SheetResult>;
    }

    #[test]
    fn test_results_are_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Table>();
        assert_send_sync::<SheetResult>();
        assert_send_sync::<ReadOptions>();
    }
}
