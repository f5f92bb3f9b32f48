//! Parse options
//!
//! [`ReadOptions`] is a builder holding every directive of a parse call.
//! [`ReadOptions::from_args`] builds one from loosely typed keyword
//! arguments and rejects unknown keywords up front.

use crate::coerce::{CoerceOptions, Converters, DtypeMap, NaValues};
use crate::columns::{ColumnRef, ColumnSpec};
use crate::engine::Engine;
use crate::error::{ExcelError, Result};
use crate::layout::{HeaderSpec, IndexSpec, LayoutOptions, SkipRows};
use crate::reader::{SheetRef, SheetSelector};
use crate::types::{DateEpoch, Dtype};
use indexmap::IndexMap;

/// Keywords accepted by [`ReadOptions::from_args`]
pub const KEYWORDS: &[&str] = &[
    "sheet_name",
    "header",
    "index_col",
    "usecols",
    "skiprows",
    "skipfooter",
    "nrows",
    "dtype",
    "na_values",
    "keep_default_na",
    "convert_float",
    "squeeze",
    "mangle_dupe_cols",
    "engine",
];

/// Options for parsing one or more sheets
#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub(crate) sheet: SheetSelector,
    pub(crate) header: HeaderSpec,
    pub(crate) index_col: IndexSpec,
    pub(crate) usecols: Option<ColumnSpec>,
    pub(crate) skiprows: SkipRows,
    pub(crate) skipfooter: usize,
    pub(crate) nrows: Option<usize>,
    pub(crate) dtype: DtypeMap,
    pub(crate) converters: Converters,
    pub(crate) na_values: NaValues,
    pub(crate) keep_default_na: bool,
    pub(crate) convert_float: bool,
    pub(crate) squeeze: bool,
    pub(crate) mangle_dupe_cols: bool,
    pub(crate) engine: Engine,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            sheet: SheetSelector::default(),
            header: HeaderSpec::default(),
            index_col: IndexSpec::None,
            usecols: None,
            skiprows: SkipRows::None,
            skipfooter: 0,
            nrows: None,
            dtype: DtypeMap::new(),
            converters: Converters::new(),
            na_values: NaValues::None,
            keep_default_na: true,
            convert_float: true,
            squeeze: false,
            mangle_dupe_cols: true,
            engine: Engine::Auto,
        }
    }
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the sheet(s) to parse
    pub fn with_sheet(mut self, sheet: impl Into<SheetSelector>) -> Self {
        self.sheet = sheet.into();
        self
    }

    pub fn with_header(mut self, header: HeaderSpec) -> Self {
        self.header = header;
        self
    }

    pub fn with_index_col(mut self, index_col: IndexSpec) -> Self {
        self.index_col = index_col;
        self
    }

    pub fn with_usecols(mut self, usecols: ColumnSpec) -> Self {
        self.usecols = Some(usecols);
        self
    }

    pub fn with_skiprows(mut self, skiprows: SkipRows) -> Self {
        self.skiprows = skiprows;
        self
    }

    /// Drop this many rows from the end of the data
    pub fn with_skipfooter(mut self, skipfooter: usize) -> Self {
        self.skipfooter = skipfooter;
        self
    }

    /// Read at most this many data rows
    pub fn with_nrows(mut self, nrows: usize) -> Self {
        self.nrows = Some(nrows);
        self
    }

    pub fn with_dtype(mut self, dtype: DtypeMap) -> Self {
        self.dtype = dtype;
        self
    }

    pub fn with_converters(mut self, converters: Converters) -> Self {
        self.converters = converters;
        self
    }

    pub fn with_na_values(mut self, na_values: NaValues) -> Self {
        self.na_values = na_values;
        self
    }

    pub fn with_keep_default_na(mut self, keep: bool) -> Self {
        self.keep_default_na = keep;
        self
    }

    /// Read whole-number columns as integers (on by default)
    pub fn with_convert_float(mut self, convert: bool) -> Self {
        self.convert_float = convert;
        self
    }

    /// Return a series when the result has a single data column
    pub fn with_squeeze(mut self, squeeze: bool) -> Self {
        self.squeeze = squeeze;
        self
    }

    pub fn with_mangle_dupe_cols(mut self, mangle: bool) -> Self {
        self.mangle_dupe_cols = mangle;
        self
    }

    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    pub fn sheet(&self) -> &SheetSelector {
        &self.sheet
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }

    pub(crate) fn layout(&self) -> LayoutOptions<'_> {
        LayoutOptions {
            header: &self.header,
            index_col: &self.index_col,
            usecols: self.usecols.as_ref(),
            skiprows: &self.skiprows,
            skipfooter: self.skipfooter,
            nrows: self.nrows,
            mangle_dupe_cols: self.mangle_dupe_cols,
        }
    }

    pub(crate) fn coercion(&self, epoch: DateEpoch) -> CoerceOptions<'_> {
        CoerceOptions {
            convert_float: self.convert_float,
            keep_default_na: self.keep_default_na,
            na_values: &self.na_values,
            converters: &self.converters,
            dtypes: &self.dtype,
            epoch,
        }
    }

    /// Build options from keyword arguments.
    ///
    /// # Examples
    ///
    /// ```
    /// use excelframe::options::{Arg, ReadOptions};
    /// use indexmap::IndexMap;
    ///
    /// let mut args = IndexMap::new();
    /// args.insert("nrows".to_string(), Arg::Int(5));
    /// assert!(ReadOptions::from_args(args).is_ok());
    ///
    /// let mut args = IndexMap::new();
    /// args.insert("sheetname".to_string(), Arg::Int(0));
    /// assert!(ReadOptions::from_args(args).is_err());
    /// ```
    pub fn from_args(args: IndexMap<String, Arg>) -> Result<Self> {
        if args.contains_key("converters") {
            return Err(ExcelError::Argument(
                "'converters' cannot be passed as a keyword argument, use ReadOptions::with_converters".to_string(),
            ));
        }
        if let Some(unknown) = args.keys().find(|k| !KEYWORDS.contains(&k.as_str())) {
            return Err(ExcelError::Argument(format!(
                "unexpected keyword argument `{}`",
                unknown
            )));
        }

        let mut opts = ReadOptions::default();
        for (key, value) in args {
            match key.as_str() {
                "sheet_name" => opts.sheet = sheet_arg(value)?,
                "header" => opts.header = header_arg(value)?,
                "index_col" => opts.index_col = index_arg(value)?,
                "usecols" => opts.usecols = usecols_arg(value)?,
                "skiprows" => opts.skiprows = skiprows_arg(value)?,
                "skipfooter" => {
                    opts.skipfooter = match value {
                        Arg::Int(n) if n >= 0 => n as usize,
                        _ => return Err(argument("'skipfooter' must be an integer >=0")),
                    }
                }
                "nrows" => {
                    opts.nrows = match value {
                        Arg::None => None,
                        Arg::Int(n) if n >= 0 => Some(n as usize),
                        _ => return Err(argument("'nrows' must be an integer >=0")),
                    }
                }
                "dtype" => opts.dtype = dtype_arg(value)?,
                "na_values" => opts.na_values = na_arg(value)?,
                "keep_default_na" => opts.keep_default_na = bool_arg(&key, value)?,
                "convert_float" => opts.convert_float = bool_arg(&key, value)?,
                "squeeze" => opts.squeeze = bool_arg(&key, value)?,
                "mangle_dupe_cols" => opts.mangle_dupe_cols = bool_arg(&key, value)?,
                "engine" => {
                    opts.engine = match value {
                        Arg::None => Engine::Auto,
                        Arg::Str(name) => name.parse()?,
                        _ => return Err(argument("'engine' must be a string")),
                    }
                }
                _ => {}
            }
        }
        Ok(opts)
    }
}

/// Loosely typed keyword argument value
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Arg>),
    /// Key/value pairs; keys are column positions or labels
    Map(Vec<(Arg, Arg)>),
}

impl From<bool> for Arg {
    fn from(b: bool) -> Self {
        Arg::Bool(b)
    }
}

impl From<i64> for Arg {
    fn from(i: i64) -> Self {
        Arg::Int(i)
    }
}

impl From<i32> for Arg {
    fn from(i: i32) -> Self {
        Arg::Int(i as i64)
    }
}

impl From<f64> for Arg {
    fn from(f: f64) -> Self {
        Arg::Float(f)
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Str(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Str(s)
    }
}

impl<T: Into<Arg>> From<Vec<T>> for Arg {
    fn from(items: Vec<T>) -> Self {
        Arg::List(items.into_iter().map(Into::into).collect())
    }
}

fn argument(message: &str) -> ExcelError {
    ExcelError::Argument(message.to_string())
}

fn non_negative(value: &Arg) -> Option<usize> {
    match value {
        Arg::Int(i) if *i >= 0 => Some(*i as usize),
        _ => None,
    }
}

fn int_list(items: &[Arg]) -> Option<Vec<usize>> {
    items.iter().map(non_negative).collect()
}

fn bool_arg(key: &str, value: Arg) -> Result<bool> {
    match value {
        Arg::Bool(b) => Ok(b),
        other => Err(ExcelError::Argument(format!(
            "'{}' must be a bool, got {:?}",
            key, other
        ))),
    }
}

fn column_key(key: Arg) -> Result<ColumnRef> {
    match key {
        Arg::Int(i) if i >= 0 => Ok(ColumnRef::Position(i as usize)),
        Arg::Str(label) => Ok(ColumnRef::from(label)),
        other => Err(ExcelError::Argument(format!(
            "column keys must be positions or labels, got {:?}",
            other
        ))),
    }
}

fn sheet_ref(value: Arg) -> Result<SheetRef> {
    match value {
        Arg::Int(i) if i >= 0 => Ok(SheetRef::Index(i as usize)),
        Arg::Str(name) => Ok(SheetRef::Name(name)),
        other => Err(ExcelError::Argument(format!(
            "sheet_name must be a sheet position or name, got {:?}",
            other
        ))),
    }
}

fn sheet_arg(value: Arg) -> Result<SheetSelector> {
    match value {
        Arg::None => Ok(SheetSelector::All),
        Arg::List(items) => Ok(SheetSelector::List(
            items.into_iter().map(sheet_ref).collect::<Result<_>>()?,
        )),
        single => Ok(match sheet_ref(single)? {
            SheetRef::Index(i) => SheetSelector::Index(i),
            SheetRef::Name(name) => SheetSelector::Name(name),
        }),
    }
}

fn header_arg(value: Arg) -> Result<HeaderSpec> {
    match value {
        Arg::None => Ok(HeaderSpec::None),
        Arg::Bool(_) => Err(ExcelError::HeaderSpec(
            "Passing a bool to header is invalid. Use header=None for no header or \
             header=int or list-like of ints to specify the row(s) making up the column names"
                .to_string(),
        )),
        Arg::Int(i) if i >= 0 => Ok(HeaderSpec::Row(i as usize)),
        Arg::List(items) => int_list(&items)
            .map(HeaderSpec::Rows)
            .ok_or_else(|| ExcelError::HeaderSpec("header rows must be integers >=0".to_string())),
        other => Err(ExcelError::HeaderSpec(format!(
            "header must be an integer, a list of integers or None, got {:?}",
            other
        ))),
    }
}

fn index_arg(value: Arg) -> Result<IndexSpec> {
    match value {
        Arg::None => Ok(IndexSpec::None),
        Arg::Int(i) if i >= 0 => Ok(IndexSpec::Column(i as usize)),
        Arg::List(items) => int_list(&items)
            .map(IndexSpec::Columns)
            .ok_or_else(|| argument("index_col must be integers >=0")),
        other => Err(ExcelError::Argument(format!(
            "index_col must be an integer, a list of integers or None, got {:?}",
            other
        ))),
    }
}

fn usecols_arg(value: Arg) -> Result<Option<ColumnSpec>> {
    match value {
        Arg::None => Ok(None),
        Arg::Int(i) if i >= 0 => Ok(Some(ColumnSpec::UpTo(i as usize))),
        Arg::Str(range) => Ok(Some(ColumnSpec::Range(range))),
        Arg::List(items) => {
            let refs = items
                .into_iter()
                .map(|item| match item {
                    Arg::Int(i) if i >= 0 => Ok(ColumnRef::Position(i as usize)),
                    Arg::Str(label) => Ok(ColumnRef::from(label)),
                    _ => Err(ExcelError::ColumnSpecType),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Some(ColumnSpec::Mixed(refs)))
        }
        _ => Err(ExcelError::ColumnSpecType),
    }
}

fn skiprows_arg(value: Arg) -> Result<SkipRows> {
    match value {
        Arg::None => Ok(SkipRows::None),
        Arg::Int(i) if i >= 0 => Ok(SkipRows::Count(i as usize)),
        Arg::List(items) => int_list(&items)
            .map(SkipRows::Rows)
            .ok_or_else(|| argument("skiprows must be integers >=0")),
        other => Err(ExcelError::Argument(format!(
            "skiprows must be an integer or a list of integers, got {:?}",
            other
        ))),
    }
}

fn dtype_arg(value: Arg) -> Result<DtypeMap> {
    match value {
        Arg::None => Ok(DtypeMap::new()),
        Arg::Map(pairs) => {
            let mut map = DtypeMap::new();
            for (key, dtype) in pairs {
                let dtype: Dtype = match dtype {
                    Arg::Str(name) => name.parse()?,
                    other => {
                        return Err(ExcelError::Argument(format!(
                            "data type {:?} not understood",
                            other
                        )))
                    }
                };
                map = map.with(column_key(key)?, dtype);
            }
            Ok(map)
        }
        _ => Err(argument("'dtype' must map columns to type names")),
    }
}

fn na_strings(value: Arg) -> Result<Vec<String>> {
    let items = match value {
        Arg::List(items) => items,
        single => vec![single],
    };
    items
        .into_iter()
        .map(|item| match item {
            Arg::Str(s) => Ok(s),
            Arg::Int(i) => Ok(i.to_string()),
            Arg::Float(f) => Ok(f.to_string()),
            other => Err(ExcelError::Argument(format!(
                "na_values entries must be strings or numbers, got {:?}",
                other
            ))),
        })
        .collect()
}

fn na_arg(value: Arg) -> Result<NaValues> {
    match value {
        Arg::None => Ok(NaValues::None),
        Arg::Map(pairs) => {
            let mut map = IndexMap::new();
            for (key, values) in pairs {
                map.insert(column_key(key)?, na_strings(values)?);
            }
            Ok(NaValues::PerColumn(map))
        }
        other => Ok(NaValues::List(na_strings(other)?)),
    }
}
