//! Cell to value coercion
//!
//! Each column is converted as a whole: a converter wins over an explicit
//! dtype, which wins over inference from the cell types. Missing-value
//! tokens are masked before inference so they never influence the dtype.

use crate::columns::ColumnRef;
use crate::error::{ExcelError, Result};
use crate::types::{format_number, CellValue, DateEpoch, Dtype, Label, Value};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Strings read as missing unless `keep_default_na` is off
pub const DEFAULT_NA_VALUES: &[&str] = &[
    "",
    "#N/A",
    "#N/A N/A",
    "#NA",
    "-1.#IND",
    "-1.#QNAN",
    "-NaN",
    "-nan",
    "1.#IND",
    "1.#QNAN",
    "N/A",
    "NA",
    "NULL",
    "NaN",
    "n/a",
    "nan",
    "null",
];

/// Per-cell conversion function; receives the raw decoded cell
pub type Converter = Arc<dyn Fn(&CellValue) -> Value + Send + Sync>;

/// Converters keyed by column position or label
#[derive(Clone, Default)]
pub struct Converters {
    entries: IndexMap<ColumnRef, Converter>,
}

impl Converters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a converter for one column
    pub fn with<F>(mut self, column: impl Into<ColumnRef>, f: F) -> Self
    where
        F: Fn(&CellValue) -> Value + Send + Sync + 'static,
    {
        self.entries.insert(column.into(), Arc::new(f));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ColumnRef> {
        self.entries.keys()
    }

    fn lookup(&self, position: usize, label: &Label) -> Option<&Converter> {
        self.entries
            .iter()
            .find(|(key, _)| refers_to(key, position, label))
            .map(|(_, f)| f)
    }
}

impl fmt::Debug for Converters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

/// Requested dtypes keyed by column position or label
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DtypeMap {
    entries: IndexMap<ColumnRef, Dtype>,
}

impl DtypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<ColumnRef>, dtype: Dtype) -> Self {
        self.entries.insert(column.into(), dtype);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ColumnRef> {
        self.entries.keys()
    }

    fn lookup(&self, position: usize, label: &Label) -> Option<Dtype> {
        self.entries
            .iter()
            .find(|(key, _)| refers_to(key, position, label))
            .map(|(_, d)| *d)
    }
}

/// Extra strings to treat as missing
#[derive(Debug, Clone, Default, PartialEq)]
pub enum NaValues {
    #[default]
    None,
    /// Applies to every column
    List(Vec<String>),
    /// Applies to the named columns only
    PerColumn(IndexMap<ColumnRef, Vec<String>>),
}

impl NaValues {
    pub fn list<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        NaValues::List(values.into_iter().map(Into::into).collect())
    }
}

fn refers_to(key: &ColumnRef, position: usize, label: &Label) -> bool {
    match key {
        ColumnRef::Position(p) => *p == position,
        ColumnRef::Label(l) => l == label,
    }
}

/// Missing-value matcher for one column
#[derive(Debug, Default)]
struct NaPolicy {
    tokens: HashSet<String>,
    numbers: Vec<f64>,
}

impl NaPolicy {
    fn for_column(
        na_values: &NaValues,
        keep_default_na: bool,
        position: usize,
        label: &Label,
    ) -> Self {
        let mut tokens: HashSet<String> = HashSet::new();
        if keep_default_na {
            tokens.extend(DEFAULT_NA_VALUES.iter().map(|s| s.to_string()));
        }
        match na_values {
            NaValues::None => {}
            NaValues::List(values) => tokens.extend(values.iter().cloned()),
            NaValues::PerColumn(map) => {
                for (key, values) in map {
                    if refers_to(key, position, label) {
                        tokens.extend(values.iter().cloned());
                    }
                }
            }
        }
        let numbers = tokens
            .iter()
            .filter_map(|t| t.trim().parse::<f64>().ok())
            .filter(|f| f.is_finite())
            .collect();
        NaPolicy { tokens, numbers }
    }

    fn is_na_str(&self, s: &str) -> bool {
        s.is_empty() || self.tokens.contains(s)
    }

    fn is_na_number(&self, f: f64) -> bool {
        f.is_nan() || self.numbers.iter().any(|n| *n == f)
    }

    /// Mask a converter output
    fn mask(&self, value: Value) -> Value {
        match &value {
            Value::Str(s) if self.is_na_str(s) => Value::Missing,
            Value::Float(f) if self.is_na_number(*f) => Value::Missing,
            Value::Int(i) if self.is_na_number(*i as f64) => Value::Missing,
            _ => value,
        }
    }
}

/// Options shared by every column of one sheet
#[derive(Debug, Clone, Copy)]
pub struct CoerceOptions<'a> {
    pub convert_float: bool,
    pub keep_default_na: bool,
    pub na_values: &'a NaValues,
    pub converters: &'a Converters,
    pub dtypes: &'a DtypeMap,
    pub epoch: DateEpoch,
}

/// Convert the raw cells of one column.
///
/// `position` counts among the selected columns (index columns included);
/// converters, dtypes and per-column NA values are matched by it or by `label`.
pub fn coerce_column(
    cells: &[CellValue],
    position: usize,
    label: &Label,
    opts: &CoerceOptions<'_>,
) -> Result<(Dtype, Vec<Value>)> {
    let na = NaPolicy::for_column(opts.na_values, opts.keep_default_na, position, label);
    let requested = opts.dtypes.lookup(position, label);

    if let Some(converter) = opts.converters.lookup(position, label) {
        if requested.is_some() {
            log::warn!(
                "Both a converter and dtype were specified for column {} - only the converter will be used",
                label
            );
        }
        let values: Vec<Value> = cells.iter().map(|c| na.mask(converter(c))).collect();
        return Ok(finish(values));
    }

    let values: Vec<Value> = cells
        .iter()
        .map(|c| cell_to_value(c, &na, opts.convert_float, opts.epoch))
        .collect();

    match requested {
        Some(dtype) => {
            let values = cast(values, dtype, label)?;
            Ok((dtype, values))
        }
        None => Ok(finish(values)),
    }
}

/// Infer the dtype and normalize values to it
fn finish(values: Vec<Value>) -> (Dtype, Vec<Value>) {
    let dtype = infer_dtype(&values);
    let values = if dtype == Dtype::Float64 {
        values
            .into_iter()
            .map(|v| match v {
                Value::Int(i) => Value::Float(i as f64),
                Value::Float(f) if f.is_nan() => Value::Missing,
                other => other,
            })
            .collect()
    } else {
        values
    };
    (dtype, values)
}

fn number_value(f: f64, convert_float: bool) -> Value {
    if convert_float && f.is_finite() && f.fract() == 0.0 && f.abs() < 9.2e18 {
        Value::Int(f as i64)
    } else {
        Value::Float(f)
    }
}

/// Default decoding of one cell
fn cell_to_value(cell: &CellValue, na: &NaPolicy, convert_float: bool, epoch: DateEpoch) -> Value {
    match cell {
        CellValue::Empty | CellValue::Error(_) => Value::Missing,
        CellValue::String(s) if na.is_na_str(s) => Value::Missing,
        CellValue::String(s) => Value::Str(s.clone()),
        CellValue::Number(f) if na.is_na_number(*f) => Value::Missing,
        CellValue::Number(f) => number_value(*f, convert_float),
        CellValue::Bool(b) => Value::Bool(*b),
        CellValue::Date(serial) if (0.0..1.0).contains(serial) => epoch
            .to_time(*serial)
            .map(Value::Time)
            .unwrap_or_else(|| number_value(*serial, convert_float)),
        CellValue::Date(serial) => epoch
            .to_datetime(*serial)
            .map(Value::DateTime)
            .unwrap_or_else(|| number_value(*serial, convert_float)),
        CellValue::Time(serial) => epoch
            .to_time(*serial)
            .map(Value::Time)
            .unwrap_or_else(|| number_value(*serial, convert_float)),
    }
}

/// Dtype of a column of already-decoded values
pub fn infer_dtype(values: &[Value]) -> Dtype {
    let (mut ints, mut floats, mut bools, mut strs, mut dates, mut times, mut missing) =
        (false, false, false, false, false, false, false);
    for value in values {
        match value {
            Value::Missing => missing = true,
            Value::Int(_) => ints = true,
            Value::Float(f) if f.is_nan() => missing = true,
            Value::Float(_) => floats = true,
            Value::Bool(_) => bools = true,
            Value::Str(_) => strs = true,
            Value::DateTime(_) => dates = true,
            Value::Time(_) => times = true,
        }
    }

    let numeric = ints || floats;
    let kinds = [numeric, bools, strs, dates, times]
        .iter()
        .filter(|k| **k)
        .count();
    match kinds {
        0 if values.is_empty() => Dtype::Object,
        0 => Dtype::Float64,
        1 if numeric => {
            if floats || missing {
                Dtype::Float64
            } else {
                Dtype::Int64
            }
        }
        1 if bools => {
            if missing {
                Dtype::Object
            } else {
                Dtype::Bool
            }
        }
        1 if strs => Dtype::Str,
        1 if dates => Dtype::DateTime,
        1 => Dtype::Time,
        _ => Dtype::Object,
    }
}

/// Cast every value of a column to `dtype`
pub fn cast(values: Vec<Value>, dtype: Dtype, label: &Label) -> Result<Vec<Value>> {
    values
        .into_iter()
        .map(|v| cast_value(v, dtype).map_err(|reason| ExcelError::dtype(label.to_string(), reason)))
        .collect()
}

fn cast_value(value: Value, dtype: Dtype) -> std::result::Result<Value, String> {
    match dtype {
        Dtype::Int64 | Dtype::Int32 => {
            let i = match value {
                Value::Missing => {
                    return Err(format!("cannot convert missing values to {}", dtype))
                }
                Value::Int(i) => i,
                Value::Float(f) if f.is_nan() => {
                    return Err(format!("cannot convert missing values to {}", dtype))
                }
                Value::Float(f) if f.fract() == 0.0 && f.abs() < 9.2e18 => f as i64,
                Value::Bool(b) => b as i64,
                Value::Str(ref s) => s
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| format!("invalid literal '{}' for {}", s, dtype))?,
                other => {
                    return Err(format!("cannot safely cast value {} to {}", other, dtype))
                }
            };
            if dtype == Dtype::Int32 && i32::try_from(i).is_err() {
                return Err(format!("value {} out of range for int32", i));
            }
            Ok(Value::Int(i))
        }
        Dtype::Float64 | Dtype::Float32 => {
            let f = match value {
                Value::Missing => return Ok(Value::Missing),
                Value::Int(i) => i as f64,
                Value::Float(f) if f.is_nan() => return Ok(Value::Missing),
                Value::Float(f) => f,
                Value::Bool(b) => f64::from(u8::from(b)),
                Value::Str(ref s) => s
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| format!("could not convert string '{}' to {}", s, dtype))?,
                other => return Err(format!("cannot cast value {} to {}", other, dtype)),
            };
            if dtype == Dtype::Float32 {
                Ok(Value::Float(f as f32 as f64))
            } else {
                Ok(Value::Float(f))
            }
        }
        Dtype::Str => Ok(match value {
            Value::Missing => Value::Missing,
            Value::Int(i) => {
                let mut buf = itoa::Buffer::new();
                Value::Str(buf.format(i).to_string())
            }
            Value::Float(f) if f.is_nan() => Value::Missing,
            Value::Float(f) if f.fract() == 0.0 => Value::Str(format!("{:?}", f)),
            Value::Float(f) => Value::Str(format_number(f)),
            Value::Bool(b) => Value::Str(if b { "True" } else { "False" }.to_string()),
            Value::Str(s) => Value::Str(s),
            Value::DateTime(dt) => Value::Str(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            Value::Time(t) => Value::Str(t.format("%H:%M:%S").to_string()),
        }),
        Dtype::Bool => match value {
            Value::Bool(b) => Ok(Value::Bool(b)),
            Value::Int(i) => Ok(Value::Bool(i != 0)),
            Value::Float(f) if !f.is_nan() => Ok(Value::Bool(f != 0.0)),
            Value::Str(ref s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
            Value::Str(ref s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
            Value::Missing | Value::Float(_) => Err("cannot convert missing values to bool".to_string()),
            other => Err(format!("cannot cast value {} to bool", other)),
        },
        Dtype::DateTime => match value {
            Value::DateTime(_) | Value::Missing => Ok(value),
            other => Err(format!("cannot cast value {} to {}", other, dtype)),
        },
        Dtype::Time => match value {
            Value::Time(_) | Value::Missing => Ok(value),
            other => Err(format!("cannot cast value {} to {}", other, dtype)),
        },
        Dtype::Object => Ok(value),
    }
}
