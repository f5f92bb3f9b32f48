//! Type definitions for sheet cells and parsed values

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;
use std::str::FromStr;

use crate::error::ExcelError;

/// Largest serial that still lands before year 10000.
const MAX_DATE_SERIAL: f64 = 2_958_466.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Represents a single raw cell value as decoded from a worksheet
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Empty cell
    Empty,
    /// String value
    String(String),
    /// Numeric value (all spreadsheet numbers are floating point)
    Number(f64),
    /// Boolean value
    Bool(bool),
    /// Date or datetime, as a serial number in the sheet's epoch
    Date(f64),
    /// Time of day or duration, in days
    Time(f64),
    /// Error value (`#DIV/0!`, `#N/A`, ...)
    Error(String),
}

impl CellValue {
    /// Convert cell value to string
    pub fn as_string(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::String(s) => s.clone(),
            CellValue::Number(f) => format_number(*f),
            CellValue::Bool(b) => if *b { "True" } else { "False" }.to_string(),
            CellValue::Date(d) | CellValue::Time(d) => d.to_string(),
            CellValue::Error(e) => e.clone(),
        }
    }

    /// Check if cell is empty
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Try to convert to float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(f) | CellValue::Date(f) | CellValue::Time(f) => Some(*f),
            CellValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Number(i as f64)
    }
}

impl From<i32> for CellValue {
    fn from(i: i32) -> Self {
        CellValue::Number(i as f64)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Number(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

/// Render a number the way a header label or string cast expects it:
/// whole values drop the fractional part.
pub(crate) fn format_number(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.2e18 {
        let mut buf = itoa::Buffer::new();
        buf.format(f as i64).to_string()
    } else {
        f.to_string()
    }
}

/// Reference date used to decode date serials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DateEpoch {
    /// 1900 date system (Windows default)
    #[default]
    Excel1900,
    /// 1904 date system (legacy Mac)
    Excel1904,
}

impl DateEpoch {
    fn base(self, serial: f64) -> Option<NaiveDateTime> {
        let date = match self {
            // Serials below 60 precede the phantom 1900-02-29.
            DateEpoch::Excel1900 if serial < 60.0 => NaiveDate::from_ymd_opt(1899, 12, 31)?,
            DateEpoch::Excel1900 => NaiveDate::from_ymd_opt(1899, 12, 30)?,
            DateEpoch::Excel1904 => NaiveDate::from_ymd_opt(1904, 1, 1)?,
        };
        date.and_hms_opt(0, 0, 0)
    }

    /// Decode a serial into a datetime, rounded to milliseconds.
    ///
    /// Returns `None` for negative serials and serials past year 9999.
    pub fn to_datetime(self, serial: f64) -> Option<NaiveDateTime> {
        if !serial.is_finite() || serial < 0.0 || serial >= MAX_DATE_SERIAL {
            return None;
        }
        let millis = (serial * MILLIS_PER_DAY).round() as i64;
        let dt = self
            .base(serial)?
            .checked_add_signed(Duration::milliseconds(millis))?;
        (dt.year() <= 9999).then_some(dt)
    }

    /// Encode a datetime as a serial in this date system
    pub fn to_serial(self, dt: NaiveDateTime) -> Option<f64> {
        let base = match self {
            DateEpoch::Excel1900 => NaiveDate::from_ymd_opt(1899, 12, 30)?,
            DateEpoch::Excel1904 => NaiveDate::from_ymd_opt(1904, 1, 1)?,
        }
        .and_hms_opt(0, 0, 0)?;
        let serial = (dt - base).num_milliseconds() as f64 / MILLIS_PER_DAY;
        match self {
            DateEpoch::Excel1900 if serial < 61.0 => Some(serial - 1.0),
            _ => Some(serial),
        }
    }

    /// Decode a serial below one day into a time of day.
    ///
    /// Longer durations have no time-of-day form and return `None`.
    pub fn to_time(self, serial: f64) -> Option<NaiveTime> {
        if !(0.0..1.0).contains(&serial) {
            return None;
        }
        let millis = (serial * MILLIS_PER_DAY).round() as u32 % 86_400_000;
        NaiveTime::from_num_seconds_from_midnight_opt(millis / 1000, (millis % 1000) * 1_000_000)
    }
}

/// A typed value in a parsed table
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Value {
    /// Missing marker (NaN / NaT)
    Missing,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => write!(f, "NaN"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Value::Str(s) => write!(f, "{}", s),
            Value::DateTime(dt) => write!(f, "{}", dt),
            Value::Time(t) => write!(f, "{}", t),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Column element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Dtype {
    Int64,
    Int32,
    Float64,
    Float32,
    Bool,
    Str,
    DateTime,
    Time,
    /// Heterogeneous values, kept cell by cell
    Object,
}

impl Dtype {
    pub fn name(&self) -> &'static str {
        match self {
            Dtype::Int64 => "int64",
            Dtype::Int32 => "int32",
            Dtype::Float64 => "float64",
            Dtype::Float32 => "float32",
            Dtype::Bool => "bool",
            Dtype::Str => "str",
            Dtype::DateTime => "datetime64",
            Dtype::Time => "time",
            Dtype::Object => "object",
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dtype {
    type Err = ExcelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int64" | "int" => Ok(Dtype::Int64),
            "int32" => Ok(Dtype::Int32),
            "float64" | "float" => Ok(Dtype::Float64),
            "float32" => Ok(Dtype::Float32),
            "bool" => Ok(Dtype::Bool),
            "str" | "string" => Ok(Dtype::Str),
            "datetime64" | "datetime" => Ok(Dtype::DateTime),
            "time" => Ok(Dtype::Time),
            "object" => Ok(Dtype::Object),
            other => Err(ExcelError::Argument(format!("data type '{}' not understood", other))),
        }
    }
}

/// Column or index label
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Label {
    /// Single-level label
    Name(String),
    /// One entry per header level
    Levels(Vec<String>),
}

impl Label {
    /// Placeholder for a column without a header value
    pub fn unnamed(position: usize) -> Self {
        Label::Name(unnamed(position))
    }

    pub fn is_unnamed(&self) -> bool {
        match self {
            Label::Name(name) => name.starts_with("Unnamed: "),
            Label::Levels(levels) => levels.iter().all(|l| l.starts_with("Unnamed: ")),
        }
    }
}

pub(crate) fn unnamed(position: usize) -> String {
    format!("Unnamed: {}", position)
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Name(name) => f.write_str(name),
            Label::Levels(levels) => write!(f, "({})", levels.join(", ")),
        }
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Label::Name(s.to_string())
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Label::Name(s)
    }
}

impl<S: Into<String>> From<Vec<S>> for Label {
    fn from(levels: Vec<S>) -> Self {
        Label::Levels(levels.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_date_epochs() {
        let d = DateEpoch::Excel1900.to_datetime(41577.0).unwrap();
        assert_eq!(d.date(), NaiveDate::from_ymd_opt(2013, 10, 30).unwrap());

        let d = DateEpoch::Excel1904.to_datetime(41577.0 - 1462.0).unwrap();
        assert_eq!(d.date(), NaiveDate::from_ymd_opt(2013, 10, 30).unwrap());

        // Before the phantom leap day
        let d = DateEpoch::Excel1900.to_datetime(1.0).unwrap();
        assert_eq!(d.date(), NaiveDate::from_ymd_opt(1900, 1, 1).unwrap());
    }

    #[test]
    fn test_serial_roundtrip_around_leap_bug() {
        for serial in [1.0, 59.0, 61.0, 41577.5] {
            let dt = DateEpoch::Excel1900.to_datetime(serial).unwrap();
            assert_eq!(DateEpoch::Excel1900.to_serial(dt), Some(serial));
        }
    }

    #[test]
    fn test_date_overflow() {
        assert_eq!(DateEpoch::Excel1900.to_datetime(1e20), None);
        assert_eq!(DateEpoch::Excel1900.to_datetime(-1.0), None);
    }

    #[test]
    fn test_time_millisecond_rounding() {
        // 02:45:56.100
        let serial = (2.0 * 3600.0 + 45.0 * 60.0 + 56.1) / 86400.0;
        let t = DateEpoch::Excel1900.to_time(serial).unwrap();
        assert_eq!((t.hour(), t.minute(), t.second()), (2, 45, 56));
        assert_eq!(t.nanosecond(), 100_000_000);
    }

    #[test]
    fn test_durations_past_a_day_do_not_wrap() {
        assert_eq!(DateEpoch::Excel1900.to_time(1.5), None);
        assert_eq!(DateEpoch::Excel1900.to_time(-0.25), None);
        assert_eq!(DateEpoch::Excel1900.to_time(f64::NAN), None);
        let t = DateEpoch::Excel1900.to_time(0.5).unwrap();
        assert_eq!(t.hour(), 12);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(CellValue::Bool(true).as_string(), "True");
    }

    #[test]
    fn test_dtype_from_str() {
        assert_eq!("float32".parse::<Dtype>().unwrap(), Dtype::Float32);
        assert!("complex".parse::<Dtype>().is_err());
    }

    #[test]
    fn test_dtype_names_parse_back() {
        for dtype in [
            Dtype::Int64,
            Dtype::Int32,
            Dtype::Float64,
            Dtype::Float32,
            Dtype::Bool,
            Dtype::Str,
            Dtype::DateTime,
            Dtype::Time,
            Dtype::Object,
        ] {
            assert_eq!(dtype.to_string().parse::<Dtype>().unwrap(), dtype);
        }
    }

    #[test]
    fn test_unnamed_label() {
        assert_eq!(Label::unnamed(3), Label::from("Unnamed: 3"));
        assert!(Label::unnamed(0).is_unnamed());
        assert!(!Label::from("a").is_unnamed());
    }
}
