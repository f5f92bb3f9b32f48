//! Workbook decoding backends
//!
//! Decoding is delegated to calamine. [`Engine`] picks the container format
//! explicitly or lets calamine sniff it from the bytes.

use crate::error::{ExcelError, Result};
use crate::grid::{Grid, Workbook};
use crate::types::{CellValue, DateEpoch};
use calamine::{open_workbook_auto_from_rs, Data, Ods, Range, Reader, Sheets, Xls, Xlsb, Xlsx};
use chrono::NaiveDateTime;
use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

/// Decoding backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Engine {
    /// Detect the format from the file contents
    #[default]
    Auto,
    /// Office Open XML (xlsx, xlsm)
    Xlsx,
    /// Legacy BIFF (xls)
    Xls,
    /// Binary workbook (xlsb)
    Xlsb,
    /// OpenDocument spreadsheet (ods)
    Ods,
}

impl Engine {
    /// All names accepted by [`Engine::from_str`]
    pub const NAMES: &'static [&'static str] =
        &["auto", "calamine", "xlsx", "xlsm", "xls", "xlsb", "ods"];
}

impl FromStr for Engine {
    type Err = ExcelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" | "calamine" => Ok(Engine::Auto),
            "xlsx" | "xlsm" => Ok(Engine::Xlsx),
            "xls" => Ok(Engine::Xls),
            "xlsb" => Ok(Engine::Xlsb),
            "ods" => Ok(Engine::Ods),
            other => Err(ExcelError::UnknownEngine(other.to_string())),
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Engine::Auto => "auto",
            Engine::Xlsx => "xlsx",
            Engine::Xls => "xls",
            Engine::Xlsb => "xlsb",
            Engine::Ods => "ods",
        };
        f.write_str(name)
    }
}

fn format_error(err: impl fmt::Display) -> ExcelError {
    ExcelError::Format(err.to_string())
}

/// Workbook decoded by calamine from an in-memory buffer
pub struct CalamineWorkbook {
    sheets: Sheets<Cursor<Vec<u8>>>,
    sheet_names: Vec<String>,
}

impl CalamineWorkbook {
    /// Open a workbook file
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use excelframe::engine::{CalamineWorkbook, Engine};
    ///
    /// let workbook = CalamineWorkbook::open("data.xlsx", Engine::Auto).unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P, engine: Engine) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        log::debug!(
            "read {} bytes from {}",
            bytes.len(),
            path.as_ref().display()
        );
        Self::from_bytes(bytes, engine)
    }

    /// Decode a workbook held in memory
    pub fn from_bytes(bytes: Vec<u8>, engine: Engine) -> Result<Self> {
        let cursor = Cursor::new(bytes);
        let sheets = match engine {
            Engine::Auto => open_workbook_auto_from_rs(cursor).map_err(format_error)?,
            Engine::Xlsx => Sheets::Xlsx(Xlsx::new(cursor).map_err(format_error)?),
            Engine::Xls => Sheets::Xls(Xls::new(cursor).map_err(format_error)?),
            Engine::Xlsb => Sheets::Xlsb(Xlsb::new(cursor).map_err(format_error)?),
            Engine::Ods => Sheets::Ods(Ods::new(cursor).map_err(format_error)?),
        };
        let sheet_names = sheets.sheet_names().to_vec();
        log::debug!("{} engine found {} sheets: {:?}", engine, sheet_names.len(), sheet_names);

        Ok(CalamineWorkbook {
            sheets,
            sheet_names,
        })
    }
}

impl Workbook for CalamineWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheet_names.clone()
    }

    fn sheet_at(&mut self, index: usize) -> Result<Grid> {
        let name = self
            .sheet_names
            .get(index)
            .ok_or_else(|| ExcelError::SheetNotFound {
                sheet: format!("index {}", index),
                available: self.sheet_names.join(", "),
            })?
            .clone();

        let range = self.sheets.worksheet_range(&name)?;
        Ok(range_to_grid(&range))
    }
}

/// Copy a calamine range into a grid anchored at A1
fn range_to_grid(range: &Range<Data>) -> Grid {
    let epoch = detect_epoch(range);
    let Some((end_row, end_col)) = range.end() else {
        return Grid::from_rows(Vec::new(), epoch);
    };

    let rows = (0..=end_row)
        .map(|row| {
            (0..=end_col)
                .map(|col| {
                    range
                        .get_value((row, col))
                        .map(|data| data_to_cellvalue(data, epoch))
                        .unwrap_or(CellValue::Empty)
                })
                .collect()
        })
        .collect();

    Grid::from_rows(rows, epoch)
}

/// calamine keeps the 1904 flag private; recover it by comparing its own
/// decoding of the first date cell against both date systems.
fn detect_epoch(range: &Range<Data>) -> DateEpoch {
    for data in range.used_cells().map(|(_, _, data)| data) {
        if let Data::DateTime(dt) = data {
            if dt.is_duration() {
                continue;
            }
            if let Some(decoded) = dt.as_datetime() {
                let as_1904 = DateEpoch::Excel1904.to_datetime(dt.as_f64());
                let as_1900 = DateEpoch::Excel1900.to_datetime(dt.as_f64());
                if as_1904.map(|d| d.date()) == Some(decoded.date())
                    && as_1900.map(|d| d.date()) != Some(decoded.date())
                {
                    return DateEpoch::Excel1904;
                }
                return DateEpoch::Excel1900;
            }
        }
    }
    DateEpoch::Excel1900
}

/// Convert calamine Data to our CellValue
fn data_to_cellvalue(data: &Data, epoch: DateEpoch) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) if dt.is_duration() => CellValue::Time(dt.as_f64()),
        Data::DateTime(dt) => CellValue::Date(dt.as_f64()),
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .and_then(|dt| epoch.to_serial(dt))
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::String(s.clone())),
        Data::DurationIso(s) => parse_iso_duration(s)
            .map(CellValue::Time)
            .unwrap_or_else(|| CellValue::String(s.clone())),
        Data::Error(e) => CellValue::Error(format!("{:?}", e)),
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parse an ISO 8601 duration such as `PT36H30M00S` into days
fn parse_iso_duration(s: &str) -> Option<f64> {
    let (sign, rest) = match s.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, s),
    };
    let rest = rest.strip_prefix('P')?;
    let mut seconds = 0.0;
    let mut number = String::new();
    let mut in_time = false;
    for c in rest.chars() {
        let unit = match c {
            '0'..='9' | '.' => {
                number.push(c);
                continue;
            }
            'T' if !in_time && number.is_empty() => {
                in_time = true;
                continue;
            }
            'D' if !in_time => 86_400.0,
            'H' if in_time => 3_600.0,
            'M' if in_time => 60.0,
            'S' if in_time => 1.0,
            _ => return None,
        };
        seconds += number.parse::<f64>().ok()? * unit;
        number.clear();
    }
    if !number.is_empty() {
        return None;
    }
    Some(sign * seconds / 86_400.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_names() {
        for name in Engine::NAMES {
            assert!(name.parse::<Engine>().is_ok(), "{}", name);
        }
        assert_eq!("xlsm".parse::<Engine>().unwrap(), Engine::Xlsx);

        let err = "foo".parse::<Engine>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown engine: foo");
    }

    #[test]
    fn test_unrecognized_bytes() {
        let err = CalamineWorkbook::from_bytes(b"not a workbook".to_vec(), Engine::Auto)
            .err()
            .unwrap();
        assert!(matches!(err, ExcelError::Format(_)));
    }

    #[test]
    fn test_datatype_conversion() {
        let cv = data_to_cellvalue(&Data::String("test".to_string()), DateEpoch::Excel1900);
        assert_eq!(cv, CellValue::String("test".to_string()));

        let cv = data_to_cellvalue(&Data::Int(42), DateEpoch::Excel1900);
        assert_eq!(cv, CellValue::Number(42.0));

        let cv = data_to_cellvalue(
            &Data::DateTimeIso("2013-10-30".to_string()),
            DateEpoch::Excel1900,
        );
        assert_eq!(cv, CellValue::Date(41577.0));
    }

    #[test]
    fn test_iso_durations_become_time_serials() {
        let cv = data_to_cellvalue(&Data::DurationIso("PT12H00M00S".to_string()), DateEpoch::Excel1900);
        assert_eq!(cv, CellValue::Time(0.5));

        let cv = data_to_cellvalue(&Data::DurationIso("PT36H00M00S".to_string()), DateEpoch::Excel1900);
        assert_eq!(cv, CellValue::Time(1.5));

        assert_eq!(parse_iso_duration("P1DT6H"), Some(1.25));
        assert_eq!(parse_iso_duration("-PT6H"), Some(-0.25));
        assert_eq!(parse_iso_duration("PT1H30.5"), None);
        assert_eq!(parse_iso_duration("P1M"), None);

        let cv = data_to_cellvalue(&Data::DurationIso("soon".to_string()), DateEpoch::Excel1900);
        assert_eq!(cv, CellValue::String("soon".to_string()));
    }
}
