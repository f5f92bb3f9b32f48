//! Column selection
//!
//! A [`ColumnSpec`] names the columns a caller wants by position, label,
//! spreadsheet letter range or predicate. Resolution always produces
//! ascending, de-duplicated positions, so the order in which columns were
//! requested never reorders the output.

use crate::error::{ExcelError, Result};
use crate::types::Label;
use std::fmt;
use std::sync::Arc;

/// Last column addressable in a worksheet (XFD)
pub const MAX_COLUMNS: usize = 16_384;

/// Predicate over column labels
pub type LabelPredicate = Arc<dyn Fn(&Label) -> bool + Send + Sync>;

/// Reference to one column, by position or by label
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnRef {
    Position(usize),
    Label(Label),
}

impl From<usize> for ColumnRef {
    fn from(position: usize) -> Self {
        ColumnRef::Position(position)
    }
}

impl From<&str> for ColumnRef {
    fn from(label: &str) -> Self {
        ColumnRef::Label(Label::from(label))
    }
}

impl From<String> for ColumnRef {
    fn from(label: String) -> Self {
        ColumnRef::Label(Label::from(label))
    }
}

impl From<Label> for ColumnRef {
    fn from(label: Label) -> Self {
        ColumnRef::Label(label)
    }
}

impl ColumnRef {
    /// Position of this column among `labels`
    pub fn position(&self, labels: &[Label]) -> Option<usize> {
        match self {
            ColumnRef::Position(p) => (*p < labels.len()).then_some(*p),
            ColumnRef::Label(label) => labels.iter().position(|l| l == label),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Position(p) => write!(f, "{}", p),
            ColumnRef::Label(label) => write!(f, "{}", label),
        }
    }
}

/// Which columns to read
#[derive(Clone)]
pub enum ColumnSpec {
    /// Legacy form: every column up to and including this position.
    ///
    /// Deprecated; pass [`ColumnSpec::Indices`] instead.
    UpTo(usize),
    /// 0-based positions
    Indices(Vec<usize>),
    /// A single header label
    Label(Label),
    /// Header labels
    Labels(Vec<Label>),
    /// Spreadsheet letter codes such as `"A,C:D"`
    Range(String),
    /// Columns whose label satisfies the predicate
    Predicate(LabelPredicate),
    /// Loosely typed list; must be all positions or all labels
    Mixed(Vec<ColumnRef>),
}

impl fmt::Debug for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnSpec::UpTo(n) => f.debug_tuple("UpTo").field(n).finish(),
            ColumnSpec::Indices(v) => f.debug_tuple("Indices").field(v).finish(),
            ColumnSpec::Label(l) => f.debug_tuple("Label").field(l).finish(),
            ColumnSpec::Labels(v) => f.debug_tuple("Labels").field(v).finish(),
            ColumnSpec::Range(s) => f.debug_tuple("Range").field(s).finish(),
            ColumnSpec::Predicate(_) => f.write_str("Predicate(..)"),
            ColumnSpec::Mixed(v) => f.debug_tuple("Mixed").field(v).finish(),
        }
    }
}

impl ColumnSpec {
    /// Select columns by predicate over labels
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Label) -> bool + Send + Sync + 'static,
    {
        ColumnSpec::Predicate(Arc::new(f))
    }

    /// Select columns by labels
    pub fn labels<L: Into<Label>>(labels: impl IntoIterator<Item = L>) -> Self {
        ColumnSpec::Labels(labels.into_iter().map(Into::into).collect())
    }

    /// Resolve against the labels of every column in the sheet.
    ///
    /// Returns ascending positions without duplicates.
    pub fn resolve(&self, labels: &[Label]) -> Result<Vec<usize>> {
        let width = labels.len();
        let mut positions = match self {
            ColumnSpec::UpTo(last) => {
                log::warn!(
                    "Passing an integer column count is deprecated; pass a list of positions instead"
                );
                (0..width).take_while(|p| p <= last).collect()
            }
            ColumnSpec::Indices(indices) => {
                let missing: Vec<String> = indices
                    .iter()
                    .filter(|p| **p >= width)
                    .map(|p| p.to_string())
                    .collect();
                if !missing.is_empty() {
                    return Err(ExcelError::ColumnsNotFound(missing));
                }
                indices.clone()
            }
            ColumnSpec::Label(label) => resolve_labels(std::slice::from_ref(label), labels)?,
            ColumnSpec::Labels(wanted) => resolve_labels(wanted, labels)?,
            ColumnSpec::Range(range) => parse_range(range)?
                .into_iter()
                .filter(|p| *p < width)
                .collect(),
            ColumnSpec::Predicate(pred) => labels
                .iter()
                .enumerate()
                .filter(|(_, label)| pred(label))
                .map(|(p, _)| p)
                .collect(),
            ColumnSpec::Mixed(refs) => return Self::from_refs(refs)?.resolve(labels),
        };
        positions.sort_unstable();
        positions.dedup();
        Ok(positions)
    }

    /// Turn a loosely typed list into a uniform spec
    fn from_refs(refs: &[ColumnRef]) -> Result<Self> {
        let positions: Vec<usize> = refs
            .iter()
            .filter_map(|r| match r {
                ColumnRef::Position(p) => Some(*p),
                ColumnRef::Label(_) => None,
            })
            .collect();
        if positions.len() == refs.len() {
            return Ok(ColumnSpec::Indices(positions));
        }
        if positions.is_empty() {
            let labels = refs
                .iter()
                .filter_map(|r| match r {
                    ColumnRef::Label(l) => Some(l.clone()),
                    ColumnRef::Position(_) => None,
                })
                .collect();
            return Ok(ColumnSpec::Labels(labels));
        }
        Err(ExcelError::ColumnSpecType)
    }
}

fn resolve_labels(wanted: &[Label], labels: &[Label]) -> Result<Vec<usize>> {
    let mut positions = Vec::with_capacity(wanted.len());
    let mut missing = Vec::new();
    for label in wanted {
        match labels.iter().position(|l| l == label) {
            Some(p) => positions.push(p),
            None => missing.push(label.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(ExcelError::ColumnsNotFound(missing));
    }
    Ok(positions)
}

/// Parse a letter range such as `"A,C:D"` into 0-based positions
pub fn parse_range(spec: &str) -> Result<Vec<usize>> {
    let mut positions = Vec::new();
    for token in spec.split(',') {
        let token = token.trim();
        match token.split_once(':') {
            Some((start, end)) => {
                let start = column_letter_to_index(start)?;
                let end = column_letter_to_index(end)?;
                positions.extend(start..=end);
            }
            None => positions.push(column_letter_to_index(token)?),
        }
    }
    Ok(positions)
}

/// Convert a column code to a 0-based index (A -> 0, Z -> 25, AA -> 26)
pub fn column_letter_to_index(code: &str) -> Result<usize> {
    let code = code.trim();
    if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ExcelError::InvalidColumnName(code.to_string()));
    }

    let mut index = 0usize;
    for ch in code.chars() {
        index = index * 26 + (ch.to_ascii_uppercase() as usize - 'A' as usize + 1);
        if index > MAX_COLUMNS {
            return Err(ExcelError::InvalidColumnName(code.to_string()));
        }
    }
    Ok(index - 1)
}

/// Convert a 0-based index to a column code (0 -> A, 25 -> Z, 26 -> AA)
pub fn index_to_column_letter(index: usize) -> String {
    let mut result = String::new();
    let mut col = index + 1;

    while col > 0 {
        col -= 1;
        result.insert(0, (b'A' + (col % 26) as u8) as char);
        col /= 26;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<Label> {
        names.iter().map(|n| Label::from(*n)).collect()
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letter_to_index("A").unwrap(), 0);
        assert_eq!(column_letter_to_index("z").unwrap(), 25);
        assert_eq!(column_letter_to_index("AA").unwrap(), 26);
        assert_eq!(column_letter_to_index("XFD").unwrap(), MAX_COLUMNS - 1);
        assert!(column_letter_to_index("XFE").is_err());

        assert_eq!(index_to_column_letter(0), "A");
        assert_eq!(index_to_column_letter(25), "Z");
        assert_eq!(index_to_column_letter(26), "AA");
    }

    #[test]
    fn test_range_matches_index_list() {
        let cols = labels(&["a", "b", "c", "d", "e"]);
        let by_range = ColumnSpec::Range("A,C:D".to_string()).resolve(&cols).unwrap();
        let by_index = ColumnSpec::Indices(vec![0, 2, 3]).resolve(&cols).unwrap();
        assert_eq!(by_range, vec![0, 2, 3]);
        assert_eq!(by_range, by_index);
    }

    #[test]
    fn test_invalid_range_token() {
        let err = ColumnSpec::Range("D:E1".to_string())
            .resolve(&labels(&["a"]))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid column name: E1");
    }

    #[test]
    fn test_request_order_is_ignored() {
        let cols = labels(&["a", "b", "c", "d"]);
        for order in [[0, 1, 3], [0, 3, 1], [1, 0, 3], [1, 3, 0], [3, 0, 1], [3, 1, 0]] {
            let resolved = ColumnSpec::Indices(order.to_vec()).resolve(&cols).unwrap();
            assert_eq!(resolved, vec![0, 1, 3]);
        }
        let resolved = ColumnSpec::labels(["d", "b"]).resolve(&cols).unwrap();
        assert_eq!(resolved, vec![1, 3]);
    }

    #[test]
    fn test_missing_labels_reported_together() {
        let err = ColumnSpec::labels(["E", "a", "F"])
            .resolve(&labels(&["a", "b"]))
            .unwrap_err();
        assert!(matches!(&err, ExcelError::ColumnsNotFound(m) if m == &["E", "F"]));
    }

    #[test]
    fn test_mixed_spec_must_be_uniform() {
        let cols = labels(&["a", "b"]);
        let spec = ColumnSpec::Mixed(vec!["E1".into(), 0usize.into()]);
        assert!(matches!(spec.resolve(&cols), Err(ExcelError::ColumnSpecType)));

        let spec = ColumnSpec::Mixed(vec![1usize.into(), 0usize.into()]);
        assert_eq!(spec.resolve(&cols).unwrap(), vec![0, 1]);

        let spec = ColumnSpec::Mixed(vec!["b".into()]);
        assert_eq!(spec.resolve(&cols).unwrap(), vec![1]);
    }

    #[test]
    fn test_legacy_up_to_is_inclusive() {
        let cols = labels(&["i", "a", "b", "c", "d"]);
        assert_eq!(ColumnSpec::UpTo(3).resolve(&cols).unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_up_to_past_width_stops_at_last_column() {
        let cols = labels(&["a", "b", "c"]);
        assert_eq!(ColumnSpec::UpTo(usize::MAX).resolve(&cols).unwrap(), vec![0, 1, 2]);
        assert!(ColumnSpec::UpTo(usize::MAX).resolve(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_predicate() {
        let cols = labels(&["keep_a", "drop", "keep_b"]);
        let spec = ColumnSpec::predicate(|l| l.to_string().starts_with("keep"));
        assert_eq!(spec.resolve(&cols).unwrap(), vec![0, 2]);
    }

    #[test]
    fn test_position_out_of_range() {
        let err = ColumnSpec::Indices(vec![0, 7]).resolve(&labels(&["a"])).unwrap_err();
        assert!(matches!(&err, ExcelError::ColumnsNotFound(m) if m == &["7"]));
    }
}
