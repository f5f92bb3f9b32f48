//! Error types for the excelframe library

use thiserror::Error;

/// Result type alias for excelframe operations
pub type Result<T> = std::result::Result<T, ExcelError>;

/// Broad category of an [`ExcelError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unreadable workbook, unknown engine or unknown sheet
    Format,
    /// Requested columns are missing, mistyped or malformed
    ColumnSpec,
    /// Invalid header argument
    HeaderSpec,
    /// Requested dtype does not fit the column values
    DtypeCoercion,
    /// Invalid or unknown argument
    Argument,
    /// Operation on a closed reader
    ResourceState,
}

/// Main error type for all read operations
#[derive(Error, Debug)]
pub enum ExcelError {
    /// Bytes are not a workbook any engine understands
    #[error("Unsupported workbook format: {0}")]
    Format(String),

    /// Engine name outside the known set
    #[error("Unknown engine: {0}")]
    UnknownEngine(String),

    /// Invalid sheet name or sheet not found
    #[error("Sheet '{sheet}' not found. Available sheets: {available}")]
    SheetNotFound { sheet: String, available: String },

    /// Requested column labels are absent from the header
    #[error("Usecols do not match columns, columns expected but not found: {0:?}")]
    ColumnsNotFound(Vec<String>),

    /// Malformed spreadsheet column code in a range string
    #[error("Invalid column name: {0}")]
    InvalidColumnName(String),

    /// Column request mixing labels and positions
    #[error("'usecols' must either be list-like of all strings, all integers or a callable.")]
    ColumnSpecType,

    /// Invalid header argument
    #[error("Invalid header: {0}")]
    HeaderSpec(String),

    /// Column values cannot be cast to the requested dtype
    #[error("Cannot convert column '{column}': {reason}")]
    DtypeCoercion { column: String, reason: String },

    /// Invalid argument value or unexpected keyword
    #[error("{0}")]
    Argument(String),

    /// Reader was used after `close()`
    #[error("I/O operation on closed workbook")]
    Closed,

    /// IO error wrapper
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Calamine error wrapper
    #[error("Calamine error: {0}")]
    CalamineError(String),
}

impl ExcelError {
    /// Taxonomy category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExcelError::Format(_)
            | ExcelError::UnknownEngine(_)
            | ExcelError::SheetNotFound { .. }
            | ExcelError::IoError(_)
            | ExcelError::CalamineError(_) => ErrorKind::Format,
            ExcelError::ColumnsNotFound(_)
            | ExcelError::InvalidColumnName(_)
            | ExcelError::ColumnSpecType => ErrorKind::ColumnSpec,
            ExcelError::HeaderSpec(_) => ErrorKind::HeaderSpec,
            ExcelError::DtypeCoercion { .. } => ErrorKind::DtypeCoercion,
            ExcelError::Argument(_) => ErrorKind::Argument,
            ExcelError::Closed => ErrorKind::ResourceState,
        }
    }

    pub(crate) fn dtype(column: impl Into<String>, reason: impl Into<String>) -> Self {
        ExcelError::DtypeCoercion {
            column: column.into(),
            reason: reason.into(),
        }
    }
}

impl From<calamine::Error> for ExcelError {
    fn from(err: calamine::Error) -> Self {
        ExcelError::CalamineError(err.to_string())
    }
}

impl From<calamine::XlsxError> for ExcelError {
    fn from(err: calamine::XlsxError) -> Self {
        ExcelError::CalamineError(err.to_string())
    }
}

impl From<calamine::XlsError> for ExcelError {
    fn from(err: calamine::XlsError) -> Self {
        ExcelError::CalamineError(err.to_string())
    }
}

impl From<calamine::XlsbError> for ExcelError {
    fn from(err: calamine::XlsbError) -> Self {
        ExcelError::CalamineError(err.to_string())
    }
}

impl From<calamine::OdsError> for ExcelError {
    fn from(err: calamine::OdsError) -> Self {
        ExcelError::CalamineError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_offenders() {
        let err = ExcelError::ColumnsNotFound(vec!["E".to_string()]);
        assert_eq!(
            err.to_string(),
            "Usecols do not match columns, columns expected but not found: [\"E\"]"
        );
        assert_eq!(err.kind(), ErrorKind::ColumnSpec);

        let err = ExcelError::UnknownEngine("foo".to_string());
        assert_eq!(err.to_string(), "Unknown engine: foo");
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_closed_kind() {
        assert_eq!(ExcelError::Closed.kind(), ErrorKind::ResourceState);
    }
}
