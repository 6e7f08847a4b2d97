use std::fmt;

/// Error returned when a question sheet cannot be read at all.
///
/// Row-level problems never produce this error; they degrade to field
/// defaults and are reported as [`ParseWarning`]s instead.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The raw bytes are not valid UTF-8 text.
    #[error("Question source is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// The text could not be tokenized as comma-separated values.
    #[error("Question source could not be tokenized: {0}")]
    Unreadable(String),
}

impl SourceError {
    /// Create an unreadable-source error from any displayable cause.
    pub fn unreadable(cause: impl fmt::Display) -> Self {
        Self::Unreadable(cause.to_string())
    }
}

/// A non-fatal oddity found while parsing one row of a question sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    /// 1-based data row number (the header row is not counted).
    pub row: usize,

    /// Human-readable description of what was defaulted.
    pub message: String,
}

impl ParseWarning {
    /// Create a new warning for the given row.
    pub fn new(row: usize, message: impl Into<String>) -> Self {
        Self {
            row,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}", self.row, self.message)
    }
}
