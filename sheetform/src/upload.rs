//! Checks applied to a user-supplied override sheet before it is stored.

use sheetform_types::SurveyId;

use crate::store::{OverrideStore, StoreError};

/// Largest accepted override file, in bytes.
pub const MAX_CSV_SIZE: usize = 1024 * 1024;

/// Largest number of questions an override may carry.
pub const MAX_QUESTIONS_COUNT: usize = 200;

/// Slack on top of [`MAX_QUESTIONS_COUNT`] for the header and stray blank lines.
const LINE_ALLOWANCE: usize = 10;

/// Error type for override uploads.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Only .csv files are accepted, got '{0}'")]
    NotCsv(String),

    #[error("File is {size} bytes, the limit is {}", MAX_CSV_SIZE)]
    TooLarge { size: usize },

    #[error("File has {lines} lines, the limit is {}", MAX_QUESTIONS_COUNT + LINE_ALLOWANCE)]
    TooManyLines { lines: usize },

    #[error("File needs a header row and at least one question")]
    MissingRows,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Check the name and shape of an override file.
pub fn validate_upload(file_name: &str, content: &str) -> Result<(), UploadError> {
    if !file_name.trim().to_ascii_lowercase().ends_with(".csv") {
        return Err(UploadError::NotCsv(file_name.to_string()));
    }
    if content.len() > MAX_CSV_SIZE {
        return Err(UploadError::TooLarge {
            size: content.len(),
        });
    }

    let lines = content.lines().count();
    if lines > MAX_QUESTIONS_COUNT + LINE_ALLOWANCE {
        return Err(UploadError::TooManyLines { lines });
    }
    if content.lines().filter(|line| !line.trim().is_empty()).count() < 2 {
        return Err(UploadError::MissingRows);
    }
    Ok(())
}

/// Validate an override file and store it for `survey`.
pub fn upload_override(
    store: &dyn OverrideStore,
    survey: SurveyId,
    file_name: &str,
    content: &str,
) -> Result<(), UploadError> {
    validate_upload(file_name, content)?;
    store.save_override(survey, content)?;
    tracing::info!(%survey, file = file_name, "stored override sheet");
    Ok(())
}
