//! Core types for the sheetform crates.
//!
//! This crate provides the foundational, presentation-agnostic types:
//! - `SurveyId` - The four fixed audience questionnaires
//! - `QuestionDefinition` and `QuestionKind` - One parsed row of a question sheet
//! - `AnswerMap` - Answers collected by a form, keyed by question key
//! - `FieldError` and `ValidationErrors` - Per-field validation results
//! - `SourceError` and `ParseWarning` - Outcomes of reading a question sheet

mod survey_id;
pub use survey_id::{SurveyId, UnknownSurvey};

mod question;
pub use question::{
    DEFAULT_SECTION, QuestionDefinition, QuestionKind, YES_NO_OPTIONS, normalize_value,
};

mod answers;
pub use answers::AnswerMap;

mod validation;
pub use validation::{FieldError, ValidationErrors};

mod error;
pub use error::{ParseWarning, SourceError};
