//! Validation schema derived from a question list.
//!
//! Validation runs on explicit submit only and reports one [`FieldError`] per
//! invalid field.

use std::collections::{BTreeMap, BTreeSet};

use sheetform_types::{
    AnswerMap, FieldError, QuestionDefinition, QuestionKind, ValidationErrors, normalize_value,
};

/// The rule applied to one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
    /// Free text (text and textarea questions).
    Text { required: bool },

    /// A numeric literal.
    Number { required: bool },

    /// One of a fixed option set, compared after normalization.
    Choice {
        required: bool,
        /// Display labels, for error messages.
        options: Vec<String>,
        /// Normalized labels, for matching.
        normalized: Vec<String>,
    },
}

impl FieldRule {
    /// Derive the rule for a single question.
    pub fn for_question(question: &QuestionDefinition) -> Self {
        let required = question.required;
        match &question.kind {
            QuestionKind::Text | QuestionKind::Textarea => Self::Text { required },
            QuestionKind::Number => Self::Number { required },
            QuestionKind::Radio { .. } | QuestionKind::YesNo => {
                let options = question.options();
                let normalized = options.iter().map(|o| normalize_value(o)).collect();
                Self::Choice {
                    required,
                    options,
                    normalized,
                }
            }
        }
    }

    /// Check if an answer is mandatory.
    pub fn is_required(&self) -> bool {
        match self {
            Self::Text { required } | Self::Number { required } => *required,
            Self::Choice { required, .. } => *required,
        }
    }

    /// Check a single value against this rule.
    ///
    /// The value is trimmed first, so a whitespace-only answer counts as empty
    /// and fails a required rule.
    pub fn check(&self, value: &str) -> Result<(), FieldError> {
        let value = value.trim();
        if value.is_empty() {
            return match self {
                Self::Choice {
                    required: true,
                    normalized,
                    ..
                } if normalized.is_empty() => Err(FieldError::NoOptions),
                _ if self.is_required() => Err(FieldError::Required),
                _ => Ok(()),
            };
        }

        match self {
            Self::Text { .. } => Ok(()),
            Self::Number { .. } => {
                if is_numeric_literal(value) {
                    Ok(())
                } else {
                    Err(FieldError::NotANumber)
                }
            }
            Self::Choice {
                options,
                normalized,
                ..
            } => {
                if normalized.is_empty() {
                    Err(FieldError::NoOptions)
                } else if normalized.contains(&normalize_value(value)) {
                    Ok(())
                } else {
                    Err(FieldError::InvalidChoice {
                        allowed: options.clone(),
                    })
                }
            }
        }
    }
}

/// Check whether a trimmed value is a finite numeric literal.
pub fn is_numeric_literal(value: &str) -> bool {
    value.parse::<f64>().is_ok_and(f64::is_finite)
}

/// Per-key validation rules for a whole form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationSchema {
    rules: BTreeMap<String, FieldRule>,
    duplicates: BTreeSet<String>,
}

impl ValidationSchema {
    /// Get the rule for a key. For duplicated keys this is the first question's rule.
    pub fn rule(&self, key: &str) -> Option<&FieldRule> {
        self.rules.get(key)
    }

    /// Keys used by more than one question.
    pub fn duplicate_keys(&self) -> impl Iterator<Item = &str> {
        self.duplicates.iter().map(String::as_str)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the schema has no fields.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Check one field. Unknown keys are accepted.
    pub fn check_field(&self, key: &str, value: &str) -> Result<(), FieldError> {
        if self.duplicates.contains(key) {
            return Err(FieldError::DuplicateKey(key.to_string()));
        }
        match self.rules.get(key) {
            Some(rule) => rule.check(value),
            None => Ok(()),
        }
    }

    /// Validate a full answer map. Missing answers count as empty.
    pub fn validate(&self, answers: &AnswerMap) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for key in self.rules.keys() {
            if let Err(error) = self.check_field(key, answers.value_or_empty(key)) {
                errors.insert(key.clone(), error);
            }
        }
        errors.into_result()
    }
}

/// Build the validation schema for a question list.
///
/// This is a pure function: identical input yields an identical schema.
pub fn derive_schema(questions: &[QuestionDefinition]) -> ValidationSchema {
    let mut schema = ValidationSchema::default();
    for question in questions {
        if schema.rules.contains_key(&question.key) {
            schema.duplicates.insert(question.key.clone());
            continue;
        }
        schema
            .rules
            .insert(question.key.clone(), FieldRule::for_question(question));
    }
    schema
}
