use std::collections::BTreeMap;

/// Why a single answer was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// A required answer was left empty.
    #[error("Required")]
    Required,

    /// A number question received something that is not a numeric literal.
    #[error("Must be a number")]
    NotANumber,

    /// A choice question received a value outside its option set.
    #[error("Please choose one of: {}", allowed.join(", "))]
    InvalidChoice { allowed: Vec<String> },

    /// A required choice question has no options, so no answer can satisfy it.
    #[error("No valid option is available for this question")]
    NoOptions,

    /// More than one question in the form uses this key.
    #[error("Duplicate question key '{0}'")]
    DuplicateKey(String),
}

/// All validation failures of one submission attempt, one message per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{} field(s) failed validation", errors.len())]
pub struct ValidationErrors {
    errors: BTreeMap<String, FieldError>,
}

impl ValidationErrors {
    /// Create an empty set of errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for a key. The first error recorded for a key wins.
    pub fn insert(&mut self, key: impl Into<String>, error: FieldError) {
        self.errors.entry(key.into()).or_insert(error);
    }

    /// Get the error for a key, if any.
    pub fn get(&self, key: &str) -> Option<&FieldError> {
        self.errors.get(key)
    }

    /// Iterate over `(key, error)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldError)> {
        self.errors.iter().map(|(k, e)| (k.as_str(), e))
    }

    /// Number of invalid fields.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Check if there are no errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Turn an empty set into `Ok(())`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_error_per_key_wins() {
        let mut errors = ValidationErrors::new();
        errors.insert("age", FieldError::Required);
        errors.insert("age", FieldError::NotANumber);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("age"), Some(&FieldError::Required));
    }

    #[test]
    fn messages() {
        assert_eq!(FieldError::Required.to_string(), "Required");
        assert_eq!(FieldError::NotANumber.to_string(), "Must be a number");
        let choice = FieldError::InvalidChoice {
            allowed: vec!["Yes".into(), "No".into()],
        };
        assert_eq!(choice.to_string(), "Please choose one of: Yes, No");
    }

    #[test]
    fn into_result() {
        assert!(ValidationErrors::new().into_result().is_ok());

        let mut errors = ValidationErrors::new();
        errors.insert("k", FieldError::DuplicateKey("k".into()));
        let err = errors.into_result().unwrap_err();
        assert_eq!(err.to_string(), "1 field(s) failed validation");
    }
}
