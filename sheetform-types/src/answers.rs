use std::collections::HashMap;

use crate::QuestionDefinition;

/// Answers collected by a form, keyed by question key.
///
/// Every value is carried as a string - numbers and choices included. Whether
/// a value is numeric or a valid choice is decided at validation time only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerMap {
    values: HashMap<String, String>,
}

impl AnswerMap {
    /// Create a new empty answer map.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Create an answer map holding an empty answer for every question key.
    pub fn blank_for(questions: &[QuestionDefinition]) -> Self {
        let mut answers = Self::new();
        for question in questions {
            answers.insert(question.key.clone(), "");
        }
        answers
    }

    /// Insert an answer, replacing any previous one for the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Get the answer for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Get the answer for a key, treating a missing answer as empty.
    pub fn value_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    /// Check if an answer exists for the given key.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Remove the answer for a key.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    /// Reset every answer to the empty string, keeping the keys.
    pub fn clear_values(&mut self) {
        for value in self.values.values_mut() {
            value.clear();
        }
    }

    /// Get an iterator over all key-value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Get the number of answers.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if there are no answers.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AnswerMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut answers = Self::new();
        for (key, value) in iter {
            answers.insert(key, value);
        }
        answers
    }
}

impl IntoIterator for AnswerMap {
    type Item = (String, String);
    type IntoIter = std::collections::hash_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QuestionKind;

    #[test]
    fn insert_and_get() {
        let mut answers = AnswerMap::new();
        answers.insert("name", "Alice");
        answers.insert("age", "30");

        assert_eq!(answers.get("name"), Some("Alice"));
        assert_eq!(answers.get("age"), Some("30"));
        assert_eq!(answers.get("missing"), None);
        assert_eq!(answers.value_or_empty("missing"), "");
    }

    #[test]
    fn blank_for_questions() {
        let questions = vec![
            QuestionDefinition::new("a", "A?", QuestionKind::Text),
            QuestionDefinition::new("b", "B?", QuestionKind::Number),
        ];
        let answers = AnswerMap::blank_for(&questions);
        assert_eq!(answers.len(), 2);
        assert_eq!(answers.get("a"), Some(""));
        assert_eq!(answers.get("b"), Some(""));
    }

    #[test]
    fn clear_values_keeps_keys() {
        let mut answers: AnswerMap = [("a", "x"), ("b", "y")].into_iter().collect();
        answers.clear_values();
        assert_eq!(answers.len(), 2);
        assert!(answers.iter().all(|(_, v)| v.is_empty()));
    }

    #[test]
    fn later_insert_overwrites() {
        let mut answers = AnswerMap::new();
        answers.insert("k", "first");
        answers.insert("k", "second");
        assert_eq!(answers.len(), 1);
        assert_eq!(answers.get("k"), Some("second"));
    }
}
