//! Mapping from question kind to input control.
//!
//! Rendering backends (see `sheetform-doc-html`) consume [`Control`] rather
//! than matching on [`QuestionKind`] themselves, so every backend picks the
//! same control for the same question.

use sheetform_types::{QuestionDefinition, QuestionKind, normalize_value};

/// The input control used for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    /// Single-line text input.
    SingleLine,

    /// Single-line input constrained to numbers.
    Numeric,

    /// Multi-line text area.
    MultiLine,

    /// Mutually exclusive choice set.
    Choice(Vec<ChoiceOption>),
}

/// One option of a choice control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOption {
    /// Stable element identifier, derived from the key and the normalized option.
    pub id: String,

    /// Submitted value: the normalized option text.
    pub value: String,

    /// Display label: the option as written in the sheet.
    pub label: String,
}

impl Control {
    /// Select the control for a question.
    pub fn for_question(question: &QuestionDefinition) -> Self {
        match &question.kind {
            QuestionKind::Text => Self::SingleLine,
            QuestionKind::Number => Self::Numeric,
            QuestionKind::Textarea => Self::MultiLine,
            QuestionKind::Radio { .. } | QuestionKind::YesNo => Self::Choice(
                question
                    .options()
                    .into_iter()
                    .map(|label| ChoiceOption::new(&question.key, label))
                    .collect(),
            ),
        }
    }
}

impl ChoiceOption {
    fn new(key: &str, label: String) -> Self {
        let value = normalize_value(&label);
        let id = format!("{key}-{}", value.split_whitespace().collect::<Vec<_>>().join("-"));
        Self { id, value, label }
    }

    /// Check if an answer selects this option.
    pub fn is_selected_by(&self, answer: &str) -> bool {
        normalize_value(answer) == self.value
    }
}

/// The label shown for a question: its 1-based position in the section,
/// the prompt, and a `*` marker when required.
pub fn field_label(position: usize, question: &QuestionDefinition) -> String {
    let marker = if question.required { " *" } else { "" };
    format!("{position}. {}{marker}", question.label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn free_form_controls() {
        let text = QuestionDefinition::new("a", "A", QuestionKind::Text);
        let number = QuestionDefinition::new("b", "B", QuestionKind::Number);
        let area = QuestionDefinition::new("c", "C", QuestionKind::Textarea);
        assert_eq!(Control::for_question(&text), Control::SingleLine);
        assert_eq!(Control::for_question(&number), Control::Numeric);
        assert_eq!(Control::for_question(&area), Control::MultiLine);
    }

    #[test]
    fn choice_option_ids_are_stable() {
        let q = QuestionDefinition::new(
            "tenure",
            "How long?",
            QuestionKind::Radio {
                options: vec!["Under a year".into(), "1-5 Years".into()],
            },
        );
        let Control::Choice(options) = Control::for_question(&q) else {
            panic!("expected a choice control");
        };
        assert_eq!(
            options,
            vec![
                ChoiceOption {
                    id: "tenure-under-a-year".into(),
                    value: "under a year".into(),
                    label: "Under a year".into(),
                },
                ChoiceOption {
                    id: "tenure-1-5-years".into(),
                    value: "1-5 years".into(),
                    label: "1-5 Years".into(),
                },
            ]
        );
        assert!(options[1].is_selected_by(" 1-5 YEARS"));
        assert_eq!(Control::for_question(&q), Control::for_question(&q));
    }

    #[test]
    fn yesno_control_has_two_options() {
        let q = QuestionDefinition::new("pets", "Pets?", QuestionKind::YesNo);
        let Control::Choice(options) = Control::for_question(&q) else {
            panic!("expected a choice control");
        };
        let labels: Vec<_> = options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["Yes", "No"]);
        assert_eq!(options[0].id, "pets-yes");
    }

    #[test]
    fn labels() {
        let q = QuestionDefinition::new("a", "Your name", QuestionKind::Text);
        assert_eq!(field_label(1, &q), "1. Your name");
        assert_eq!(field_label(3, &q.required()), "3. Your name *");
    }
}
