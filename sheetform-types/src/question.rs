use serde::{Deserialize, Serialize};

/// The implicit options of a `yesno` question.
pub const YES_NO_OPTIONS: [&str; 2] = ["Yes", "No"];

/// The section used when a row leaves `section` blank.
pub const DEFAULT_SECTION: &str = "General";

/// A single question, as defined by one row of a question sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDefinition {
    /// Position within the section. Ties are broken by row order.
    pub order: i64,

    /// Display label of the section this question belongs to.
    pub section: String,

    /// Machine identifier, used as the answer key and the payload field name.
    pub key: String,

    /// The prompt shown to the respondent.
    pub label: String,

    /// The input type, carrying the choice options where applicable.
    #[serde(flatten)]
    pub kind: QuestionKind,

    /// Whether an answer must be given.
    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl QuestionDefinition {
    /// Create an optional question in the default section.
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            order: 1,
            section: DEFAULT_SECTION.to_string(),
            key: key.into(),
            label: label.into(),
            kind,
            required: false,
            placeholder: None,
            help: None,
        }
    }

    /// Set the section.
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }

    /// Set the order within the section.
    pub fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    /// Mark the question as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the placeholder text.
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// The choice labels offered by this question (empty for free-form kinds).
    ///
    /// An optional `radio` with no options offers `Yes`/`No`. A required one
    /// offers nothing and can never be answered.
    pub fn options(&self) -> Vec<String> {
        match &self.kind {
            QuestionKind::Radio { options } if options.is_empty() && !self.required => {
                QuestionKind::YesNo.options()
            }
            kind => kind.options(),
        }
    }
}

/// The kind of question, determining the input control and the validation rule.
///
/// Unknown type strings never reach this enum: the parser defaults them to
/// `Textarea`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QuestionKind {
    /// Single-line text input.
    Text,

    /// Multi-line text input.
    #[default]
    Textarea,

    /// Single-line input that must hold a numeric literal.
    Number,

    /// Pick exactly one of the listed options.
    Radio {
        #[serde(default)]
        options: Vec<String>,
    },

    /// A radio question with the fixed options "Yes" and "No".
    #[serde(rename = "yesno")]
    YesNo,
}

impl QuestionKind {
    /// Parse a type cell. Returns `None` for blank or unknown values.
    pub fn from_type_name(name: &str, options: Vec<String>) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "textarea" => Some(Self::Textarea),
            "number" => Some(Self::Number),
            "radio" => Some(Self::Radio { options }),
            "yesno" => Some(Self::YesNo),
            _ => None,
        }
    }

    /// The type name as written in a question sheet.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Number => "number",
            Self::Radio { .. } => "radio",
            Self::YesNo => "yesno",
        }
    }

    /// Check if this is a choice kind (radio or yesno).
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::Radio { .. } | Self::YesNo)
    }

    /// The choice labels for this kind.
    ///
    /// `YesNo` always yields `["Yes", "No"]`.
    pub fn options(&self) -> Vec<String> {
        match self {
            Self::Radio { options } => options.clone(),
            Self::YesNo => YES_NO_OPTIONS.iter().map(|s| s.to_string()).collect(),
            _ => Vec::new(),
        }
    }
}

/// Normalize an answer or option for comparison: trimmed and lowercased.
pub fn normalize_value(value: &str) -> String {
    value.trim().to_lowercase()
}
