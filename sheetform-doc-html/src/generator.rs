//! HTML form generator implementation.

use sheetform::{
    AnswerMap, Control, FieldError, FormSession, QuestionDefinition, Sections, ValidationErrors,
    field_label,
};

/// How a form is turned into HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlOptions {
    /// Document title, also shown as the form heading.
    pub title: Option<String>,
    /// Embed the stylesheet in the document head.
    pub include_styles: bool,
    /// Wrap the form in `html`/`head`/`body`; otherwise emit only `<form>`.
    pub full_document: bool,
    /// Prefix of every generated CSS class.
    pub class_prefix: String,
    /// Text of the submit button.
    pub submit_label: String,
    /// Render each question's help text under its control.
    pub show_help: bool,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            title: None,
            include_styles: true,
            full_document: true,
            class_prefix: "survey".to_string(),
            submit_label: "Submit".to_string(),
            show_help: true,
        }
    }
}

impl HtmlOptions {
    /// Full styled document, `survey-` classes, a "Submit" button, help shown.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_styles(mut self, include: bool) -> Self {
        self.include_styles = include;
        self
    }

    pub fn full_document(mut self, full: bool) -> Self {
        self.full_document = full;
        self
    }

    pub fn with_class_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.class_prefix = prefix.into();
        self
    }

    pub fn with_submit_label(mut self, label: impl Into<String>) -> Self {
        self.submit_label = label.into();
        self
    }

    pub fn with_help(mut self, show: bool) -> Self {
        self.show_help = show;
        self
    }
}

/// Render a loaded form with its current answers and last validation errors.
///
/// Uses the default options, titled `title` if given.
pub fn to_html(form: &FormSession, title: Option<&str>) -> String {
    let options = HtmlOptions {
        title: title.map(str::to_string),
        ..HtmlOptions::default()
    };
    to_html_with_options(form, &options)
}

/// Render a loaded form with custom options.
pub fn to_html_with_options(form: &FormSession, options: &HtmlOptions) -> String {
    let errors = (!form.errors().is_empty()).then(|| form.errors());
    render(form.sections(), form.answers(), errors, options)
}

/// Render grouped sections.
///
/// Output depends only on the arguments: every control shows the value bound
/// in `answers`, and fields listed in `errors` get an inline message.
pub fn render(
    sections: &Sections,
    answers: &AnswerMap,
    errors: Option<&ValidationErrors>,
    options: &HtmlOptions,
) -> String {
    let mut html = String::new();
    let prefix = &options.class_prefix;

    if options.full_document {
        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        html.push_str("  <meta charset=\"UTF-8\">\n");
        html.push_str(
            "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
        );

        if let Some(title) = &options.title {
            html.push_str(&format!("  <title>{}</title>\n", escape_html(title)));
        }

        if options.include_styles {
            html.push_str(&generate_styles(prefix));
        }

        html.push_str("</head>\n<body>\n");
    }

    html.push_str(&format!("<form class=\"{prefix}-form\" novalidate>\n"));

    if let Some(title) = &options.title {
        html.push_str(&format!(
            "  <h1 class=\"{prefix}-title\">{}</h1>\n",
            escape_html(title)
        ));
    }

    if sections.is_empty() {
        html.push_str(&format!(
            "  <p class=\"{prefix}-empty\">No questions to display.</p>\n"
        ));
    }

    for section in sections {
        html.push_str(&format!("  <section class=\"{prefix}-section\">\n"));
        html.push_str(&format!(
            "    <h2 class=\"{prefix}-section-title\">{}</h2>\n",
            escape_html(&section.name)
        ));
        for (idx, question) in section.questions.iter().enumerate() {
            let field = Field {
                question,
                label: field_label(idx + 1, question),
                value: answers.value_or_empty(&question.key),
                error: errors.and_then(|errors| errors.get(&question.key)),
            };
            html.push_str(&generate_field(&field, options, 2));
        }
        html.push_str("  </section>\n");
    }

    html.push_str(&format!(
        "  <button type=\"submit\" class=\"{prefix}-submit\">{}</button>\n",
        escape_html(&options.submit_label)
    ));

    html.push_str("</form>\n");

    if options.full_document {
        html.push_str("</body>\n</html>\n");
    }

    html
}

struct Field<'a> {
    question: &'a QuestionDefinition,
    label: String,
    value: &'a str,
    error: Option<&'a FieldError>,
}

/// Generate HTML for a single question.
fn generate_field(field: &Field<'_>, options: &HtmlOptions, indent: usize) -> String {
    let ind = "  ".repeat(indent);
    let prefix = &options.class_prefix;
    let question = field.question;
    let key = escape_html(&question.key);
    let label = escape_html(&field.label);
    let error_id = format!("{key}-error");

    let mut attrs = format!("id=\"{key}\" name=\"{key}\"");
    if question.required {
        attrs.push_str(" required");
    }
    if let Some(placeholder) = &question.placeholder {
        attrs.push_str(&format!(" placeholder=\"{}\"", escape_html(placeholder)));
    }
    if field.error.is_some() {
        attrs.push_str(&format!(" aria-invalid=\"true\" aria-describedby=\"{error_id}\""));
    }

    let control = Control::for_question(question);
    let closing = if matches!(control, Control::Choice(_)) {
        "fieldset"
    } else {
        "div"
    };

    let mut html = String::new();

    match control {
        Control::SingleLine => {
            html.push_str(&format!("{ind}<div class=\"{prefix}-field\">\n"));
            html.push_str(&format!("{ind}  <label for=\"{key}\">{label}</label>\n"));
            html.push_str(&format!(
                "{ind}  <input type=\"text\" {attrs} class=\"{prefix}-input\" value=\"{}\">\n",
                escape_html(field.value)
            ));
        }

        Control::Numeric => {
            html.push_str(&format!("{ind}<div class=\"{prefix}-field\">\n"));
            html.push_str(&format!("{ind}  <label for=\"{key}\">{label}</label>\n"));
            html.push_str(&format!(
                "{ind}  <input type=\"text\" inputmode=\"decimal\" {attrs} class=\"{prefix}-input\" value=\"{}\">\n",
                escape_html(field.value)
            ));
        }

        Control::MultiLine => {
            html.push_str(&format!("{ind}<div class=\"{prefix}-field\">\n"));
            html.push_str(&format!("{ind}  <label for=\"{key}\">{label}</label>\n"));
            html.push_str(&format!(
                "{ind}  <textarea {attrs} rows=\"4\" class=\"{prefix}-textarea\">{}</textarea>\n",
                escape_html(field.value)
            ));
        }

        Control::Choice(choices) => {
            html.push_str(&format!(
                "{ind}<fieldset class=\"{prefix}-field {prefix}-fieldset\">\n"
            ));
            html.push_str(&format!("{ind}  <legend>{label}</legend>\n"));

            for option in &choices {
                let option_id = escape_html(&option.id);
                let checked = if option.is_selected_by(field.value) {
                    " checked"
                } else {
                    ""
                };
                html.push_str(&format!("{ind}  <div class=\"{prefix}-radio-option\">\n"));
                html.push_str(&format!(
                    "{ind}    <input type=\"radio\" id=\"{option_id}\" name=\"{key}\" value=\"{}\"{checked}>\n",
                    escape_html(&option.value)
                ));
                html.push_str(&format!(
                    "{ind}    <label for=\"{option_id}\">{}</label>\n",
                    escape_html(&option.label)
                ));
                html.push_str(&format!("{ind}  </div>\n"));
            }
        }
    }

    if let Some(help) = question.help.as_ref().filter(|_| options.show_help) {
        html.push_str(&format!(
            "{ind}  <p class=\"{prefix}-help\">{}</p>\n",
            escape_html(help)
        ));
    }
    if let Some(error) = field.error {
        html.push_str(&format!(
            "{ind}  <p id=\"{error_id}\" class=\"{prefix}-error\" role=\"alert\">{}</p>\n",
            escape_html(&error.to_string())
        ));
    }

    html.push_str(&format!("{ind}</{closing}>\n"));

    html
}

/// Escape HTML special characters.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Generate default CSS styles.
fn generate_styles(prefix: &str) -> String {
    format!(
        r#"  <style>
    .{prefix}-form {{
      max-width: 600px;
      margin: 2rem auto;
      padding: 1rem;
      font-family: sans-serif;
    }}
    .{prefix}-section {{
      margin: 1.5rem 0;
    }}
    .{prefix}-field {{
      margin: 0.5rem 0;
    }}
    .{prefix}-field label {{
      display: block;
      margin-bottom: 0.25rem;
    }}
    .{prefix}-input, .{prefix}-textarea {{
      width: 100%;
      padding: 0.5rem;
      box-sizing: border-box;
    }}
    .{prefix}-fieldset {{
      margin: 1rem 0;
      padding: 1rem;
    }}
    .{prefix}-radio-option {{
      margin: 0.25rem 0;
    }}
    .{prefix}-radio-option label {{
      display: inline;
    }}
    .{prefix}-help {{
      margin: 0.25rem 0;
      color: #555;
      font-size: 0.9em;
    }}
    .{prefix}-error {{
      margin: 0.25rem 0;
      color: #b00020;
    }}
    .{prefix}-submit {{
      margin-top: 1rem;
      padding: 0.5rem 1rem;
    }}
  </style>
"#
    )
}
