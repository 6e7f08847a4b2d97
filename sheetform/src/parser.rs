//! Tabular question parser.
//!
//! Turns a comma-separated question sheet into typed [`QuestionDefinition`]s.
//! The parser is permissive: a bad cell falls back to that field's default and
//! is reported as a [`ParseWarning`], never as an error.

use std::cmp::Ordering;
use std::collections::HashSet;

use csv::{ReaderBuilder, StringRecord};
use sheetform_types::{DEFAULT_SECTION, ParseWarning, QuestionDefinition, QuestionKind, SourceError};

/// Maximum length of a key derived from a label.
pub const MAX_SLUG_LENGTH: usize = 60;

/// Columns understood by the parser, matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    Section,
    Order,
    Key,
    Label,
    Type,
    Options,
    Required,
    Placeholder,
    Help,
}

impl Column {
    fn from_header(header: &str) -> Option<Self> {
        let name = header.trim().trim_matches('\u{feff}').to_ascii_lowercase();
        match name.as_str() {
            "section" => Some(Self::Section),
            "order" => Some(Self::Order),
            "key" => Some(Self::Key),
            "label" => Some(Self::Label),
            "type" => Some(Self::Type),
            "options" => Some(Self::Options),
            "required" => Some(Self::Required),
            "placeholder" => Some(Self::Placeholder),
            "help" => Some(Self::Help),
            _ => None,
        }
    }
}

/// The result of parsing a question sheet.
#[derive(Debug, Clone, Default)]
pub struct ParsedSheet {
    /// Questions sorted by (section, order), ties kept in row order.
    pub questions: Vec<QuestionDefinition>,

    /// Row-level oddities that were defaulted.
    pub warnings: Vec<ParseWarning>,
}

/// Parse a question sheet, discarding warnings (they are still logged).
pub fn parse_questions(text: &str) -> Result<Vec<QuestionDefinition>, SourceError> {
    Ok(parse_sheet(text)?.questions)
}

/// Parse raw bytes as a question sheet. Fails if the bytes are not UTF-8.
pub fn parse_bytes(raw: &[u8]) -> Result<Vec<QuestionDefinition>, SourceError> {
    let text = std::str::from_utf8(raw)?;
    parse_questions(text)
}

/// Parse a question sheet and keep the warnings.
pub fn parse_sheet(text: &str) -> Result<ParsedSheet, SourceError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers().map_err(SourceError::unreadable)?.clone();
    let columns = map_columns(&headers);

    let mut sheet = ParsedSheet::default();
    if !headers.is_empty() && columns.iter().all(Option::is_none) {
        sheet.warnings.push(ParseWarning::new(
            0,
            "header row contains no recognized columns, every field uses its default",
        ));
    }

    let mut record = StringRecord::new();
    let mut row = 0;
    loop {
        match reader.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => {
                sheet
                    .warnings
                    .push(ParseWarning::new(row + 1, format!("skipped malformed row: {err}")));
                continue;
            }
        }

        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        row += 1;

        let cells = RowCells::collect(&record, &columns);
        let question = build_question(row, &cells, &mut sheet.warnings);
        sheet.questions.push(question);
    }

    sort_questions(&mut sheet.questions);
    warn_duplicate_keys(&sheet.questions, &mut sheet.warnings);

    for warning in &sheet.warnings {
        tracing::warn!(row = warning.row, "question sheet: {}", warning.message);
    }
    tracing::debug!(questions = sheet.questions.len(), "parsed question sheet");

    Ok(sheet)
}

/// Sort questions by section (case-insensitive, then exact) and order.
///
/// The sort is stable, so questions with equal section and order keep their
/// row order.
pub fn sort_questions(questions: &mut [QuestionDefinition]) {
    questions.sort_by(|a, b| compare_sections(&a.section, &b.section).then(a.order.cmp(&b.order)));
}

fn compare_sections(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Derive a machine key from a label.
///
/// Lowercases, drops everything but ASCII letters, digits, whitespace and
/// hyphens, joins words with hyphens and truncates to [`MAX_SLUG_LENGTH`].
pub fn slugify(label: &str) -> String {
    let kept: String = label
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .collect();
    let slug = kept.split_whitespace().collect::<Vec<_>>().join("-");
    slug.chars().take(MAX_SLUG_LENGTH).collect()
}

/// Split a pipe-delimited options cell, dropping blank entries.
pub fn split_options(cell: &str) -> Vec<String> {
    cell.split('|')
        .map(str::trim)
        .filter(|option| !option.is_empty())
        .map(str::to_string)
        .collect()
}

/// Interpret a `required` cell.
pub fn parse_required(cell: &str) -> bool {
    matches!(
        cell.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "y"
    )
}

fn map_columns(headers: &StringRecord) -> Vec<Option<Column>> {
    let mut seen = HashSet::new();
    headers
        .iter()
        .map(|header| Column::from_header(header).filter(|column| seen.insert(*column)))
        .collect()
}

/// The recognized cells of one row, trimmed. Missing cells are empty.
#[derive(Debug, Default)]
struct RowCells<'a> {
    section: &'a str,
    order: &'a str,
    key: &'a str,
    label: &'a str,
    kind: &'a str,
    options: &'a str,
    required: &'a str,
    placeholder: &'a str,
    help: &'a str,
}

impl<'a> RowCells<'a> {
    fn collect(record: &'a StringRecord, columns: &[Option<Column>]) -> Self {
        let mut cells = Self::default();
        for (field, column) in record.iter().zip(columns) {
            let value = field.trim();
            match column {
                Some(Column::Section) => cells.section = value,
                Some(Column::Order) => cells.order = value,
                Some(Column::Key) => cells.key = value,
                Some(Column::Label) => cells.label = value,
                Some(Column::Type) => cells.kind = value,
                Some(Column::Options) => cells.options = value,
                Some(Column::Required) => cells.required = value,
                Some(Column::Placeholder) => cells.placeholder = value,
                Some(Column::Help) => cells.help = value,
                None => {}
            }
        }
        cells
    }
}

fn build_question(
    row: usize,
    cells: &RowCells<'_>,
    warnings: &mut Vec<ParseWarning>,
) -> QuestionDefinition {
    let fallback_order = i64::try_from(row).unwrap_or(i64::MAX);
    let order = if cells.order.is_empty() {
        fallback_order
    } else {
        cells.order.parse::<i64>().unwrap_or_else(|_| {
            warnings.push(ParseWarning::new(
                row,
                format!("order '{}' is not an integer, using {fallback_order}", cells.order),
            ));
            fallback_order
        })
    };

    let section = if cells.section.is_empty() {
        DEFAULT_SECTION.to_string()
    } else {
        cells.section.to_string()
    };

    let label = if cells.label.is_empty() {
        format!("Question {row}")
    } else {
        cells.label.to_string()
    };

    let key = if cells.key.is_empty() {
        let slug = slugify(&label);
        if slug.is_empty() {
            warnings.push(ParseWarning::new(
                row,
                format!("label '{label}' yields an empty key, using question-{row}"),
            ));
            format!("question-{row}")
        } else {
            slug
        }
    } else {
        cells.key.to_string()
    };

    let kind = if cells.kind.is_empty() {
        QuestionKind::Textarea
    } else {
        QuestionKind::from_type_name(cells.kind, split_options(cells.options)).unwrap_or_else(|| {
            warnings.push(ParseWarning::new(
                row,
                format!("unknown type '{}', using textarea", cells.kind),
            ));
            QuestionKind::Textarea
        })
    };

    QuestionDefinition {
        order,
        section,
        key,
        label,
        kind,
        required: parse_required(cells.required),
        placeholder: non_empty(cells.placeholder),
        help: non_empty(cells.help),
    }
}

fn non_empty(cell: &str) -> Option<String> {
    if cell.is_empty() {
        None
    } else {
        Some(cell.to_string())
    }
}

fn warn_duplicate_keys(questions: &[QuestionDefinition], warnings: &mut Vec<ParseWarning>) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for question in questions {
        if !seen.insert(question.key.as_str()) && reported.insert(question.key.as_str()) {
            warnings.push(ParseWarning::new(
                0,
                format!("key '{}' is used by more than one question", question.key),
            ));
        }
    }
}
