//! Form sessions: loading questions for a mounted view and binding answers.

use sheetform_types::{AnswerMap, QuestionDefinition, SurveyId, ValidationErrors};
use tokio_util::sync::CancellationToken;

use crate::fetch::SourceFetcher;
use crate::gateway::{Ack, SinkTransport, SubmissionError, SubmissionGateway, SubmissionPayload};
use crate::resolver::{QuestionResolver, QuestionSource, Resolution};
use crate::schema::{ValidationSchema, derive_schema};
use crate::sections::{Sections, group_by_section};
use crate::store::OverrideStore;

/// Error type for submitting a form.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("{0}")]
    ValidationFailed(ValidationErrors),

    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

/// Liveness handle of a mounted form view.
///
/// Clones share the same liveness; tearing down any clone tears down all.
#[derive(Debug, Clone, Default)]
pub struct FormMount {
    token: CancellationToken,
}

impl FormMount {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the view as gone. Loads still in flight are discarded.
    pub fn teardown(&self) {
        self.token.cancel();
    }

    pub fn is_alive(&self) -> bool {
        !self.token.is_cancelled()
    }
}

/// The result of loading a form for a mounted view.
#[derive(Debug)]
pub enum LoadOutcome {
    /// Questions resolved; the form can be shown.
    Ready(FormSession),

    /// No dynamic questions; show the static form instead.
    Fallback,

    /// The view was torn down before the load finished.
    Discarded,
}

/// Resolve the questions of `survey` on behalf of `mount`.
///
/// A result is only ever delivered to a live view: teardown during or right
/// after resolution yields [`LoadOutcome::Discarded`].
pub async fn load_form<S, F>(
    resolver: &QuestionResolver<S, F>,
    survey: SurveyId,
    mount: &FormMount,
) -> LoadOutcome
where
    S: OverrideStore,
    F: SourceFetcher,
{
    let resolution = tokio::select! {
        biased;
        _ = mount.token.cancelled() => None,
        resolution = resolver.resolve(survey) => Some(resolution),
    };

    let resolution = match resolution {
        Some(resolution) if mount.is_alive() => resolution,
        _ => {
            tracing::debug!(%survey, "form torn down, discarding load");
            return LoadOutcome::Discarded;
        }
    };

    match resolution {
        Resolution::Questions { source, questions } => {
            LoadOutcome::Ready(FormSession::new(survey, source, questions))
        }
        Resolution::NoDynamicConfig => LoadOutcome::Fallback,
    }
}

/// A loaded form: questions, derived schema, grouped sections and answers.
#[derive(Debug, Clone)]
pub struct FormSession {
    survey: SurveyId,
    source: QuestionSource,
    questions: Vec<QuestionDefinition>,
    schema: ValidationSchema,
    sections: Sections,
    answers: AnswerMap,
    errors: ValidationErrors,
}

impl FormSession {
    /// Build a session. Every answer starts out as the empty string.
    pub fn new(survey: SurveyId, source: QuestionSource, questions: Vec<QuestionDefinition>) -> Self {
        let schema = derive_schema(&questions);
        let sections = group_by_section(&questions);
        let answers = AnswerMap::blank_for(&questions);
        Self {
            survey,
            source,
            questions,
            schema,
            sections,
            answers,
            errors: ValidationErrors::new(),
        }
    }

    pub fn survey(&self) -> SurveyId {
        self.survey
    }

    pub fn source(&self) -> &QuestionSource {
        &self.source
    }

    pub fn questions(&self) -> &[QuestionDefinition] {
        &self.questions
    }

    pub fn schema(&self) -> &ValidationSchema {
        &self.schema
    }

    pub fn sections(&self) -> &Sections {
        &self.sections
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    /// Errors from the last validation. Empty before the first submit.
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Bind a control value to its question. Returns `false` for unknown keys.
    pub fn set_answer(&mut self, key: &str, value: impl Into<String>) -> bool {
        if self.schema.rule(key).is_none() {
            return false;
        }
        self.answers.insert(key, value);
        true
    }

    /// The current value bound to a question.
    pub fn answer(&self, key: &str) -> &str {
        self.answers.value_or_empty(key)
    }

    /// Validate all answers, remembering the errors for display.
    pub fn validate(&mut self) -> Result<(), ValidationErrors> {
        let result = self.schema.validate(&self.answers);
        self.errors = result.clone().err().unwrap_or_default();
        result
    }

    /// The payload the current answers would be submitted as.
    pub fn payload(&self) -> SubmissionPayload {
        SubmissionPayload::new(self.survey, self.answers.clone())
    }

    /// Validate and submit. Answers are reset only when the sink accepts them.
    pub async fn submit<T: SinkTransport>(
        &mut self,
        gateway: &SubmissionGateway<T>,
        sink: &str,
    ) -> Result<Ack, SubmitError> {
        self.validate().map_err(SubmitError::ValidationFailed)?;
        let ack = gateway.submit(sink, &self.payload()).await?;
        self.answers.clear_values();
        Ok(ack)
    }
}
