//! Decides where the questions of a survey come from.
//!
//! Resolution is evaluated fresh on every call:
//!
//! 1. A non-blank override sheet in the store wins.
//! 2. Otherwise the configured remote sheet is fetched and parsed.
//! 3. Otherwise (nothing configured, or the fetch failed) the caller gets
//!    [`Resolution::NoDynamicConfig`] and should show its static form.
//!
//! Failures never surface as errors: each is logged and the next step runs.

use sheetform_types::{QuestionDefinition, SurveyId};

use crate::config::SurveyConfig;
use crate::fetch::SourceFetcher;
use crate::parser::{parse_bytes, parse_questions};
use crate::store::OverrideStore;

/// Where a resolved question list came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionSource {
    LocalOverride,
    Remote { url: String },
}

/// The outcome of resolving a survey's questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Questions {
        source: QuestionSource,
        questions: Vec<QuestionDefinition>,
    },

    /// No dynamic source is usable. Not an error.
    NoDynamicConfig,
}

impl Resolution {
    /// The resolved questions, if any.
    pub fn questions(&self) -> Option<&[QuestionDefinition]> {
        match self {
            Self::Questions { questions, .. } => Some(questions),
            Self::NoDynamicConfig => None,
        }
    }
}

/// Resolves question lists from an override store, falling back to remote sheets.
#[derive(Debug)]
pub struct QuestionResolver<S, F> {
    config: SurveyConfig,
    store: S,
    fetcher: F,
}

impl<S: OverrideStore, F: SourceFetcher> QuestionResolver<S, F> {
    pub fn new(config: SurveyConfig, store: S, fetcher: F) -> Self {
        Self {
            config,
            store,
            fetcher,
        }
    }

    pub fn config(&self) -> &SurveyConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolve the questions of `survey`.
    pub async fn resolve(&self, survey: SurveyId) -> Resolution {
        if let Some(questions) = self.local_override(survey) {
            tracing::debug!(%survey, count = questions.len(), "using local override sheet");
            return Resolution::Questions {
                source: QuestionSource::LocalOverride,
                questions,
            };
        }

        let url = self.config.get(survey).questions_csv_url.trim();
        if url.is_empty() {
            tracing::debug!(%survey, "no remote question sheet configured");
            return Resolution::NoDynamicConfig;
        }

        match self.remote(url).await {
            Ok(questions) => {
                tracing::debug!(%survey, url, count = questions.len(), "using remote sheet");
                Resolution::Questions {
                    source: QuestionSource::Remote {
                        url: url.to_string(),
                    },
                    questions,
                }
            }
            Err(message) => {
                tracing::warn!(%survey, url, "remote question sheet unavailable: {message}");
                Resolution::NoDynamicConfig
            }
        }
    }

    fn local_override(&self, survey: SurveyId) -> Option<Vec<QuestionDefinition>> {
        let text = match self.store.override_text(survey) {
            Ok(Some(text)) if !text.trim().is_empty() => text,
            Ok(_) => return None,
            Err(err) => {
                tracing::warn!(%survey, "override sheet unreadable: {err}");
                return None;
            }
        };
        match parse_questions(&text) {
            Ok(questions) => Some(questions),
            Err(err) => {
                tracing::warn!(%survey, "override sheet unparsable, trying remote: {err}");
                None
            }
        }
    }

    async fn remote(&self, url: &str) -> Result<Vec<QuestionDefinition>, String> {
        let raw = self
            .fetcher
            .fetch_bytes(url)
            .await
            .map_err(|e| e.to_string())?;
        parse_bytes(&raw).map_err(|e| e.to_string())
    }
}
