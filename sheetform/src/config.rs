//! Survey endpoint configuration.
//!
//! The base configuration is immutable. Endpoint overrides saved by the user
//! live in the store and are layered on top by [`resolve_endpoints`] every
//! time an address is needed.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sheetform_types::SurveyId;

use crate::gateway::{EndpointPolicy, UnsafeEndpoint};

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid endpoint overrides: {0}")]
    Overrides(#[from] serde_json::Error),

    #[error("Refusing to save endpoint for {survey}: {reason}")]
    InvalidEndpoint {
        survey: SurveyId,
        reason: UnsafeEndpoint,
    },
}

/// Addresses used by one survey.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyEndpointConfig {
    /// Where answers are submitted.
    pub endpoint: String,

    /// Public sheet showing the collected responses.
    pub sheet_url: String,

    /// Remote question sheet. Empty means no dynamic questions.
    pub questions_csv_url: String,
}

/// The immutable base configuration for all surveys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    pub tenant: SurveyEndpointConfig,
    pub landlord: SurveyEndpointConfig,
    pub advisor: SurveyEndpointConfig,
    pub investor: SurveyEndpointConfig,
}

impl SurveyConfig {
    /// Parse a TOML document with one table per survey.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Get the configuration of one survey.
    pub fn get(&self, survey: SurveyId) -> &SurveyEndpointConfig {
        match survey {
            SurveyId::Tenant => &self.tenant,
            SurveyId::Landlord => &self.landlord,
            SurveyId::Advisor => &self.advisor,
            SurveyId::Investor => &self.investor,
        }
    }

    /// Builder-style setter, mostly useful in tests.
    pub fn with(mut self, survey: SurveyId, config: SurveyEndpointConfig) -> Self {
        let slot = match survey {
            SurveyId::Tenant => &mut self.tenant,
            SurveyId::Landlord => &mut self.landlord,
            SurveyId::Advisor => &mut self.advisor,
            SurveyId::Investor => &mut self.investor,
        };
        *slot = config;
        self
    }
}

/// User-saved submission endpoints, stored as a JSON object `{ "<survey>": "<url>" }`.
///
/// Unknown keys are kept verbatim so a newer store survives an older reader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointOverrides {
    endpoints: BTreeMap<String, String>,
}

impl EndpointOverrides {
    /// Create an empty set of overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the stored JSON blob.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize to the stored JSON blob.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Get the saved endpoint for a survey, ignoring blank entries.
    pub fn get(&self, survey: SurveyId) -> Option<&str> {
        self.endpoints
            .get(survey.as_str())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// Save an endpoint after checking it against the policy.
    pub fn set(
        &mut self,
        survey: SurveyId,
        endpoint: &str,
        policy: &EndpointPolicy,
    ) -> Result<(), ConfigError> {
        let endpoint = endpoint.trim();
        policy
            .check(endpoint)
            .map_err(|reason| ConfigError::InvalidEndpoint { survey, reason })?;
        self.endpoints
            .insert(survey.as_str().to_string(), endpoint.to_string());
        Ok(())
    }

    /// Remove the saved endpoint for a survey.
    pub fn remove(&mut self, survey: SurveyId) -> Option<String> {
        self.endpoints.remove(survey.as_str())
    }

    /// Check if no endpoints are saved.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// Resolve the effective addresses of a survey.
///
/// A saved endpoint replaces the base `endpoint`; the other addresses always
/// come from the base configuration.
pub fn resolve_endpoints(
    base: &SurveyConfig,
    overrides: &EndpointOverrides,
    survey: SurveyId,
) -> SurveyEndpointConfig {
    let mut resolved = base.get(survey).clone();
    if let Some(endpoint) = overrides.get(survey) {
        resolved.endpoint = endpoint.to_string();
    }
    resolved
}
