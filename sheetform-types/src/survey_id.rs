use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the fixed audience questionnaires.
///
/// The identifier doubles as the storage key suffix for overrides and as the
/// `form` field of every submitted payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurveyId {
    Tenant,
    Landlord,
    Advisor,
    Investor,
}

impl SurveyId {
    /// All surveys, in display order.
    pub const ALL: [SurveyId; 4] = [Self::Tenant, Self::Landlord, Self::Advisor, Self::Investor];

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tenant => "tenant",
            Self::Landlord => "landlord",
            Self::Advisor => "advisor",
            Self::Investor => "investor",
        }
    }
}

impl fmt::Display for SurveyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown survey identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown survey '{0}', expected one of: tenant, landlord, advisor, investor")]
pub struct UnknownSurvey(pub String);

impl FromStr for SurveyId {
    type Err = UnknownSurvey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == wanted)
            .ok_or_else(|| UnknownSurvey(s.to_string()))
    }
}
