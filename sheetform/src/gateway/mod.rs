//! Submission gateway.
//!
//! Every submission passes, in order: the endpoint policy, the per-sink rate
//! limiter, payload sanitization, and a time-bounded POST. Refusals from the
//! first two never reach the network.

mod policy;
pub use policy::{DEFAULT_ALLOWED_HOSTS, EndpointPolicy, UnsafeEndpoint};

mod rate_limit;
pub use rate_limit::{RateLimit, RateLimiter};

mod sanitize;
pub use sanitize::{MAX_TEXT_LENGTH, sanitize_text, strip_markup};

mod transport;
pub use transport::{HttpTransport, SinkResponse, SinkTransport, TransportError};

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use sheetform_types::{AnswerMap, SurveyId};
use url::Url;

/// Submissions still waiting after this long are abandoned.
pub const SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error type for submissions. All variants leave the form intact for a retry.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Unsafe endpoint: {0}")]
    UnsafeEndpoint(#[from] UnsafeEndpoint),

    #[error("Too many submissions to {sink}, retry in {}s", retry_after.as_secs())]
    RateLimited { sink: String, retry_after: Duration },

    #[error("Submission timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Submission rejected: HTTP {status} {body}")]
    SinkRejected { status: u16, body: String },

    #[error("Submission failed: {0}")]
    Transport(#[from] TransportError),
}

/// Gateway settings.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub policy: EndpointPolicy,
    pub rate_limit: RateLimit,
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            policy: EndpointPolicy::default(),
            rate_limit: RateLimit::default(),
            timeout: SUBMIT_TIMEOUT,
        }
    }
}

/// The answers of one form, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPayload {
    pub form: SurveyId,
    pub answers: AnswerMap,
}

impl SubmissionPayload {
    pub fn new(form: SurveyId, answers: AnswerMap) -> Self {
        Self { form, answers }
    }

    /// Build the JSON body: sanitized answers plus `form` and `timestamp`.
    ///
    /// `form` and `timestamp` are written last and win over answers with the
    /// same key.
    pub fn to_json(&self, timestamp: DateTime<Utc>) -> Value {
        let mut body = Map::new();
        for (key, value) in self.answers.iter() {
            body.insert(key.to_string(), Value::String(sanitize_text(value)));
        }
        body.insert("form".into(), Value::String(self.form.to_string()));
        body.insert(
            "timestamp".into(),
            Value::String(timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        Value::Object(body)
    }
}

/// The sink's acknowledgement. Empty or non-JSON bodies become an empty object.
#[derive(Debug, Clone, PartialEq)]
pub struct Ack(pub Value);

impl Ack {
    /// Parse a success body, tolerating anything that is not JSON.
    pub fn from_body(body: &str) -> Self {
        if body.trim().is_empty() {
            return Self::empty();
        }
        match serde_json::from_str(body) {
            Ok(value) => Self(value),
            Err(err) => {
                tracing::debug!("sink acknowledgement is not JSON ({err}), treating as empty");
                Self::empty()
            }
        }
    }

    pub fn empty() -> Self {
        Self(Value::Object(Map::new()))
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Object(map) => map.is_empty(),
            Value::Null => true,
            _ => false,
        }
    }
}

/// Sends answers to an external sink.
#[derive(Debug)]
pub struct SubmissionGateway<T = HttpTransport> {
    transport: T,
    policy: EndpointPolicy,
    limiter: RateLimiter,
    timeout: Duration,
}

impl SubmissionGateway<HttpTransport> {
    /// Create a gateway that talks HTTP.
    pub fn http(config: GatewayConfig) -> Result<Self, SubmissionError> {
        let transport = HttpTransport::new(config.policy.clone())?;
        Ok(Self::new(transport, config))
    }
}

impl<T: SinkTransport> SubmissionGateway<T> {
    /// Create a gateway over any transport.
    pub fn new(transport: T, config: GatewayConfig) -> Self {
        Self {
            transport,
            policy: config.policy,
            limiter: RateLimiter::new(config.rate_limit),
            timeout: config.timeout,
        }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Submit a payload to `sink`.
    pub async fn submit(
        &self,
        sink: &str,
        payload: &SubmissionPayload,
    ) -> Result<Ack, SubmissionError> {
        let url = self.policy.check(sink).inspect_err(|reason| {
            tracing::warn!(form = %payload.form, "refusing to submit: {reason}");
        })?;

        if let Err(retry_after) = self.limiter.try_acquire(&sink_key(&url)) {
            tracing::warn!(form = %payload.form, sink = %url, "submission rate limited");
            return Err(SubmissionError::RateLimited {
                sink: url.to_string(),
                retry_after,
            });
        }

        let body = payload.to_json(Utc::now());
        let response = tokio::time::timeout(self.timeout, self.transport.post_json(&url, &body))
            .await
            .map_err(|_| SubmissionError::Timeout(self.timeout))??;

        if !response.is_success() {
            tracing::warn!(form = %payload.form, status = response.status, "sink rejected submission");
            return Err(SubmissionError::SinkRejected {
                status: response.status,
                body: response.body,
            });
        }

        tracing::info!(form = %payload.form, "submission accepted");
        Ok(Ack::from_body(&response.body))
    }
}

/// The rate-limit bucket of a sink: scheme, host, port and path.
///
/// Query and fragment are ignored so varying them does not buy a fresh budget.
fn sink_key(url: &Url) -> String {
    let mut key = url.clone();
    key.set_query(None);
    key.set_fragment(None);
    key.to_string()
}
