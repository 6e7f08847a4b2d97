use async_trait::async_trait;
use reqwest::Client;
use reqwest::redirect;
use url::Url;

use super::EndpointPolicy;

/// Maximum number of redirects followed on submission.
const MAX_REDIRECTS: usize = 5;

/// The raw answer of a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkResponse {
    pub status: u16,
    pub body: String,
}

impl SinkResponse {
    /// Check for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A connection-level failure: nothing usable came back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Something that can POST a JSON document to a sink.
#[async_trait]
pub trait SinkTransport: Send + Sync {
    async fn post_json(
        &self,
        url: &Url,
        body: &serde_json::Value,
    ) -> Result<SinkResponse, TransportError>;
}

/// HTTP transport backed by `reqwest`.
///
/// Redirects are only followed to hosts the endpoint policy accepts, so a sink
/// cannot bounce a submission to an arbitrary address.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a transport whose redirect handling obeys `policy`.
    pub fn new(policy: EndpointPolicy) -> Result<Self, TransportError> {
        let redirect_policy = redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() >= MAX_REDIRECTS {
                attempt.error("too many redirects")
            } else if policy.is_allowed(attempt.url().as_str()) {
                attempt.follow()
            } else {
                attempt.stop()
            }
        });
        let client = Client::builder()
            .redirect(redirect_policy)
            .build()
            .map_err(|e| TransportError(e.to_string()))?;
        Ok(Self { client })
    }

    /// Use an existing client as-is.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SinkTransport for HttpTransport {
    async fn post_json(
        &self,
        url: &Url,
        body: &serde_json::Value,
    ) -> Result<SinkResponse, TransportError> {
        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(SinkResponse { status, body })
    }
}
