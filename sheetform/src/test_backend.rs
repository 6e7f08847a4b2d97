//! Test doubles for running the pipeline without a network.
//!
//! `TestTransport` stands in for the submission sink and records every request
//! it receives; `StaticFetcher` serves question sheets from memory.
//!
//! # Example
//!
//! ```rust,ignore
//! use sheetform::{GatewayConfig, SubmissionGateway, TestTransport};
//!
//! let transport = TestTransport::new().with_response(200, r#"{"result":"success"}"#);
//! let gateway = SubmissionGateway::new(transport.clone(), GatewayConfig::default());
//!
//! gateway.submit("https://script.google.com/macros/s/x/exec", &payload).await?;
//! assert_eq!(transport.requests().len(), 1);
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::fetch::{FetchError, SourceFetcher};
use crate::gateway::{SinkResponse, SinkTransport, TransportError};

/// One request seen by a [`TestTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub url: Url,
    pub body: Value,
}

#[derive(Debug, Default)]
struct TransportState {
    requests: Vec<RecordedRequest>,
    responses: VecDeque<Result<SinkResponse, TransportError>>,
}

/// A sink transport that answers with pre-configured responses.
///
/// Clones share state, so a test can keep one handle and give the other to a
/// gateway. Once the queued responses run out every request gets `200 {}`.
#[derive(Debug, Clone, Default)]
pub struct TestTransport {
    state: Arc<Mutex<TransportState>>,
    delay: Option<Duration>,
}

impl TestTransport {
    /// Create a transport that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response.
    pub fn with_response(self, status: u16, body: impl Into<String>) -> Self {
        self.lock().responses.push_back(Ok(SinkResponse {
            status,
            body: body.into(),
        }));
        self
    }

    /// Queue a connection failure.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.lock()
            .responses
            .push_back(Err(TransportError(message.into())));
        self
    }

    /// Wait this long before answering each request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> MutexGuard<'_, TransportState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SinkTransport for TestTransport {
    async fn post_json(&self, url: &Url, body: &Value) -> Result<SinkResponse, TransportError> {
        let response = {
            let mut state = self.lock();
            state.requests.push(RecordedRequest {
                url: url.clone(),
                body: body.clone(),
            });
            state.responses.pop_front()
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        response.unwrap_or_else(|| {
            Ok(SinkResponse {
                status: 200,
                body: "{}".into(),
            })
        })
    }
}

/// A fetcher serving question sheets from memory.
///
/// Unknown addresses answer with HTTP 404.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    sheets: HashMap<String, Result<Vec<u8>, u16>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StaticFetcher {
    /// Create a fetcher that knows no sheets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `text` at `url`.
    pub fn with_sheet(self, url: impl Into<String>, text: impl Into<String>) -> Self {
        self.with_bytes(url, text.into().into_bytes())
    }

    /// Serve raw bytes at `url`.
    pub fn with_bytes(mut self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.sheets.insert(url.into(), Ok(bytes));
        self
    }

    /// Answer `url` with a non-success status.
    pub fn with_status(mut self, url: impl Into<String>, status: u16) -> Self {
        self.sheets.insert(url.into(), Err(status));
        self
    }

    /// Every address fetched so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SourceFetcher for StaticFetcher {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());

        match self.sheets.get(url) {
            Some(Ok(bytes)) => Ok(bytes.clone()),
            Some(Err(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status: *status,
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}
