//! # sheetform
//!
//! Dynamic survey forms driven by a question sheet.
//!
//! A question sheet is a comma-separated file, one row per question, with the
//! columns `section, order, key, label, type, options, required, placeholder,
//! help` (any subset, any case). This crate turns such a sheet into a form and
//! sends the answers to an external sink.
//!
//! ## Pipeline
//!
//! ```rust,ignore
//! use sheetform::{FormMount, LoadOutcome, QuestionResolver, SubmissionGateway, SurveyId};
//!
//! let resolver = QuestionResolver::new(config, store, HttpFetcher::new()?);
//! let mount = FormMount::new();
//!
//! match load_form(&resolver, SurveyId::Tenant, &mount).await {
//!     LoadOutcome::Ready(mut form) => {
//!         form.set_answer("company_size", "11-50");
//!         let gateway = SubmissionGateway::http(GatewayConfig::default())?;
//!         form.submit(&gateway, &endpoint).await?;
//!     }
//!     LoadOutcome::Fallback => { /* show the static form */ }
//!     LoadOutcome::Discarded => {}
//! }
//! ```
//!
//! ## Question types
//!
//! - `text` - single-line input
//! - `number` - single-line input accepting numeric literals
//! - `textarea` - multi-line input (also used for unknown types)
//! - `radio` - one of the pipe-separated `options`
//! - `yesno` - `Yes` or `No`, whatever the `options` column says
//!
//! ## Sources
//!
//! Questions come from a locally uploaded override sheet if there is one,
//! else from the configured remote sheet. When neither works the caller is
//! told to show its static form instead.

pub use sheetform_types::*;

pub mod config;
pub use config::{ConfigError, EndpointOverrides, SurveyConfig, SurveyEndpointConfig, resolve_endpoints};

pub mod control;
pub use control::{ChoiceOption, Control, field_label};

pub mod fetch;
pub use fetch::{FetchError, HttpFetcher, SourceFetcher};

pub mod gateway;
pub use gateway::{
    Ack, EndpointPolicy, GatewayConfig, HttpTransport, RateLimit, SinkTransport,
    SubmissionError, SubmissionGateway, SubmissionPayload, UnsafeEndpoint,
};

pub mod parser;
pub use parser::{ParsedSheet, parse_bytes, parse_questions, parse_sheet};

pub mod resolver;
pub use resolver::{QuestionResolver, QuestionSource, Resolution};

pub mod schema;
pub use schema::{FieldRule, ValidationSchema, derive_schema};

pub mod sections;
pub use sections::{Section, Sections, group_by_section};

pub mod session;
pub use session::{FormMount, FormSession, LoadOutcome, SubmitError, load_form};

pub mod store;
pub use store::{DirStore, MemoryStore, OverrideStore, StoreError, load_endpoint_overrides};

pub mod upload;
pub use upload::{UploadError, upload_override, validate_upload};

// Test doubles for running forms without a network
mod test_backend;
pub use test_backend::{RecordedRequest, StaticFetcher, TestTransport};
