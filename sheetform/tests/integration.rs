//! Integration tests for sheetform

use std::time::Duration;

use pretty_assertions::assert_eq;
use sheetform::{
    AnswerMap, EndpointOverrides, FieldError, FormMount, GatewayConfig, HttpFetcher,
    HttpTransport, LoadOutcome, MemoryStore, OverrideStore, QuestionResolver, QuestionSource,
    Resolution, SinkTransport, SourceFetcher, StaticFetcher, StoreError, SubmissionError,
    SubmissionGateway, SubmissionPayload, SubmitError, SurveyConfig, SurveyEndpointConfig,
    SurveyId, TestTransport, derive_schema, group_by_section, load_form, parse_questions,
};
use sheetform::gateway::{SinkResponse, TransportError};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SINK: &str = "https://script.google.com/macros/s/abc/exec";
const SHEET_URL: &str = "https://docs.google.com/spreadsheets/d/abc/export?format=csv";

const SHEET: &str = "\
section,order,key,label,type,options,required,placeholder,help
Business info,2,portfolio,How many units do you manage?,number,,TRUE,e.g. 12,
About you,1,role,Your role,radio,Owner|Agent,yes,,
Business info,1,company_size,How many employees?,radio,1-10|11-50|51+,TRUE,,
About you,2,comments,Anything else?,,,,,Optional
,,,,yesno,Maybe|Later,1,,
";

fn payload() -> SubmissionPayload {
    let answers: AnswerMap = [("company_size", "11-50")].into_iter().collect();
    SubmissionPayload::new(SurveyId::Landlord, answers)
}

#[test]
fn test_grouping_partitions_every_question() {
    let questions = parse_questions(SHEET).unwrap();
    let sections = group_by_section(&questions);

    let mut grouped: Vec<_> = sections.questions().map(|q| q.key.clone()).collect();
    let mut parsed: Vec<_> = questions.iter().map(|q| q.key.clone()).collect();
    grouped.sort();
    parsed.sort();
    assert_eq!(grouped, parsed);

    assert_eq!(
        sections.names().collect::<Vec<_>>(),
        ["About you", "Business info", "General"]
    );
    assert_eq!(
        sections
            .get("Business info")
            .unwrap()
            .questions
            .iter()
            .map(|q| q.key.as_str())
            .collect::<Vec<_>>(),
        ["company_size", "portfolio"]
    );
}

#[test]
fn test_schema_derivation_is_idempotent() {
    let first = derive_schema(&parse_questions(SHEET).unwrap());
    let second = derive_schema(&parse_questions(SHEET).unwrap());
    assert_eq!(first, second);

    for value in ["", "12", "abc", "owner", "Agent", "11-50"] {
        for key in ["portfolio", "role", "company_size", "comments", "question-5"] {
            assert_eq!(first.check_field(key, value), second.check_field(key, value));
        }
    }
}

#[test]
fn test_yesno_ignores_options_column() {
    let questions = parse_questions(SHEET).unwrap();
    let yesno = questions.iter().find(|q| q.key == "question-5").unwrap();
    assert_eq!(yesno.label, "Question 5");
    assert_eq!(yesno.options(), ["Yes", "No"]);
    assert_eq!(yesno.section, "General");
}

#[test]
fn test_required_radio_without_options_rejects_everything() {
    let questions = parse_questions("key,label,type,required\nsize,Size,radio,TRUE\n").unwrap();
    let schema = derive_schema(&questions);
    for value in ["", "yes", "anything"] {
        assert_eq!(schema.check_field("size", value), Err(FieldError::NoOptions));
    }
}

#[test]
fn test_optional_radio_without_options_accepts_yes_no() {
    let questions = parse_questions("key,label,type,required\nsize,Size,radio,FALSE\n").unwrap();
    let schema = derive_schema(&questions);
    assert_eq!(schema.check_field("size", ""), Ok(()));
    assert_eq!(schema.check_field("size", "YES"), Ok(()));
    assert_eq!(schema.check_field("size", "No"), Ok(()));
    assert!(matches!(
        schema.check_field("size", "maybe"),
        Err(FieldError::InvalidChoice { .. })
    ));
}

#[tokio::test]
async fn test_non_https_sink_is_never_contacted() {
    let transport = TestTransport::new();
    let gateway = SubmissionGateway::new(transport.clone(), GatewayConfig::default());

    let err = gateway
        .submit("http://script.google.com/x", &payload())
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::UnsafeEndpoint(_)));

    let err = gateway
        .submit("https://evil.example.com/x", &payload())
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::UnsafeEndpoint(_)));

    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_eleventh_submission_is_rate_limited() {
    let transport = TestTransport::new();
    let gateway = SubmissionGateway::new(transport.clone(), GatewayConfig::default());

    for _ in 0..10 {
        gateway.submit(SINK, &payload()).await.unwrap();
    }
    let err = gateway.submit(SINK, &payload()).await.unwrap_err();
    assert!(matches!(err, SubmissionError::RateLimited { .. }));
    assert_eq!(transport.requests().len(), 10);

    // Other sinks have their own budget
    gateway
        .submit("https://script.google.com/macros/s/other/exec", &payload())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_query_string_does_not_reset_rate_limit() {
    let transport = TestTransport::new();
    let gateway = SubmissionGateway::new(transport.clone(), GatewayConfig::default());

    for i in 0..10 {
        gateway
            .submit(&format!("{SINK}?attempt={i}"), &payload())
            .await
            .unwrap();
    }
    let err = gateway
        .submit(&format!("{SINK}?attempt=10"), &payload())
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::RateLimited { .. }));
    assert_eq!(transport.requests().len(), 10);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_window_rolls() {
    let gateway = SubmissionGateway::new(TestTransport::new(), GatewayConfig::default());
    for _ in 0..10 {
        gateway.submit(SINK, &payload()).await.unwrap();
    }
    assert!(gateway.submit(SINK, &payload()).await.is_err());

    tokio::time::advance(Duration::from_secs(61)).await;
    assert!(gateway.submit(SINK, &payload()).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_slow_sink_times_out() {
    let transport = TestTransport::new().with_delay(Duration::from_secs(45));
    let gateway = SubmissionGateway::new(transport, GatewayConfig::default());

    let err = gateway.submit(SINK, &payload()).await.unwrap_err();
    assert!(matches!(err, SubmissionError::Timeout(d) if d == Duration::from_secs(30)));
}

#[tokio::test]
async fn test_non_success_status_is_rejected() {
    let transport = TestTransport::new().with_response(500, "script error");
    let gateway = SubmissionGateway::new(transport, GatewayConfig::default());

    let err = gateway.submit(SINK, &payload()).await.unwrap_err();
    match err {
        SubmissionError::SinkRejected { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "script error");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_malformed_ack_is_empty() {
    let transport = TestTransport::new().with_response(200, "<html>Thanks</html>");
    let gateway = SubmissionGateway::new(transport.clone(), GatewayConfig::default());

    let ack = gateway.submit(SINK, &payload()).await.unwrap();
    assert!(ack.is_empty());

    let body = &transport.requests()[0].body;
    assert_eq!(body["form"], "landlord");
    assert_eq!(body["company_size"], "11-50");
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_transport_failure_is_reported() {
    let transport = TestTransport::new().with_failure("connection reset");
    let gateway = SubmissionGateway::new(transport, GatewayConfig::default());

    let err = gateway.submit(SINK, &payload()).await.unwrap_err();
    assert!(matches!(err, SubmissionError::Transport(_)));
}

fn tenant_config() -> SurveyConfig {
    SurveyConfig::default().with(
        SurveyId::Tenant,
        SurveyEndpointConfig {
            endpoint: SINK.into(),
            questions_csv_url: SHEET_URL.into(),
            ..Default::default()
        },
    )
}

#[tokio::test]
async fn test_remote_failure_falls_back() {
    let resolver = QuestionResolver::new(
        tenant_config(),
        MemoryStore::new(),
        StaticFetcher::new().with_status(SHEET_URL, 503),
    );
    assert_eq!(
        resolver.resolve(SurveyId::Tenant).await,
        Resolution::NoDynamicConfig
    );
}

struct UnreadableStore;

impl OverrideStore for UnreadableStore {
    fn override_text(&self, _survey: SurveyId) -> Result<Option<String>, StoreError> {
        Err(StoreError::Io {
            path: "survey-override-tenant.csv".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        })
    }

    fn save_override(&self, _survey: SurveyId, _text: &str) -> Result<(), StoreError> {
        Ok(())
    }

    fn clear_override(&self, _survey: SurveyId) -> Result<(), StoreError> {
        Ok(())
    }

    fn endpoint_overrides(&self) -> Result<EndpointOverrides, StoreError> {
        Ok(EndpointOverrides::new())
    }

    fn save_endpoint_overrides(&self, _overrides: &EndpointOverrides) -> Result<(), StoreError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_unreadable_override_falls_through_to_remote() {
    let resolver = QuestionResolver::new(
        tenant_config(),
        UnreadableStore,
        StaticFetcher::new().with_sheet(SHEET_URL, SHEET),
    );
    let resolution = resolver.resolve(SurveyId::Tenant).await;
    let Resolution::Questions { source, questions } = resolution else {
        panic!("expected questions");
    };
    assert_eq!(
        source,
        QuestionSource::Remote {
            url: SHEET_URL.into()
        }
    );
    assert_eq!(questions.len(), 5);
}

#[tokio::test]
async fn test_submit_failure_keeps_answers() {
    let resolver = QuestionResolver::new(
        tenant_config(),
        MemoryStore::new(),
        StaticFetcher::new().with_sheet(SHEET_URL, SHEET),
    );
    let mount = FormMount::new();
    let LoadOutcome::Ready(mut form) = load_form(&resolver, SurveyId::Tenant, &mount).await else {
        panic!("expected a ready form");
    };

    form.set_answer("portfolio", "12");
    form.set_answer("role", " OWNER ");
    form.set_answer("company_size", "51+");
    form.set_answer("question-5", "no");

    let transport = TestTransport::new()
        .with_response(502, "bad gateway")
        .with_response(200, "");
    let gateway = SubmissionGateway::new(transport.clone(), GatewayConfig::default());

    let err = form.submit(&gateway, SINK).await.unwrap_err();
    assert!(matches!(
        err,
        SubmitError::Submission(SubmissionError::SinkRejected { status: 502, .. })
    ));
    assert_eq!(form.answer("role"), " OWNER ");

    form.submit(&gateway, SINK).await.unwrap();
    assert_eq!(form.answer("role"), "");
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn test_torn_down_view_gets_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sheet.csv"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(SHEET)
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let config = SurveyConfig::default().with(
        SurveyId::Advisor,
        SurveyEndpointConfig {
            questions_csv_url: format!("{}/sheet.csv", server.uri()),
            ..Default::default()
        },
    );
    let resolver = QuestionResolver::new(config, MemoryStore::new(), HttpFetcher::new().unwrap());
    let mount = FormMount::new();

    let view = mount.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        view.teardown();
    });

    assert!(matches!(
        load_form(&resolver, SurveyId::Advisor, &mount).await,
        LoadOutcome::Discarded
    ));
}

#[tokio::test]
async fn test_http_fetcher_disables_caching() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/questions.csv"))
        .and(header("pragma", "no-cache"))
        .respond_with(ResponseTemplate::new(200).set_body_string("label\nHello\n"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing.csv"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new().unwrap();
    let body = fetcher
        .fetch_bytes(&format!("{}/questions.csv", server.uri()))
        .await
        .unwrap();
    assert_eq!(body, b"label\nHello\n");

    let err = fetcher
        .fetch_bytes(&format!("{}/missing.csv", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, sheetform::FetchError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_http_transport_posts_json() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/exec"))
        .and(body_partial_json(serde_json::json!({ "form": "landlord" })))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"result":"success"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(Default::default())?;
    let url = url::Url::parse(&format!("{}/exec", server.uri()))?;
    let body = payload().to_json(chrono::Utc::now());

    let response = transport.post_json(&url, &body).await?;
    assert!(response.is_success());
    assert_eq!(response.body, r#"{"result":"success"}"#);
    Ok(())
}

async fn redirecting_sink(exec_path: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(exec_path))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/internal", server.uri()).as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/internal"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_http_transport_does_not_follow_redirect_off_allow_list() -> anyhow::Result<()> {
    let server = redirecting_sink("/exec").await;

    let transport = HttpTransport::new(Default::default())?;
    let url = url::Url::parse(&format!("{}/exec", server.uri()))?;
    let body = payload().to_json(chrono::Utc::now());

    let response = transport.post_json(&url, &body).await?;
    assert_eq!(response.status, 302);
    Ok(())
}

/// Posts to a local server, keeping only the path of the sink address.
struct LocalSink {
    inner: HttpTransport,
    base: String,
}

#[async_trait::async_trait]
impl SinkTransport for LocalSink {
    async fn post_json(
        &self,
        url: &url::Url,
        body: &serde_json::Value,
    ) -> Result<SinkResponse, TransportError> {
        let local = url::Url::parse(&format!("{}{}", self.base, url.path()))
            .map_err(|e| TransportError(e.to_string()))?;
        self.inner.post_json(&local, body).await
    }
}

#[tokio::test]
async fn test_redirect_off_allow_list_is_rejected_by_gateway() -> anyhow::Result<()> {
    let server = redirecting_sink("/macros/s/abc/exec").await;
    let transport = LocalSink {
        inner: HttpTransport::new(Default::default())?,
        base: server.uri(),
    };
    let gateway = SubmissionGateway::new(transport, GatewayConfig::default());

    let err = gateway.submit(SINK, &payload()).await.unwrap_err();
    assert!(matches!(err, SubmissionError::SinkRejected { status: 302, .. }));
    Ok(())
}
