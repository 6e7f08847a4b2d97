use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use sheetform::{
    DirStore, EndpointOverrides, EndpointPolicy, FormMount, GatewayConfig, HttpFetcher,
    LoadOutcome, OverrideStore, QuestionResolver, QuestionSource, Resolution, SubmissionGateway,
    SubmitError, SurveyConfig, SurveyId, derive_schema, group_by_section, load_endpoint_overrides,
    load_form, parse_sheet, resolve_endpoints, upload_override,
};
use sheetform_doc_html::{HtmlOptions, to_html_with_options};
use tracing_subscriber::EnvFilter;

/// Spreadsheet-driven survey forms.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Directory holding override sheets and saved endpoints.
    #[arg(long, global = true, default_value = ".sheetform")]
    store: PathBuf,

    /// TOML file with the base survey configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a question sheet and report what a form would look like.
    Check { file: PathBuf },

    /// Show where a survey's questions come from, and the questions as JSON.
    Resolve { survey: SurveyId },

    /// Render a survey as an HTML form.
    Render {
        survey: SurveyId,

        /// Write to this file instead of stdout.
        #[arg(long, short)]
        out: Option<PathBuf>,

        #[arg(long)]
        title: Option<String>,

        /// Emit only the <form> element.
        #[arg(long)]
        fragment: bool,

        /// Text of the submit button.
        #[arg(long, default_value = "Submit")]
        submit_label: String,

        /// Leave out the help text under each question.
        #[arg(long)]
        no_help: bool,
    },

    /// Store a local override sheet for a survey.
    Upload {
        survey: SurveyId,

        #[arg(required_unless_present = "clear")]
        file: Option<PathBuf>,

        /// Remove the stored override instead.
        #[arg(long, conflicts_with = "file")]
        clear: bool,
    },

    /// Save the submission endpoint of a survey.
    SetEndpoint {
        survey: SurveyId,

        #[arg(required_unless_present = "clear")]
        url: Option<String>,

        /// Forget the saved endpoint instead.
        #[arg(long, conflicts_with = "url")]
        clear: bool,
    },

    /// Fill in a survey and submit it.
    Submit {
        survey: SurveyId,

        /// An answer as `key=value`. Repeat for every question.
        #[arg(long = "answer", short = 'a', value_parser = parse_answer)]
        answers: Vec<(String, String)>,

        /// Submit here instead of the configured endpoint.
        #[arg(long)]
        sink: Option<String>,
    },
}

fn parse_answer(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SurveyConfig::load(path)?,
        None => SurveyConfig::default(),
    };
    let store = DirStore::open(&cli.store)
        .with_context(|| format!("cannot open store at {}", cli.store.display()))?;

    match cli.command {
        Command::Check { file } => check(&file),
        Command::Resolve { survey } => resolve(config, store, survey).await,
        Command::Render {
            survey,
            out,
            title,
            fragment,
            submit_label,
            no_help,
        } => {
            let mut options = HtmlOptions::new()
                .full_document(!fragment)
                .with_submit_label(submit_label)
                .with_help(!no_help);
            if let Some(title) = title {
                options = options.with_title(title);
            }
            render(config, store, survey, out, &options).await
        }
        Command::Upload {
            survey,
            file,
            clear,
        } => upload(&store, survey, file, clear),
        Command::SetEndpoint { survey, url, clear } => set_endpoint(&store, survey, url, clear),
        Command::Submit {
            survey,
            answers,
            sink,
        } => submit(config, store, survey, answers, sink).await,
    }
}

fn init_logging() {
    let default_level = "info";
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn check(file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read {}", file.display()))?;
    let sheet = parse_sheet(&text)?;

    for warning in &sheet.warnings {
        println!("warning: {warning}");
    }
    for section in &group_by_section(&sheet.questions) {
        println!("{} ({} questions)", section.name, section.questions.len());
        for question in &section.questions {
            let required = if question.required { ", required" } else { "" };
            println!(
                "  {:>3}  {} [{}{required}]",
                question.order,
                question.key,
                question.kind.type_name()
            );
        }
    }

    let schema = derive_schema(&sheet.questions);
    let duplicates: Vec<_> = schema.duplicate_keys().collect();
    if !duplicates.is_empty() {
        bail!("duplicate question keys: {}", duplicates.join(", "));
    }
    Ok(())
}

fn resolver(config: SurveyConfig, store: DirStore) -> Result<QuestionResolver<DirStore, HttpFetcher>> {
    Ok(QuestionResolver::new(config, store, HttpFetcher::new()?))
}

async fn resolve(config: SurveyConfig, store: DirStore, survey: SurveyId) -> Result<()> {
    match resolver(config, store)?.resolve(survey).await {
        Resolution::Questions { source, questions } => {
            match source {
                QuestionSource::LocalOverride => eprintln!("{survey}: local override"),
                QuestionSource::Remote { url } => eprintln!("{survey}: remote sheet {url}"),
            }
            println!("{}", serde_json::to_string_pretty(&questions)?);
        }
        Resolution::NoDynamicConfig => {
            eprintln!("{survey}: no dynamic questions, the static form applies");
        }
    }
    Ok(())
}

async fn render(
    config: SurveyConfig,
    store: DirStore,
    survey: SurveyId,
    out: Option<PathBuf>,
    options: &HtmlOptions,
) -> Result<()> {
    let resolver = resolver(config, store)?;
    let form = match load_form(&resolver, survey, &FormMount::new()).await {
        LoadOutcome::Ready(form) => form,
        LoadOutcome::Fallback => bail!("{survey} has no dynamic questions to render"),
        LoadOutcome::Discarded => bail!("form load was cancelled"),
    };

    let html = to_html_with_options(&form, options);
    match out {
        Some(path) => std::fs::write(&path, html)
            .with_context(|| format!("cannot write {}", path.display()))?,
        None => print!("{html}"),
    }
    Ok(())
}

fn upload(store: &DirStore, survey: SurveyId, file: Option<PathBuf>, clear: bool) -> Result<()> {
    if clear {
        store.clear_override(survey)?;
        println!("cleared override for {survey}");
        return Ok(());
    }
    let Some(file) = file else {
        bail!("a file is required");
    };

    let content = std::fs::read_to_string(&file)
        .with_context(|| format!("cannot read {}", file.display()))?;
    let name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    upload_override(store, survey, &name, &content)?;
    println!("stored override for {survey}");
    Ok(())
}

fn set_endpoint(store: &impl OverrideStore, survey: SurveyId, url: Option<String>, clear: bool) -> Result<()> {
    // Read strictly here: a corrupt file must not be replaced by an empty map.
    let mut overrides: EndpointOverrides = store
        .endpoint_overrides()
        .context("saved endpoints are unreadable, fix or remove the file first")?;
    if clear {
        overrides.remove(survey);
    } else if let Some(url) = url {
        overrides.set(survey, &url, &EndpointPolicy::default())?;
    }
    store.save_endpoint_overrides(&overrides)?;
    println!("saved endpoints");
    Ok(())
}

async fn submit(
    config: SurveyConfig,
    store: DirStore,
    survey: SurveyId,
    answers: Vec<(String, String)>,
    sink: Option<String>,
) -> Result<()> {
    let endpoints = resolve_endpoints(&config, &load_endpoint_overrides(&store), survey);
    let sink = sink.unwrap_or(endpoints.endpoint);

    let resolver = resolver(config, store)?;
    let mut form = match load_form(&resolver, survey, &FormMount::new()).await {
        LoadOutcome::Ready(form) => form,
        LoadOutcome::Fallback => bail!("{survey} has no dynamic questions to fill in"),
        LoadOutcome::Discarded => bail!("form load was cancelled"),
    };

    for (key, value) in answers {
        if !form.set_answer(&key, value) {
            tracing::warn!(%survey, key, "ignoring answer for unknown question");
        }
    }

    let gateway = SubmissionGateway::http(GatewayConfig::default())?;
    match form.submit(&gateway, &sink).await {
        Ok(ack) => {
            println!("submitted");
            if !ack.is_empty() {
                println!("{}", serde_json::to_string_pretty(&ack.0)?);
            }
            Ok(())
        }
        Err(SubmitError::ValidationFailed(errors)) => {
            for (key, error) in errors.iter() {
                eprintln!("{key}: {error}");
            }
            bail!("{errors}")
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use sheetform::MemoryStore;
    use sheetform::store::ENDPOINTS_KEY;

    const ENDPOINT: &str = "https://script.google.com/macros/s/new/exec";

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn answers_split_on_first_equals() {
        assert_eq!(
            parse_answer("note=a=b").unwrap(),
            ("note".to_string(), "a=b".to_string())
        );
        assert!(parse_answer("nothing").is_err());
    }

    #[test]
    fn parses_submit() {
        let cli = Cli::try_parse_from([
            "sheetform",
            "--store",
            "/tmp/s",
            "submit",
            "Landlord",
            "-a",
            "company_size=11-50",
        ])
        .unwrap();
        let Command::Submit { survey, answers, sink } = cli.command else {
            panic!("expected submit");
        };
        assert_eq!(survey, SurveyId::Landlord);
        assert_eq!(answers, [("company_size".to_string(), "11-50".to_string())]);
        assert_eq!(sink, None);
    }

    #[test]
    fn set_endpoint_saves_url() {
        let store = MemoryStore::new();
        set_endpoint(&store, SurveyId::Tenant, Some(ENDPOINT.to_string()), false).unwrap();
        let saved = store.endpoint_overrides().unwrap();
        assert_eq!(saved.get(SurveyId::Tenant), Some(ENDPOINT));
    }

    #[test]
    fn set_endpoint_keeps_corrupt_file() {
        let store = MemoryStore::new();
        store.put(ENDPOINTS_KEY, "{\"tenant\": ");

        assert!(set_endpoint(&store, SurveyId::Landlord, Some(ENDPOINT.to_string()), false).is_err());
        assert!(set_endpoint(&store, SurveyId::Landlord, None, true).is_err());
        assert!(store.endpoint_overrides().is_err());
    }

    #[test]
    fn parses_render_options() {
        let cli = Cli::try_parse_from([
            "sheetform",
            "render",
            "tenant",
            "--fragment",
            "--submit-label",
            "Send",
            "--no-help",
        ])
        .unwrap();
        let Command::Render {
            fragment,
            submit_label,
            no_help,
            ..
        } = cli.command
        else {
            panic!("expected render");
        };
        assert!(fragment && no_help);
        assert_eq!(submit_label, "Send");
    }
}
