//! # leadflow CLI entry point
//!
//! Drives one lead through the intake automation, applies any manual
//! completions given on the command line, submits the assignment and prints
//! the summary.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;

use leadflow::api::{EnrichmentStatus, FollowUpSla, HttpLeadApi, LeadApi, LeadData};
use leadflow::config::LeadflowConfig;
use leadflow::core::StageKey;
use leadflow::errors::ApiError;
use leadflow::events::{EventSink, LoggingEventSink};
use leadflow::flow::{manual_fields, FlowPhase, LeadSession, StageSequencer};
use leadflow::observability::{init_tracing, LogFormat};
use leadflow::testing::{fixtures, ScriptedLeadApi};

/// Lead-intake automation: create, de-duplicate, enrich, validate, score and
/// assign a lead.
#[derive(Parser, Debug)]
#[command(name = "leadflow", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log line format.
    #[arg(long, value_enum, default_value_t = LogStyle::Compact, global = true)]
    log_format: LogStyle,

    /// Path to a JSON configuration file. Environment variables are used
    /// when absent.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Delay after each stage transition, in milliseconds.
    #[arg(long, global = true)]
    delay_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the flow against the configured lead API.
    Run(RunArgs),

    /// Run the flow against a scripted in-memory API.
    Demo(DemoArgs),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum LogStyle {
    Compact,
    Json,
}

impl From<LogStyle> for LogFormat {
    fn from(style: LogStyle) -> Self {
        match style {
            LogStyle::Compact => Self::Compact,
            LogStyle::Json => Self::Json,
        }
    }
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Lead identifier.
    #[arg(long)]
    lead_id: String,

    /// Company name, used for the duplicate check.
    #[arg(long)]
    company: Option<String>,

    /// Contact email, used for the duplicate check.
    #[arg(long)]
    email: Option<String>,

    /// Contact phone, used for the duplicate check.
    #[arg(long)]
    phone: Option<String>,

    #[command(flatten)]
    operator: OperatorArgs,
}

#[derive(Args, Debug)]
struct DemoArgs {
    /// Lead identifier.
    #[arg(long, default_value = "LEAD-001")]
    lead_id: String,

    /// Report a duplicate with this id. Repeatable.
    #[arg(long = "duplicate", value_name = "ID")]
    duplicates: Vec<String>,

    /// Enrichment status to return (`Completed`, `Partial`, or anything else).
    #[arg(long, default_value = "Completed")]
    enrichment: String,

    /// Validation check result as `name=Result`. Repeatable; replaces the
    /// default all-verified checks.
    #[arg(long = "check", value_name = "NAME=RESULT")]
    checks: Vec<String>,

    /// Make a stage's API call fail. Repeatable.
    #[arg(long = "fail", value_name = "STAGE")]
    failures: Vec<String>,

    #[command(flatten)]
    operator: OperatorArgs,
}

/// What the operator would type into the popup.
#[derive(Args, Debug)]
struct OperatorArgs {
    /// Manual value as `stage.field=value`. Stages given here are completed
    /// manually if they end in warning or error. Repeatable.
    #[arg(long = "override", value_name = "STAGE.FIELD=VALUE")]
    overrides: Vec<String>,

    /// Complete every warning/error stage manually, even without values.
    #[arg(long)]
    override_all: bool,

    /// Owner to assign the lead to. The flow stops at the assignment form
    /// when absent.
    #[arg(long)]
    owner: Option<String>,

    /// Follow-up window: 4_hours, 1_day, 2_days or 1_week.
    #[arg(long, default_value = "4_hours")]
    sla: FollowUpSla,

    /// Note for the owner.
    #[arg(long)]
    note: Option<String>,

    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,
}

/// A parsed `--override` value.
#[derive(Debug, Clone, PartialEq)]
struct OverrideArg {
    stage: StageKey,
    key: String,
    value: Value,
}

fn parse_override(raw: &str) -> Result<OverrideArg> {
    let (target, value) = raw
        .split_once('=')
        .with_context(|| format!("override '{raw}' must look like stage.field=value"))?;
    let (stage, key) = target
        .split_once('.')
        .with_context(|| format!("override '{raw}' must name a stage and a field"))?;
    let stage: StageKey = stage
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    if key.is_empty() {
        bail!("override '{raw}' has an empty field name");
    }

    // Numbers and booleans keep their JSON type; anything else is a string.
    let value = serde_json::from_str::<Value>(value)
        .ok()
        .filter(|v| v.is_number() || v.is_boolean())
        .unwrap_or_else(|| Value::String(value.to_string()));

    Ok(OverrideArg {
        stage,
        key: key.to_string(),
        value,
    })
}

fn load_config(cli: &Cli) -> Result<LeadflowConfig> {
    let mut config = match cli.config {
        Some(ref path) => LeadflowConfig::from_file(path)?,
        None => LeadflowConfig::from_env()?,
    };
    if let Some(delay_ms) = cli.delay_ms {
        config.pacing.stage_delay_ms = delay_ms;
    }
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn scripted_api(args: &DemoArgs) -> Result<ScriptedLeadApi> {
    let api = ScriptedLeadApi::happy_path();

    if !args.duplicates.is_empty() {
        api.set_duplicates(
            args.duplicates
                .iter()
                .map(|id| fixtures::duplicate(id, "Acme Textiles"))
                .collect(),
        );
    }

    let status = EnrichmentStatus::from(args.enrichment.clone());
    api.set_enrichment(fixtures::enrichment(status, &[("industry", "Textiles")]));

    if !args.checks.is_empty() {
        let pairs = args
            .checks
            .iter()
            .map(|raw| {
                raw.split_once('=')
                    .with_context(|| format!("check '{raw}' must look like name=Result"))
            })
            .collect::<Result<Vec<_>>>()?;
        api.set_validation(fixtures::validation(&pairs));
    }

    for raw in &args.failures {
        let stage: StageKey = raw.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        let error = ApiError::transport(format!("demo {stage}"), "scripted failure");
        match stage {
            StageKey::DuplicateCheck => api.fail_duplicates(error),
            StageKey::Enrichment => api.fail_enrich(error),
            StageKey::Validation => api.fail_validate(error),
            StageKey::Scoring => api.fail_score(error),
            StageKey::Assignment => api.fail_next_assign(error),
            StageKey::RecordCreated => bail!("record_created makes no API call"),
        }
    }

    Ok(api)
}

async fn drive(
    api: Arc<dyn LeadApi>,
    config: &LeadflowConfig,
    lead_id: String,
    lead: LeadData,
    operator: &OperatorArgs,
) -> Result<u8> {
    let overrides = operator
        .overrides
        .iter()
        .map(|raw| parse_override(raw))
        .collect::<Result<Vec<_>>>()?;

    let sink: Arc<dyn EventSink> = Arc::new(LoggingEventSink);
    let sequencer = StageSequencer::new(api)
        .with_pacing(config.pacing)
        .with_event_sink(sink);
    let mut session = LeadSession::new(lead_id, lead, sequencer);

    let token = session.cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel("interrupted");
        }
    });

    session.run_automation().await?;

    for item in &overrides {
        session.set_override_field(item.stage, item.key.clone(), item.value.clone());
    }
    for stage in session.flow().stages_needing_attention() {
        if !session.flow().status(stage).is_overridable() {
            continue;
        }
        let requested = operator.override_all || session.override_fields(stage).is_some();
        if !requested {
            let expected: Vec<&str> = manual_fields(stage).iter().map(|f| f.key).collect();
            eprintln!(
                "{stage}: {} (complete manually with --override {stage}.<field>=..., fields: {})",
                session.flow().status(stage),
                expected.join(", ")
            );
            continue;
        }
        session.apply_override(stage).await?;
    }

    let Some(owner) = operator.owner.as_deref() else {
        print_stages(&session);
        eprintln!("assignment form is open; pass --owner to assign the lead");
        return Ok(2);
    };

    if let Some(draft) = session.draft_mut() {
        draft.owner = owner.to_string();
        draft.follow_up_sla = operator.sla;
        draft.note = operator.note.clone();
    }
    let summary = session.submit_assignment().await?;

    if operator.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_stages(&session);
        println!("{summary}");
    }

    let code = u8::from(session.flow().phase() != FlowPhase::Complete);
    session.close();
    Ok(code)
}

fn print_stages(session: &LeadSession) {
    for state in session.flow().stages() {
        let marker = if state.is_manual() { " (manual)" } else { "" };
        match state.error {
            Some(ref error) => println!("  {:<16} {}{marker}: {error}", state.stage.as_str(), state.status),
            None => println!("  {:<16} {}{marker}", state.stage.as_str(), state.status),
        }
    }
}

async fn run(cli: Cli) -> Result<u8> {
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Run(args) => {
            let api = HttpLeadApi::new(&config.api).context("building lead API client")?;
            let lead = LeadData {
                company_name: args.company,
                email: args.email,
                phone: args.phone,
            };
            drive(Arc::new(api), &config, args.lead_id, lead, &args.operator).await
        }
        Commands::Demo(args) => {
            let api = scripted_api(&args)?;
            drive(
                Arc::new(api),
                &config,
                args.lead_id.clone(),
                fixtures::sample_lead(),
                &args.operator,
            )
            .await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.log_format.into(), cli.verbose) {
        eprintln!("failed to initialise logging: {e}");
    }

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
