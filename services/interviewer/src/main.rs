//! Interviewer CLI
//!
//! Runs an adaptive interview in the terminal, or exposes one as an MCP server
//! over stdio so an external agent can drive it.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use interview_core::{
    InterviewSession, SessionOptions,
    agent::InterviewService,
    domain::{DomainCatalog, FileDomainCatalog},
    llm_client::{CannedLLMClient, LLMClient, OpenAICompatibleClient, Provider, TimeoutClient},
    profile::CandidateProfile,
    prompts::PromptTemplates,
    session::{DEFAULT_MAX_QUESTIONS, DEFAULT_MIN_QUESTIONS, FeedbackTiming, InterviewSummary},
    voice::CapturePolicy,
};
use rmcp::{ServiceExt, transport::stdio};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{Level, info, warn};

mod interview;
mod terminal;

#[derive(Parser, Debug)]
#[command(name = "interviewer")]
#[command(about = "Adaptive technical interviewer", long_about = None)]
struct Cli {
    /// Use canned responses instead of a live model
    #[arg(long, global = true)]
    offline: bool,

    #[arg(long, global = true, env = "LLM_PROVIDER", default_value = "openai")]
    provider: String,

    /// Chat model; defaults to the provider's standard model
    #[arg(long, global = true, env = "CHAT_MODEL")]
    model: Option<String>,

    #[arg(long, global = true, env = "DOMAINS_PATH", default_value = "./configurations")]
    domains_path: PathBuf,

    #[arg(long, global = true, env = "PROMPTS_PATH", default_value = "./prompts")]
    prompts_path: PathBuf,

    #[arg(long, global = true, env = "GENERATION_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    #[arg(long, global = true, env = "RUST_LOG", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run an interview in this terminal
    Run {
        #[command(flatten)]
        interview: InterviewArgs,

        /// Listening attempts per question before moving on
        #[arg(long, default_value_t = 3)]
        max_attempts: u32,
    },
    /// Serve an interview as MCP tools over stdio
    Mcp {
        #[command(flatten)]
        interview: InterviewArgs,
    },
    /// List the available domains
    Domains,
}

#[derive(Args, Debug)]
struct InterviewArgs {
    /// Domain identifier, e.g. `backend_engineer`
    #[arg(long)]
    domain: String,

    /// Candidate name
    #[arg(long)]
    name: String,

    /// Experience band, e.g. "Senior (5-8 years)"
    #[arg(long)]
    experience: String,

    /// Comma-separated skills to probe
    #[arg(long, value_delimiter = ',')]
    skills: Vec<String>,

    #[arg(long, env = "MIN_QUESTIONS", default_value_t = DEFAULT_MIN_QUESTIONS)]
    min_questions: u32,

    #[arg(long, env = "MAX_QUESTIONS", default_value_t = DEFAULT_MAX_QUESTIONS)]
    max_questions: u32,

    /// `immediate` or `deferred`
    #[arg(long, env = "FEEDBACK_TIMING", default_value = "immediate")]
    feedback: String,
}

impl InterviewArgs {
    fn profile(&self) -> CandidateProfile {
        let skills = self
            .skills
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        CandidateProfile::new(self.name.clone(), self.experience.clone(), skills)
    }

    fn options(&self) -> Result<SessionOptions> {
        Ok(SessionOptions {
            min_questions: self.min_questions,
            max_questions: self.max_questions,
            feedback_timing: self.feedback.parse::<FeedbackTiming>()?,
        })
    }
}

fn build_client(cli: &Cli) -> Result<Arc<dyn LLMClient>> {
    if cli.offline {
        info!("Offline mode: using canned responses.");
        return Ok(Arc::new(CannedLLMClient::new()));
    }
    let provider = Provider::from_name(&cli.provider);
    let api_key = std::env::var(provider.api_key_var()).with_context(|| {
        format!(
            "{} must be set for the '{}' provider (or pass --offline)",
            provider.api_key_var(),
            cli.provider
        )
    })?;
    let model = cli
        .model
        .clone()
        .unwrap_or_else(|| provider.default_model().to_string());
    info!(provider = ?provider, %model, "Using chat completion provider.");

    let client: Arc<dyn LLMClient> = Arc::new(OpenAICompatibleClient::for_provider(
        &provider, &api_key, model,
    ));
    Ok(Arc::new(TimeoutClient::new(
        client,
        Duration::from_secs(cli.timeout_secs.max(1)),
    )))
}

async fn start_session(cli: &Cli, args: &InterviewArgs) -> Result<(InterviewSession, String)> {
    let catalog = FileDomainCatalog::new(cli.domains_path.clone());
    let domain = catalog.load(&args.domain).await?;
    let prompts = Arc::new(PromptTemplates::load_dir(&cli.prompts_path)?);
    let session =
        InterviewSession::start(args.profile(), domain, args.options()?, build_client(cli)?, prompts)
            .await?;
    Ok(session)
}

async fn run_terminal(cli: &Cli, args: &InterviewArgs, max_attempts: u32) -> Result<()> {
    let (mut session, introduction) = start_session(cli, args).await?;

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C. Stopping the interview...");
            on_ctrl_c.cancel();
        }
    });

    let policy = CapturePolicy {
        max_attempts,
        ..CapturePolicy::default()
    };
    let mut io = terminal::TerminalIo::stdio();
    let concluded =
        interview::run_interview(&mut session, &mut io, &introduction, &policy, &cancel).await?;
    if concluded.is_none() {
        warn!("Interview stopped before its conclusion.");
    }

    println!("\n{}", serde_json::to_string_pretty(&session.summary())?);
    Ok(())
}

async fn serve_mcp(cli: &Cli, args: &InterviewArgs) -> Result<()> {
    let (session, introduction) = start_session(cli, args).await?;
    info!(%introduction, "Interview ready; serving MCP tools over stdio.");

    let (summary_tx, mut summary_rx) = mpsc::channel::<InterviewSummary>(32);
    tokio::spawn(async move {
        while let Some(summary) = summary_rx.recv().await {
            info!(
                question_count = summary.question_count,
                max_questions = summary.max_questions,
                turns = summary.transcript.len(),
                "Interview progress"
            );
        }
    });

    let service = InterviewService::new(Arc::new(Mutex::new(session)), Some(summary_tx))
        .serve(stdio())
        .await
        .context("Failed to start MCP server")?;
    let reason = service.waiting().await?;
    info!(?reason, "MCP session ended.");
    Ok(())
}

async fn list_domains(cli: &Cli) -> Result<()> {
    let catalog = FileDomainCatalog::new(cli.domains_path.clone());
    for domain in catalog.list().await? {
        println!("{}", domain);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Run {
            interview,
            max_attempts,
        } => run_terminal(&cli, interview, *max_attempts).await,
        Commands::Mcp { interview } => serve_mcp(&cli, interview).await,
        Commands::Domains => list_domains(&cli).await,
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = cli
        .log_level
        .parse::<Level>()
        .with_context(|| format!("'{}' is not a valid log level", cli.log_level))?;
    // stdout carries the interview and the MCP transport; logs go to stderr.
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(run(cli));
    // A pending stdin read holds a blocking thread that never finishes on its own.
    runtime.shutdown_timeout(Duration::from_millis(500));
    result
}
