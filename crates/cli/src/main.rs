mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use autoblog_core::{PipelineOutcome, PipelineRequest, RunReport, Topic};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use orchestrator::adapters::FileHistory;
use orchestrator::files::STUDIO_DIR;
use orchestrator::{FileManager, GateResult};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::config::{AutoblogConfig, CONFIG_FILE};

const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Parser)]
#[command(name = "autoblog")]
#[command(about = "Generate and publish blog posts from trending topics", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .autoblog/ with a starter config
    Init,
    /// Check whether a run could start
    Check {
        #[arg(long)]
        account: Option<String>,
    },
    /// Run the pipeline once
    Run {
        #[arg(long)]
        niche: Option<String>,

        /// Destination id to publish to
        #[arg(long)]
        account: Option<String>,

        /// Skip discovery and write about this topic
        #[arg(long)]
        topic: Option<String>,

        #[arg(long, requires = "topic")]
        hook: Option<String>,

        /// Continue a previous run from its saved topic and draft
        #[arg(long, conflicts_with_all = ["topic", "niche"])]
        resume: Option<Uuid>,
    },
    /// Show recent runs
    History {
        #[arg(short, long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => init_project().await,
        Commands::Check { account } => check(account).await,
        Commands::Run {
            niche,
            account,
            topic,
            hook,
            resume,
        } => {
            let request = match resume {
                Some(run_id) => resume_request(run_id, account).await?,
                None => build_request(niche, account, topic, hook),
            };
            if !run(request).await? {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::History { limit } => history(limit).await,
    }
}

fn build_request(
    niche: Option<String>,
    account: Option<String>,
    topic: Option<String>,
    hook: Option<String>,
) -> PipelineRequest {
    let mut request = PipelineRequest::new();
    if let Some(niche) = niche {
        request = request.with_niche(niche);
    }
    if let Some(account) = account {
        request = request.with_account(account);
    }
    if let Some(topic) = topic {
        request = request.with_topic(Topic::new(topic, hook.unwrap_or_default()));
    }
    request
}

async fn resume_request(run_id: Uuid, account: Option<String>) -> Result<PipelineRequest> {
    let cwd = std::env::current_dir()?;
    let reports = FileHistory::new(FileManager::new(&cwd)).read_all().await?;

    let report = reports
        .iter()
        .rev()
        .find(|r| r.run_id == run_id)
        .with_context(|| format!("No run {} in history", run_id))?;

    let Some(mut request) = report.resume_request() else {
        bail!(
            "Run {} ended as '{}' and cannot be resumed",
            run_id,
            report.outcome.as_str()
        );
    };
    if let Some(failure) = report.outcome.failure() {
        if failure.is_ambiguous() {
            println!(
                "{}",
                "Warning: the previous publish may have gone through. Check the destination first."
                    .yellow()
            );
        }
    }
    if account.is_some() {
        request.account = account;
    }
    Ok(request)
}

async fn load_config(cwd: &Path) -> Result<AutoblogConfig> {
    let config_path = cwd.join(STUDIO_DIR).join(CONFIG_FILE);
    if config_path.exists() {
        return AutoblogConfig::load(&config_path).await;
    }

    println!("No {} found.", config_path.display());
    println!("Run 'autoblog init' first, or using default configuration.");
    println!();
    let project_name = cwd
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("my-blog");
    Ok(AutoblogConfig::for_project(project_name))
}

async fn init_project() -> Result<()> {
    let cwd = std::env::current_dir()?;
    let files = FileManager::new(&cwd);
    let studio_dir = files.studio_dir();
    let config_path = studio_dir.join(CONFIG_FILE);

    if config_path.exists() {
        println!("Project already initialized at {}", studio_dir.display());
        return Ok(());
    }

    println!("Initializing autoblog in {}", cwd.display());

    files.ensure_directories().await?;

    let project_name = cwd
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("my-blog")
        .to_string();

    let config = AutoblogConfig::for_project(project_name.clone());
    tokio::fs::write(&config_path, toml::to_string_pretty(&config)?).await?;

    println!();
    println!("Initialized autoblog for '{}'", project_name);
    println!();
    println!("Created:");
    println!("  {}/ ", STUDIO_DIR);
    println!("  ├── {} ", CONFIG_FILE);
    println!("  ├── published/");
    println!("  └── drafts/");
    println!();
    println!("Next steps:");
    println!("  1. Edit {}/{} to add topics and destinations", STUDIO_DIR, CONFIG_FILE);
    println!("  2. Run 'autoblog run --niche tech'");

    Ok(())
}

async fn check(account: Option<String>) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config = load_config(&cwd).await?;
    let orchestrator = config.build_orchestrator(&cwd)?;

    let request = build_request(None, account, None, None);

    println!();
    println!("Project: {}", config.project.name);
    println!();
    println!("Destinations:");
    for dest in config.credential_snapshot().destinations {
        let marker = if dest.is_connected {
            "●".green()
        } else {
            "○".red()
        };
        println!("  {} {} ({})", marker, dest.name, dest.id);
    }
    println!();

    match orchestrator.check(&request) {
        GateResult::Allowed => match orchestrator.gate().resolve_destination(&request) {
            Ok(dest) => println!("{} Ready to publish to {}", "✓".green(), dest.name),
            Err(failure) => println!("{} {}", "✗".red(), failure.user_message()),
        },
        GateResult::Blocked { reasons } => {
            println!("{}", "Blocked:".red().bold());
            for reason in reasons {
                println!("  - {}", reason);
            }
        }
    }
    println!();

    Ok(())
}

async fn run(request: PipelineRequest) -> Result<bool> {
    let cwd = std::env::current_dir()?;
    let config = load_config(&cwd).await?;

    init_tracing();

    let orchestrator = Arc::new(config.build_orchestrator(&cwd)?);
    let (handle, join) = orchestrator.start(request);

    let cancel = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!(run_id = %cancel.run_id(), "Cancellation requested");
            cancel.cancel();
        }
    });

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut progress = handle.progress();
    let progress_bar = bar.clone();
    let watcher = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let latest = progress.borrow_and_update().clone();
            if let Some(event) = latest {
                progress_bar.set_position(u64::from(event.percent));
                progress_bar.set_message(event.stage_label);
            }
        }
    });

    let report = join.await.context("Pipeline task panicked")?;
    let _ = watcher.await;
    bar.finish_and_clear();

    print_report(&report, &cwd);
    Ok(report.outcome.is_success())
}

fn print_report(report: &RunReport, cwd: &Path) {
    println!();
    match &report.outcome {
        PipelineOutcome::Success { artifact } => {
            println!("{} {}", "Published:".green().bold(), artifact.external_url);
        }
        PipelineOutcome::Failure { failure } => {
            println!("{} {}", "Failed:".red().bold(), failure.user_message());
            if report.draft.is_some() {
                let path: PathBuf = FileManager::new(cwd).draft_path(report.run_id);
                println!("  Draft kept at {}", path.display());
            }
            if report.retry_request().is_some() {
                println!("  Retry with: autoblog run --resume {}", report.run_id);
            } else if failure.is_ambiguous() {
                println!(
                    "  {}",
                    "The post may already be live. Check the destination before resuming.".yellow()
                );
            }
        }
        PipelineOutcome::Cancelled { before } => {
            println!("{} before {} stage", "Cancelled".yellow().bold(), before);
            if report.resume_request().is_some() {
                println!("  Resume with: autoblog run --resume {}", report.run_id);
            }
        }
    }
    if let Some(ref topic) = report.topic {
        println!("  Topic: {}", topic.text);
    }
    println!("  Run:   {} ({} ms)", report.run_id, report.duration_ms());
    println!();
}

async fn history(limit: usize) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let reports = FileHistory::new(FileManager::new(&cwd)).read_all().await?;

    if reports.is_empty() {
        println!("No runs yet.");
        return Ok(());
    }

    println!();
    println!("Recent runs ({} of {}):", reports.len().min(limit), reports.len());
    for report in reports.iter().rev().take(limit) {
        let icon = match &report.outcome {
            PipelineOutcome::Success { .. } => "●".green(),
            PipelineOutcome::Failure { .. } => "✗".red(),
            PipelineOutcome::Cancelled { .. } => "○".yellow(),
        };
        let title = report
            .draft
            .as_ref()
            .map(|d| d.title.as_str())
            .or(report.topic.as_ref().map(|t| t.text.as_str()))
            .unwrap_or("-");
        let detail = match &report.outcome {
            PipelineOutcome::Success { artifact } => artifact.external_url.clone(),
            PipelineOutcome::Failure { failure } => failure.to_string(),
            PipelineOutcome::Cancelled { before } => format!("cancelled before {}", before),
        };
        println!(
            "  {} {} [{}] {}",
            icon,
            report.started_at.format("%Y-%m-%d %H:%M"),
            report.run_id,
            title
        );
        println!("      {}", detail.dimmed());
    }
    println!();

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "autoblog=info,orchestrator=info".into()),
        )
        .init();
}
