use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use events::EventBus;
use pipeline::{OpenRouterBackend, PhaseSequencer, PipelineConfig, ReasoningService, RetryPolicy};
use surveyor_core::{ModelProfile, PhaseModels, RunStatus, DEFAULT_MODEL};

mod config;
mod inventory;
mod progress;
mod report;

use config::SurveyorConfig;
use inventory::InventoryScanner;
use report::ReportWriter;

const CONFIG_FILE: &str = "surveyor.toml";
const DEFAULT_OUTPUT_DIR: &str = "surveyor-report";

#[derive(Parser)]
#[command(name = "surveyor")]
#[command(about = "AI-assisted codebase survey pipeline", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a surveyor.toml with default settings
    Init {
        /// Directory to initialize
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Survey a directory and write the report
    Run {
        /// Directory to survey
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Directory the report files are written into
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output: PathBuf,

        /// Maximum number of analysis tasks running at once
        #[arg(long)]
        concurrency: Option<usize>,

        /// Seconds to wait for a single model call
        #[arg(long)]
        task_timeout_secs: Option<u64>,

        /// Model identifier used for every phase
        #[arg(long)]
        model: Option<String>,

        /// OpenRouter-compatible base URL
        #[arg(long)]
        base_url: Option<String>,

        /// Config file to read instead of PATH/surveyor.toml
        #[arg(long)]
        config: Option<PathBuf>,

        /// Suppress live progress output
        #[arg(short, long)]
        quiet: bool,
    },
    /// List the files a survey would include
    Inventory {
        /// Directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

struct RunOptions {
    path: PathBuf,
    output: PathBuf,
    concurrency: Option<usize>,
    task_timeout_secs: Option<u64>,
    model: Option<String>,
    base_url: Option<String>,
    config: Option<PathBuf>,
    quiet: bool,
}

impl RunOptions {
    fn defaults() -> Self {
        Self {
            path: PathBuf::from("."),
            output: PathBuf::from(DEFAULT_OUTPUT_DIR),
            concurrency: None,
            task_timeout_secs: None,
            model: None,
            base_url: None,
            config: None,
            quiet: false,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init { path }) => init_config(&path).await,
        Some(Commands::Run {
            path,
            output,
            concurrency,
            task_timeout_secs,
            model,
            base_url,
            config,
            quiet,
        }) => {
            run_survey(RunOptions {
                path,
                output,
                concurrency,
                task_timeout_secs,
                model,
                base_url,
                config,
                quiet,
            })
            .await
        }
        Some(Commands::Inventory { path }) => show_inventory(&path),
        None => run_survey(RunOptions::defaults()).await,
    }
}

async fn init_config(path: &Path) -> Result<()> {
    let config_path = path.join(CONFIG_FILE);

    if config_path.exists() {
        println!("Configuration already exists at {}", config_path.display());
        return Ok(());
    }

    let name = project_name(path);
    let mut config = SurveyorConfig::default();
    config.project.name = Some(name.clone());
    config.backend.model = Some(DEFAULT_MODEL.to_string());

    let content = toml::to_string_pretty(&config)?;
    tokio::fs::write(&config_path, content)
        .await
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("Initialized surveyor for '{}'", name);
    println!();
    println!("Created {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Export OPENROUTER_API_KEY");
    println!("  2. Run 'surveyor run {}'", path.display());

    Ok(())
}

async fn run_survey(options: RunOptions) -> Result<()> {
    init_tracing();

    // An explicit --config must exist; the default location is optional.
    let config = match &options.config {
        Some(path) => SurveyorConfig::load(path)?,
        None => SurveyorConfig::load_or_default(&options.path.join(CONFIG_FILE))?,
    };

    let api_key = std::env::var("OPENROUTER_API_KEY").context("OPENROUTER_API_KEY is not set")?;

    let project = config
        .project
        .name
        .clone()
        .unwrap_or_else(|| project_name(&options.path));

    let inventory = InventoryScanner::new()
        .scan(&options.path)
        .with_context(|| format!("Failed to scan {}", options.path.display()))?;

    if inventory.is_empty() {
        println!(
            "{} Nothing matched the scan under {}; continuing with the generic survey roles.",
            "!".yellow(),
            options.path.display()
        );
    }

    println!();
    println!(
        "Surveying '{}' ({} files, {} KB)",
        project,
        inventory.len(),
        inventory.total_size() / 1024
    );
    println!();

    let concurrency = options.concurrency.unwrap_or(config.run.concurrency);
    let call_timeout = Duration::from_secs(
        options
            .task_timeout_secs
            .unwrap_or(config.run.task_timeout_secs),
    );

    let models = match options.model.or(config.backend.model) {
        Some(model) => PhaseModels::uniform(ModelProfile::new(model)),
        None => PhaseModels::default(),
    };

    let backend: Arc<dyn ReasoningService> = match options.base_url.or(config.backend.base_url) {
        Some(base_url) => Arc::new(OpenRouterBackend::with_base_url(api_key, base_url)),
        None => Arc::new(OpenRouterBackend::new(api_key)),
    };

    let pipeline_config = PipelineConfig::new(project.clone())
        .with_models(models)
        .with_concurrency(concurrency)
        .with_call_timeout(call_timeout)
        .with_retry(RetryPolicy::new(config.run.max_attempts));

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!();
            eprintln!("Stopping; in-flight work is being wound down...");
            ctrl_c.cancel();
        }
    });

    let mut sequencer = PhaseSequencer::new(backend, pipeline_config).with_cancellation(cancel);

    let printer = if options.quiet {
        None
    } else {
        let bus = EventBus::new();
        let handle = progress::spawn_printer(&bus);
        sequencer = sequencer.with_events(bus);
        Some(handle)
    };

    let outcome = sequencer.run(inventory).await;

    if let Some(printer) = printer {
        let _ = printer.await;
    }

    let paths = ReportWriter::new(&options.output).write(&project, &outcome)?;

    println!();
    match outcome.status {
        RunStatus::Complete => println!("{} Survey complete", "●".green()),
        RunStatus::Degraded => {
            println!(
                "{} Survey finished with {} warnings",
                "◑".yellow(),
                outcome.warnings.len()
            );
            for warning in &outcome.warnings {
                println!("  - {}", warning);
            }
        }
        RunStatus::Fatal => println!("{} Survey failed", "○".red()),
    }
    println!("  Report:  {}", paths.markdown.display());
    println!("  Details: {}", paths.json.display());

    if outcome.status == RunStatus::Fatal {
        return Err(anyhow!(
            "Survey failed: {}",
            outcome.failure.as_deref().unwrap_or("unknown failure")
        ));
    }

    Ok(())
}

fn show_inventory(path: &Path) -> Result<()> {
    let inventory = InventoryScanner::new()
        .scan(path)
        .with_context(|| format!("Failed to scan {}", path.display()))?;

    if inventory.is_empty() {
        println!("No files found under {}", path.display());
        return Ok(());
    }

    for file in inventory.paths() {
        println!("{}", file);
    }
    println!();
    println!(
        "{} files, {} KB total",
        inventory.len(),
        inventory.total_size() / 1024
    );

    Ok(())
}

fn project_name(path: &Path) -> String {
    path.canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .unwrap_or_else(|| "project".to_string())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "surveyor=info,pipeline=warn".into()),
        )
        .init();
}
