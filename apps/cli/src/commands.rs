//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use qabase_core::{LifecycleEngine, ProgressReporter};
use qabase_intake::CsvBatchAdapter;
use qabase_shared::{AppConfig, BatchReport, EntryId, QaEntry, Status, init_config, load_config};
use qabase_storage::Storage;
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// QaBase: a moderated question-and-answer knowledge base.
#[derive(Parser)]
#[command(
    name = "qabase",
    version,
    about = "Collect, moderate and search question/answer pairs.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Database path (overrides `storage.path` from the config file).
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the moderation HTTP API.
    Serve {
        /// Address to bind (overrides `server.bind`).
        #[arg(long)]
        bind: Option<String>,
    },

    /// Import question/answer pairs from a CSV file as pending entries.
    Import {
        /// CSV file with `question` and `answer` columns.
        file: PathBuf,
    },

    /// List entries, newest first.
    List {
        /// Only entries in this status (pending, approved, rejected, unanswered).
        #[arg(short, long)]
        status: Option<String>,

        /// Maximum number of entries.
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Show one entry as JSON.
    Show { id: String },

    /// Approve a pending entry.
    Approve { id: String },

    /// Reject a pending entry.
    Reject { id: String },

    /// Print entry counts per status.
    Stats,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "qabase=info",
        1 => "qabase=debug",
        _ => "qabase=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let db = cli.db;
    match cli.command {
        Command::Serve { bind } => cmd_serve(db, bind).await,
        Command::Import { file } => cmd_import(db, &file).await,
        Command::List { status, limit } => cmd_list(db, status.as_deref(), limit).await,
        Command::Show { id } => cmd_show(db, &id).await,
        Command::Approve { id } => cmd_transition(db, &id, Status::Approved).await,
        Command::Reject { id } => cmd_transition(db, &id, Status::Rejected).await,
        Command::Stats => cmd_stats(db).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// Load the config file and apply the `--db` override.
fn resolve_config(db: Option<PathBuf>) -> Result<AppConfig> {
    let mut config = load_config()?;
    if let Some(path) = db {
        config.storage.path = path.to_string_lossy().into_owned();
    }
    Ok(config)
}

/// How a command needs the database.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Access {
    ReadOnly,
    ReadWrite,
}

async fn open_engine(config: &AppConfig, access: Access) -> Result<LifecycleEngine> {
    let path = config.storage.resolved_path()?;
    let storage = match access {
        Access::ReadOnly => Storage::open_readonly(&path).await,
        Access::ReadWrite => Storage::open(&path).await,
    }
    .wrap_err_with(|| format!("cannot open database at {}", path.display()))?;
    Ok(LifecycleEngine::new(Arc::new(storage)))
}

fn parse_id(raw: &str) -> Result<EntryId> {
    raw.parse()
        .map_err(|e| eyre!("'{raw}' is not a valid entry id: {e}"))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_serve(db: Option<PathBuf>, bind: Option<String>) -> Result<()> {
    let mut config = resolve_config(db)?;
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    info!(bind = %config.server.bind, "starting moderation API");
    qabase_api::serve(&config).await?;
    Ok(())
}

async fn cmd_import(db: Option<PathBuf>, file: &Path) -> Result<()> {
    let config = resolve_config(db)?;
    let raw = std::fs::read(file).wrap_err_with(|| format!("cannot read {}", file.display()))?;
    let engine = open_engine(&config, Access::ReadWrite).await?;

    info!(file = %file.display(), bytes = raw.len(), "importing CSV");
    let reporter = CliProgress::new();
    let report = engine
        .ingest_batch(&CsvBatchAdapter, raw, &reporter)
        .await?;

    println!();
    if report.is_partial() {
        println!("  Import finished with errors.");
    }
    println!("  Imported: {}", report.imported);
    println!("  Failed:   {}", report.errors.len());
    for err in &report.errors {
        println!("    row {}: {}", err.row, err.detail);
    }
    println!();
    Ok(())
}

async fn cmd_list(db: Option<PathBuf>, status: Option<&str>, limit: Option<u32>) -> Result<()> {
    let config = resolve_config(db)?;
    let status = status.map(str::parse::<Status>).transpose()?;
    let limit = config.listing.effective_limit(limit);
    let engine = open_engine(&config, Access::ReadOnly).await?;

    let entries = engine.list(status, limit).await?;
    if entries.is_empty() {
        println!("No entries.");
        return Ok(());
    }
    for entry in &entries {
        print_entry_line(entry);
    }
    Ok(())
}

async fn cmd_show(db: Option<PathBuf>, id: &str) -> Result<()> {
    let config = resolve_config(db)?;
    let id = parse_id(id)?;
    let engine = open_engine(&config, Access::ReadOnly).await?;
    let entry = engine.get(&id).await?;
    println!("{}", serde_json::to_string_pretty(&entry)?);
    Ok(())
}

async fn cmd_transition(db: Option<PathBuf>, id: &str, target: Status) -> Result<()> {
    let config = resolve_config(db)?;
    let id = parse_id(id)?;
    let engine = open_engine(&config, Access::ReadWrite).await?;
    let entry = match target {
        Status::Approved => engine.approve(&id).await?,
        Status::Rejected => engine.reject(&id).await?,
        other => return Err(eyre!("no CLI transition to '{other}'")),
    };
    print_entry_line(&entry);
    Ok(())
}

async fn cmd_stats(db: Option<PathBuf>) -> Result<()> {
    let config = resolve_config(db)?;
    let engine = open_engine(&config, Access::ReadOnly).await?;
    let counts = engine.stats().await?;
    let total: u64 = counts.iter().map(|(_, n)| n).sum();
    for (status, n) in counts {
        println!("  {:<11} {n}", status.as_str());
    }
    println!("  {:<11} {total}", "total");
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn print_entry_line(entry: &QaEntry) {
    println!(
        "{}  {:<10}  {:<5}  {}",
        entry.id,
        entry.status.as_str(),
        entry.source.as_str(),
        entry.question
    );
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif bar.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg} [{pos}/{len}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        bar.set_style(style);
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { bar }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn row_processed(&self, current: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(current as u64);
    }

    fn done(&self, _report: &BatchReport) {
        self.bar.finish_and_clear();
    }
}
