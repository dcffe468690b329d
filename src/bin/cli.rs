use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::future::Future;
use std::process::ExitCode;
use std::time::Duration;
use tabled::{Table, Tabled, settings::Style};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use hashwatch::config::{DEFAULT_LOOKUP_TIMEOUT_SECS, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_STATE_PATH};
use hashwatch::console;
use hashwatch::lookup::MALWARE_BAZAAR_URL;
use hashwatch::{
    accept_current, track_file, DisabledLookup, IntegrityMonitor, JsonStateStore, LookupConfig,
    MalwareBazaarClient, MonitorConfig, MonitoredFile, Registry, Sha256Provider, StateStore,
    ThreatLookup,
};

#[derive(Parser)]
#[command(name = "hashwatch")]
#[command(about = "Poll-based file integrity monitor")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the registry state file
    #[arg(short, long, env = "HASHWATCH_STATE", default_value = DEFAULT_STATE_PATH)]
    state: PathBuf,

    /// Seconds to wait between passes
    #[arg(short, long, env = "HASHWATCH_INTERVAL", default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    interval: u64,

    /// Do not submit changed hashes to the threat lookup service
    #[arg(long)]
    no_lookup: bool,

    /// Threat lookup endpoint
    #[arg(long, env = "HASHWATCH_LOOKUP_URL", default_value = MALWARE_BAZAAR_URL)]
    lookup_url: String,

    /// MalwareBazaar API key
    #[arg(long, env = "MALWAREBAZAAR_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Seconds before a threat lookup is abandoned
    #[arg(long, default_value_t = DEFAULT_LOOKUP_TIMEOUT_SECS)]
    lookup_timeout: u64,

    /// Exit instead of starting with an empty registry when the state file cannot be loaded
    #[arg(long)]
    strict: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the registry, then monitor until interrupted (default)
    Watch,

    /// Run a single pass; exits non-zero if any file is tampered or missing
    Check,

    /// Print the recorded registry without hashing anything
    Show {
        /// Output format
        #[arg(short, long, default_value = "snapshot")]
        output: OutputFormat,
    },

    /// Start tracking a file, using its present content as the baseline
    Add {
        /// File to track
        path: String,

        /// Display name (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Accept a file's present content as its new baseline
    Accept {
        /// Tracked file name
        name: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Snapshot,
    Table,
    Yaml,
    Json,
}

#[derive(Tabled)]
struct RegistryTableRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Current Hash")]
    current_hash: String,
    #[tabled(rename = "Last Modified")]
    last_modified: String,
}

impl From<&MonitoredFile> for RegistryTableRow {
    fn from(file: &MonitoredFile) -> Self {
        let status = if file.current_hash.is_removed() {
            "✗ removed"
        } else if file.matches_baseline() {
            "✓ baseline"
        } else {
            "⚠ changed"
        };

        RegistryTableRow {
            name: file.name.clone(),
            path: file.path.clone(),
            status: status.to_string(),
            current_hash: short_hash(file.current_hash.as_str()),
            last_modified: file.last_modified.clone(),
        }
    }
}

fn short_hash(hash: &str) -> String {
    if hash.chars().count() > 16 {
        format!("{}…", hash.chars().take(16).collect::<String>())
    } else {
        hash.to_string()
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("hashwatch=debug,info")
    } else {
        EnvFilter::new("hashwatch=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\x1b[31m✗ Error:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn build_config(cli: &Cli) -> MonitorConfig {
    let lookup = if cli.no_lookup {
        LookupConfig::disabled()
    } else {
        LookupConfig::default()
    };

    let lookup = lookup
        .with_endpoint(cli.lookup_url.clone())
        .with_api_key(cli.api_key.clone())
        .with_timeout(Duration::from_secs(cli.lookup_timeout));

    MonitorConfig::new(cli.state.clone())
        .with_poll_interval(Duration::from_secs(cli.interval))
        .with_strict_load(cli.strict)
        .with_lookup(lookup)
}

fn build_lookup(config: &LookupConfig) -> Result<Box<dyn ThreatLookup>, Box<dyn std::error::Error>> {
    if !config.enabled {
        return Ok(Box::new(DisabledLookup));
    }
    Ok(Box::new(MalwareBazaarClient::new(config)?))
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = build_config(&cli);
    config.validate()?;

    let store = JsonStateStore::new(&config.state_path);

    match cli.command.unwrap_or(Commands::Watch) {
        Commands::Watch => cmd_watch(store, &config).await,
        Commands::Check => cmd_check(store, &config).await,
        Commands::Show { output } => cmd_show(&store, output),
        Commands::Add { path, name } => cmd_add(&store, &path, name.as_deref()),
        Commands::Accept { name } => cmd_accept(&store, &name),
    }
}

async fn cmd_watch(store: JsonStateStore, config: &MonitorConfig) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let lookup = build_lookup(&config.lookup)?;
    let mut monitor = IntegrityMonitor::load(store, Sha256Provider, lookup, config)?;

    monitor.print_snapshot();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(forward_interrupt(tokio::signal::ctrl_c(), shutdown_tx));

    info!(
        "Monitoring {} files every {:?}",
        monitor.registry().len(),
        monitor.poll_interval()
    );
    monitor.run(shutdown_rx).await;

    Ok(ExitCode::SUCCESS)
}

/// Raise `shutdown` once `signal` fires. If the handler cannot be installed
/// the sender is held forever so monitoring carries on.
async fn forward_interrupt<F>(signal: F, shutdown_tx: watch::Sender<bool>)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            info!("Interrupt received, stopping after the current pass");
            let _ = shutdown_tx.send(true);
        }
        Err(e) => {
            error!("Cannot listen for Ctrl-C, monitoring continues: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

async fn cmd_check(store: JsonStateStore, config: &MonitorConfig) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let lookup = build_lookup(&config.lookup)?;
    let mut monitor = IntegrityMonitor::load(store, Sha256Provider, lookup, config)?;

    let report = monitor.run_pass().await;

    println!();
    for check in &report.checks {
        println!("{} {:<30} {}", check.transition.symbol(), check.name, check.transition.as_str());
    }
    println!();
    println!("{}", report.summary_line());

    if report.save_failures() > 0 {
        println!("⚠ {} state writes failed", report.save_failures());
    }

    if report.is_clean() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

fn cmd_show(store: &JsonStateStore, output: OutputFormat) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let registry = store.load()?;

    if registry.is_empty() {
        println!("No files tracked in {}", store.location());
        return Ok(ExitCode::SUCCESS);
    }

    match output {
        OutputFormat::Snapshot => print!("{}", console::snapshot_text(&registry)),
        OutputFormat::Table => {
            let rows: Vec<RegistryTableRow> = registry.iter().map(RegistryTableRow::from).collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&registry)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&registry)?),
    }

    Ok(ExitCode::SUCCESS)
}

fn load_for_edit(store: &JsonStateStore) -> Result<Registry, Box<dyn std::error::Error>> {
    if store.path().exists() {
        Ok(store.load()?)
    } else {
        info!("{} does not exist yet, creating it", store.location());
        Ok(Registry::default())
    }
}

fn cmd_add(store: &JsonStateStore, path: &str, name: Option<&str>) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut registry = load_for_edit(store)?;
    let file = track_file(&mut registry, &Sha256Provider, path, name)?;
    store.save(&registry)?;

    println!("✓ Tracking {} ({})", file.name, file.path);
    println!("  baseline: {}", file.baseline_hash);
    Ok(ExitCode::SUCCESS)
}

fn cmd_accept(store: &JsonStateStore, name: &str) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut registry = store.load()?;
    let previous = accept_current(&mut registry, &Sha256Provider, name)?;
    store.save(&registry)?;

    let baseline = registry.get(name).map(|f| f.baseline_hash.clone()).unwrap_or_default();
    if previous == baseline {
        println!("✓ {} already matches its baseline", name);
    } else {
        println!("✓ {} re-baselined", name);
        println!("  {} -> {}", previous, baseline);
    }
    Ok(ExitCode::SUCCESS)
}
