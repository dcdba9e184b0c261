//! avherald-watch main entry point
//!
//! This is the command-line interface for the avherald-watch incident watcher.

use avherald_watch::config::{load_config_with_hash, Config, OutputKind};
use avherald_watch::crawler::{watch, watch_once};
use avherald_watch::output::{load_statistics, print_statistics, SqliteSink};
use avherald_watch::storage::{open_state_store, StateStore};
use clap::Parser;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// avherald-watch: an incremental aviation incident watcher
///
/// Polls the Aviation Herald front page, walks back to the last incident it
/// has already seen, and emits every new headline that passes the configured
/// filters as one JSON record.
#[derive(Parser, Debug)]
#[command(name = "avherald-watch")]
#[command(version = "1.0.0")]
#[command(about = "An incremental aviation incident watcher", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Ignore the persisted watermark and apply the configured start position
    #[arg(long)]
    fresh: bool,

    /// Run a single crawl cycle and exit
    #[arg(long)]
    once: bool,

    /// Validate config and show the resolved settings without crawling
    #[arg(long, conflicts_with_all = ["show_state", "stats", "once"])]
    dry_run: bool,

    /// Print the persisted watermark and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "once"])]
    show_state: bool,

    /// Show statistics from the SQLite output database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "show_state", "once"])]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => load(path)?,
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.show_state {
        handle_show_state(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.once {
        handle_once(&config, cli.fresh).await?;
    } else {
        handle_watch(&config, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout carries emitted incidents.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("avherald_watch=info,warn"),
            1 => EnvFilter::new("avherald_watch=debug,info"),
            2 => EnvFilter::new("avherald_watch=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads and validates the configuration file
fn load(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    tracing::info!("Loading configuration from: {}", path.display());
    match load_config_with_hash(path) {
        Ok((config, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== avherald-watch Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Root URL: {}", config.crawler.root_url);
    println!("  Poll interval: {}s", config.crawler.poll_interval);
    println!("  Fetch timeout: {}s", config.crawler.fetch_timeout);
    println!("  Max pages per cycle: {}", config.crawler.max_pages);
    println!("  Start position: {}", config.crawler.start_position);
    println!("  User agent: {}", config.crawler.user_agent);

    println!("\nState:");
    println!("  Watermark file: {}", config.state.resolved_path().display());

    println!("\nFilter:");
    print_list("Airlines", &config.filter.airline);
    print_list("Models", &config.filter.model);
    print_list("Cities", &config.filter.city);
    print_list("Keywords", &config.filter.keywords);
    println!("  Keyword fan-out: {}", config.filter.keyword_fan_out);

    println!("\nOutput:");
    println!("  Kind: {:?}", config.output.kind);
    if let Some(path) = &config.output.path {
        println!("  Path: {}", path);
    }

    println!("\n✓ Configuration is valid");
}

fn print_list(label: &str, values: &[String]) {
    if values.is_empty() {
        println!("  {}: (any)", label);
    } else {
        println!("  {}: {}", label, values.join(", "));
    }
}

/// Handles the --show-state mode: prints the persisted watermark
fn handle_show_state(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let path = config.state.resolved_path();
    let store = open_state_store(&path);

    println!("State file: {}", path.display());
    match store.load()? {
        Some(watermark) => println!("Watermark: {}", watermark),
        None => println!("Watermark: <none>"),
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics from the output database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let path = match (&config.output.kind, &config.output.path) {
        (OutputKind::Sqlite, Some(path)) => path,
        _ => return Err("--stats requires an [output] section with kind = \"sqlite\"".into()),
    };

    println!("Database: {}\n", path);

    let sink = SqliteSink::open(Path::new(path))?;
    let stats = load_statistics(&sink)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --once mode: one crawl cycle, then persist and exit
async fn handle_once(config: &Config, fresh: bool) -> Result<(), Box<dyn std::error::Error>> {
    match watch_once(config, fresh).await {
        Ok(stats) => {
            tracing::info!("Single cycle completed: {}", stats);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl cycle failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the main watch loop, stopping on Ctrl-C or SIGTERM
async fn handle_watch(config: &Config, fresh: bool) -> Result<(), Box<dyn std::error::Error>> {
    if fresh {
        tracing::info!("Starting fresh (ignoring persisted watermark)");
    }

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    match watch(config, fresh, shutdown).await {
        Ok(()) => {
            tracing::info!("Watcher stopped");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Watcher failed: {}", e);
            Err(e.into())
        }
    }
}

/// Cancels `shutdown` on the first termination signal
async fn wait_for_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!("Cannot listen for SIGTERM: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}
