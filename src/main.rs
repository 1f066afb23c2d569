//! NodePulse - periodic cluster node/nodeclaim sampler
//!
//! A CLI tool that repeatedly lists nodes and nodeclaims, counts them
//! against a fixed set of predicates, and writes one CSV row per sample.
//!
//! Exit codes:
//!   0 - Stopped cleanly (Ctrl-C)
//!   1 - Startup error (bad arguments, config, output conflict) or a
//!       failure writing samples

mod analysis;
mod cli;
mod config;
mod models;
mod report;
mod sampler;
mod store;

use anyhow::{Context, Result};
use cli::Args;
use config::Config;
use report::Emitter;
use sampler::Sampler;
use std::path::PathBuf;
use std::sync::Arc;
use store::FileStore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("NodePulse v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_sampler(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Sampler failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .nodepulse.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  .nodepulse.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .nodepulse.toml")?;

    println!("✅ Created .nodepulse.toml with default settings.");
    println!("   Edit it to customize the interval, workers, source and output.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr; stdout carries the CSV rows.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Set up output, store and sampler, then sample until interrupted.
async fn run_sampler(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    // Output conflicts must be reported before the header is written.
    let output_path = config.output.path.as_ref().map(PathBuf::from);
    let sink = report::open_output(
        output_path.as_deref(),
        config.output.force,
        config.output.stdout,
    )?;
    if sink.destination_count() == 0 {
        warn!("No output destinations configured; samples will be discarded");
    }
    let mut emitter = Emitter::new(Box::new(sink)).context("Failed to write CSV header")?;

    let source_dir = PathBuf::from(&config.source.dir);
    if !source_dir.is_dir() {
        warn!(
            "Source directory {} not found; waiting for it to appear",
            source_dir.display()
        );
    }
    let store = FileStore::new(source_dir);
    info!("Reading cluster state from {}", store.root().display());

    let sampler = Sampler::new(Arc::new(store), config.sampler_config());

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, stopping");
                shutdown.cancel();
            }
            Err(e) => warn!("Unable to listen for Ctrl-C: {}", e),
        }
    });

    let stats = sampler.run(&mut emitter, &cancel).await?;
    info!(
        "Recorded {} samples ({} cycles skipped)",
        stats.cycles, stats.skipped
    );
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", config::DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
