//! Medusa main entry point
//!
//! This is the command-line interface for the Medusa HedgeDoc mirror.

use anyhow::Context;
use clap::Parser;
use medusa::config::{load_config_with_hash, validate, Config};
use medusa::crawler::{convert_existing, discover, mirror, MirrorSummary};
use medusa::storage::open_vault;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Medusa: a local mirror of your HedgeDoc
///
/// Medusa crawls a HedgeDoc server starting from one pad, follows every link
/// that points back at the same server, stores each pad as a markdown file
/// and rewrites the server links into `[[pad|text]]` wiki links.
#[derive(Parser, Debug)]
#[command(name = "medusa")]
#[command(version)]
#[command(about = "Mirror a HedgeDoc server into a wiki vault", long_about = None)]
struct Cli {
    /// Root URL of the HedgeDoc server (e.g. https://md.example.com)
    #[arg(value_name = "ROOT")]
    root: Option<String>,

    /// Pad the crawl starts from [default: navigation]
    #[arg(short, long, value_name = "PAD")]
    start: Option<String>,

    /// HedgeDoc history export (history.json) whose pads are mirrored too
    #[arg(long, value_name = "FILE")]
    history: Option<PathBuf>,

    /// Directory the pads are written into [default: ./vault]
    #[arg(short = 'p', long, visible_alias = "path", value_name = "DIR")]
    output: Option<PathBuf>,

    /// Rename files to their titles after conversion (default behavior)
    #[arg(long, overrides_with = "no_rename")]
    rename: bool,

    /// Keep the pad identities as file names
    #[arg(long, overrides_with = "rename")]
    no_rename: bool,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of pads downloaded concurrently (1-16)
    #[arg(long, value_name = "N")]
    max_concurrent: Option<usize>,

    /// Ignore pads cached by earlier runs
    #[arg(long)]
    refresh: bool,

    /// Only list the pads reachable from the start pad
    #[arg(long, conflicts_with = "convert_only")]
    discover_only: bool,

    /// Only convert (and rename) the documents already in the vault
    #[arg(long, conflicts_with = "discover_only")]
    convert_only: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;
    tracing::info!(
        "Mirroring {} from '{}' into {}",
        config.hedgedoc.root,
        config.hedgedoc.start,
        config.vault.path
    );

    // Handle different modes
    if cli.discover_only {
        handle_discover(&config).await?;
    } else if cli.convert_only {
        handle_convert(&config)?;
    } else {
        handle_mirror(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("medusa=info,warn"),
            1 => EnvFilter::new("medusa=debug,info"),
            2 => EnvFilter::new("medusa=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file (if any), applies command line overrides and validates
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(root) = &cli.root {
        config.hedgedoc.root = root.clone();
    }
    if let Some(start) = &cli.start {
        config.hedgedoc.start = start.clone();
    }
    if let Some(history) = &cli.history {
        config.hedgedoc.history = Some(history.display().to_string());
    }
    if let Some(output) = &cli.output {
        config.vault.path = output.display().to_string();
    }
    if cli.rename {
        config.vault.rename = true;
    }
    if cli.no_rename {
        config.vault.rename = false;
    }
    if let Some(max_concurrent) = cli.max_concurrent {
        config.fetch.max_concurrent_fetches = max_concurrent;
    }
    if cli.refresh {
        config.fetch.refresh = true;
    }

    config.normalize();
    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Handles the --discover-only mode: lists reachable pads
async fn handle_discover(config: &Config) -> anyhow::Result<()> {
    let report = discover(config).await.context("Crawl failed")?;

    for id in &report.documents {
        if report.empty.contains(id) {
            println!("{} (empty)", id);
        } else {
            println!("{}", id);
        }
    }
    println!("\n✓ {} pads reachable", report.documents.len());

    Ok(())
}

/// Handles the --convert-only mode: rewrites links of an existing vault
fn handle_convert(config: &Config) -> anyhow::Result<()> {
    let vault = open_vault(Path::new(&config.vault.path))
        .with_context(|| format!("Cannot open vault {}", config.vault.path))?;
    let (conversion, renames) = convert_existing(config, &vault).context("Conversion failed")?;

    println!(
        "✓ Converted {} links in {} documents",
        conversion.links, conversion.documents
    );
    if let Some(renames) = renames {
        println!("✓ Renamed {} documents", renames.renamed.len());
    }

    Ok(())
}

/// Handles the main mirror operation
async fn handle_mirror(config: &Config) -> anyhow::Result<()> {
    match mirror(config).await {
        Ok(summary) => {
            tracing::info!("Mirror completed successfully");
            print_summary(config, &summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Mirror failed: {}", e);
            Err(e).context("Mirror failed")
        }
    }
}

fn print_summary(config: &Config, summary: &MirrorSummary) {
    println!("=== Medusa Mirror ===\n");
    println!("Server: {}", config.hedgedoc.root);
    println!("Vault: {}", config.vault.path);
    println!();
    println!("Pads discovered: {}", summary.crawl.documents.len());
    println!("Pads empty or unavailable: {}", summary.crawl.empty.len());
    println!("Pads written: {}", summary.materialized.len());
    println!("Links converted: {}", summary.conversion.links);
    if summary.conversion.failed > 0 {
        println!("Documents failed to convert: {}", summary.conversion.failed);
    }
    match &summary.renames {
        Some(renames) => println!(
            "Documents renamed: {} ({} kept their name)",
            renames.renamed.len(),
            renames.kept
        ),
        None => println!("Renaming disabled"),
    }
}
