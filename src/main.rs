//! Comment-Harvest main entry point
//!
//! This is the command-line interface for the Comment-Harvest feed harvester.

use clap::Parser;
use comment_harvest::analyze::run_analysis;
use comment_harvest::config::{load_config_with_hash, Config};
use comment_harvest::{run_harvest, StopReason};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Comment-Harvest: a resumable harvester for paginated comment feeds
///
/// The first run walks the feed backwards until the configured cutoff. Later
/// runs resume forward from the saved cursor and append only records that are
/// not yet in the dataset.
#[derive(Parser, Debug)]
#[command(name = "comment-harvest")]
#[command(version)]
#[command(about = "A resumable harvester for paginated comment feeds", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what a run would do without fetching anything
    #[arg(long, conflicts_with_all = ["stats", "analyze"])]
    dry_run: bool,

    /// Show statistics about the dataset and exit
    #[arg(long, conflicts_with_all = ["dry_run", "analyze"])]
    stats: bool,

    /// Classify recent images and extend the block list, then exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    analyze: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.analyze {
        handle_analyze(&config).await?;
    } else {
        handle_harvest(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("comment_harvest=info,warn"),
            1 => EnvFilter::new("comment_harvest=debug,info"),
            2 => EnvFilter::new("comment_harvest=trace,debug"),
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

/// Handles the --dry-run mode: prints the effective configuration and the run mode
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use comment_harvest::storage::{open_stores, CursorStore};

    println!("=== Comment-Harvest Dry Run ===\n");

    println!("Source:");
    println!("  Endpoint: {}", config.source.endpoint);
    if let Some(referer) = &config.source.referer {
        println!("  Referer: {}", referer);
    }
    println!("  User agent: {}", config.source.user_agent);
    println!("  Request delay: {}ms", config.source.request_delay_ms);
    println!("  Timeout: {}s", config.source.timeout_secs);

    println!("\nOutput:");
    println!("  Records: {} ({})", config.output.records_path, config.output.schema);
    println!("  Cursor: {}", config.output.cursor_path);

    println!("\nBackfill:");
    println!("  Cutoff: {} month(s)", config.backfill.cutoff_months);

    println!("\nAnalyzer:");
    println!("  Block list: {}", config.analyzer.blocklist_path);
    println!("  Recent days: {}", config.analyzer.recent_days);
    println!("  Model: {}", config.analyzer.model);

    println!("\n✓ Configuration is valid");

    let (cursors, _) = open_stores(&config.output);
    match cursors.load() {
        Ok(Some(cursor)) => println!(
            "✓ Would resume ascending from page {}",
            cursor.resume_page()
        ),
        Ok(None) => println!(
            "✓ Would backfill descending to {} month(s) ago",
            config.backfill.cutoff_months
        ),
        Err(e) => println!("✓ Would backfill descending (cursor unreadable: {})", e),
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics about the dataset
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use comment_harvest::output::{load_statistics, print_statistics};

    println!("Dataset: {}\n", config.output.records_path);

    let stats = load_statistics(&config.output)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --analyze mode: runs the image classification pass
async fn handle_analyze(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let report = run_analysis(config).await?;

    println!("=== Analysis ===\n");
    println!("  Candidates: {}", report.candidates);
    println!("  Without image: {}", report.without_image);
    println!("  Download failures: {}", report.download_failures);
    println!("  Clean: {}", report.clean);
    println!("  Flagged: {}", report.flagged.len());
    for post in &report.flagged {
        println!("    - {} (record {}): {}", post.author, post.record_id, post.image_url);
    }
    println!("  Newly blocked: {}", report.newly_blocked.len());

    if report.interrupted {
        return Err("classifier failed; the pass was interrupted".into());
    }
    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    match run_harvest(config).await {
        Ok(report) => {
            match report.stop {
                StopReason::Exhausted => tracing::info!("Harvest completed, pages exhausted"),
                StopReason::CutoffReached { record_id } => {
                    tracing::info!("Harvest completed, cutoff reached at record {}", record_id)
                }
            }
            tracing::info!(
                "{} run: {} pages fetched, {} records appended",
                report.mode,
                report.pages_fetched,
                report.records_appended
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
