//! Sumi-Scroll main entry point
//!
//! This is the command-line interface for the Sumi-Scroll novel harvester.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use sumi_scroll::config::{load_config_with_hash, validate, Config};
use sumi_scroll::output::write_artifact;
use sumi_scroll::{CrawlJob, NovelCrawler, ScrollError};
use tracing_subscriber::EnvFilter;

/// Sumi-Scroll: A patient serialized-novel harvester
///
/// Sumi-Scroll finds every chapter listed on a web novel's table-of-contents
/// page, downloads them in small polite batches, and stitches them into one
/// text file in reading order.
#[derive(Parser, Debug)]
#[command(name = "sumi-scroll")]
#[command(version = "1.0.0")]
#[command(about = "A patient serialized-novel harvester", long_about = None)]
struct Cli {
    /// Path to an optional TOML configuration file
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a table-of-contents URL without downloading chapters
    Probe {
        /// Table-of-contents URL
        url: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download every chapter and assemble the novel
    Crawl {
        /// Table-of-contents URL
        url: String,

        /// Novel name, used for the output file name
        #[arg(short, long)]
        name: String,

        /// Chapter downloads in flight at once (1-10)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Chapters per batch (10-100)
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Directory for the output file (overrides the config file)
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Print the assembled text instead of writing a file
        #[arg(long, conflicts_with = "output_dir")]
        stdout: bool,

        /// Print the result as JSON
        #[arg(long, conflicts_with = "stdout")]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_configuration(cli.config.as_deref())?;
    let crawler = NovelCrawler::new(config).context("failed to build the crawler")?;

    match cli.command {
        Command::Probe { url, json } => handle_probe(&crawler, &url, json).await,
        Command::Crawl {
            url,
            name,
            concurrency,
            chunk_size,
            output_dir,
            stdout,
            json,
        } => {
            let job = CrawlJob::with_config(
                &url,
                &name,
                concurrency,
                chunk_size,
                &crawler.config().crawler,
            )?;
            let output = if stdout {
                CrawlOutput::Stdout
            } else {
                CrawlOutput::Directory(
                    output_dir
                        .unwrap_or_else(|| PathBuf::from(&crawler.config().output.directory)),
                )
            };
            handle_crawl(&crawler, &job, output, json).await
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so `--stdout` and `--json` output stays clean.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_scroll=info,warn"),
            1 => EnvFilter::new("sumi_scroll=debug,info"),
            2 => EnvFilter::new("sumi_scroll=trace,debug"),
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

/// Loads the configuration file when one is given, else the defaults
fn load_configuration(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::debug!("No configuration file given, using defaults");
        let config = Config::default();
        validate(&config)?;
        return Ok(config);
    };

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

/// Handles the probe subcommand
async fn handle_probe(crawler: &NovelCrawler, url: &str, json: bool) -> anyhow::Result<()> {
    let report = match crawler.probe(url).await {
        Ok(report) => report,
        Err(e) => return report_failure(e, json),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("URL: {}", report.base_url);
    println!(
        "Novel: {}",
        report.novel_name.as_deref().unwrap_or("(unknown)")
    );
    match report.chapter_count {
        Some(count) => println!("Chapters: {}", count),
        None => println!("Chapters: (none found)"),
    }
    if let (Some(first), Some(last)) = (&report.first_chapter, &report.last_chapter) {
        println!("First: {}", first);
        println!("Last: {}", last);
    }
    if let Some(note) = &report.note {
        println!("Note: {}", note);
    }

    Ok(())
}

/// Where the assembled novel goes
enum CrawlOutput {
    Stdout,
    Directory(PathBuf),
}

/// Handles the crawl subcommand
async fn handle_crawl(
    crawler: &NovelCrawler,
    job: &CrawlJob,
    output: CrawlOutput,
    json: bool,
) -> anyhow::Result<()> {
    let result = match crawler.crawl(job).await {
        Ok(result) => result,
        Err(e) => return report_failure(e, json),
    };

    let directory = match output {
        CrawlOutput::Stdout => {
            print!("{}", result.content);
            return Ok(());
        }
        CrawlOutput::Directory(directory) => directory,
    };

    let path = write_artifact(&result, &directory)
        .with_context(|| format!("failed to write into {}", directory.display()))?;

    if json {
        let summary = serde_json::json!({
            "downloadPath": path,
            "filename": result.filename,
            "succeeded": result.succeeded,
            "failed": result.failed,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "✓ {} chapters saved to {} ({} failed)",
            result.succeeded,
            path.display(),
            result.failed
        );
    }

    Ok(())
}

/// Reports a failed probe or crawl, as `{"error", "kind"}` JSON when asked
///
/// Always returns the error so `main` exits non-zero.
fn report_failure(error: ScrollError, json: bool) -> anyhow::Result<()> {
    tracing::error!("Failed ({}): {}", error.kind(), error);

    if json {
        let body = serde_json::json!({
            "error": error.to_string(),
            "kind": error.kind(),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    }

    Err(error.into())
}
