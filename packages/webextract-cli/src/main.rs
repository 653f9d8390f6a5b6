//! Command-line interface for schema-driven web extraction.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use webextract::{
    discover_sitemap_urls, export_outcomes, AnthropicClient, BatchResult, BrowserFetcher,
    Extractor, Fetcher, HttpFetcher, Schema, DEFAULT_CONCURRENCY,
};

/// AI-powered web extraction that returns structured data.
///
/// Describes fields to extract in a JSON schema instead of brittle CSS
/// selectors; a language model fills them in from the page content.
#[derive(Parser)]
#[command(name = "webextract", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract structured data from one or more URLs
    Extract {
        /// Single URL to extract from
        #[arg(long, conflicts_with = "urls")]
        url: Option<String>,

        /// File containing URLs, one per line
        #[arg(long)]
        urls: Option<PathBuf>,

        /// JSON schema file defining the fields to extract
        #[arg(long)]
        schema: PathBuf,

        /// Output file path (.json or .csv)
        #[arg(long)]
        output: PathBuf,

        /// Number of URLs processed in parallel
        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        parallel: usize,

        /// Process URLs one at a time
        #[arg(long, conflicts_with = "parallel")]
        sequential: bool,

        /// Render pages in a headless browser (slower, handles JavaScript)
        #[arg(long)]
        browser: bool,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },

    /// Discover page URLs from a site's sitemap
    Sitemap {
        /// Base URL of the site
        base_url: String,

        /// Maximum number of URLs to print
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Validate a schema file and show its fields
    Schema {
        /// Path to the JSON schema file
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    match Cli::parse().command {
        Command::Extract {
            url,
            urls,
            schema,
            output,
            parallel,
            sequential,
            browser,
            timeout,
        } => {
            extract(
                url, urls, &schema, &output, parallel, sequential, browser, timeout,
            )
            .await
        }
        Command::Sitemap { base_url, limit } => sitemap(&base_url, limit).await,
        Command::Schema { path } => show_schema(&path),
    }
}

#[allow(clippy::too_many_arguments)]
async fn extract(
    url: Option<String>,
    urls_file: Option<PathBuf>,
    schema_path: &Path,
    output: &Path,
    parallel: usize,
    sequential: bool,
    browser: bool,
    timeout: u64,
) -> Result<()> {
    let urls = match (url, urls_file) {
        (Some(url), None) => vec![url],
        (None, Some(path)) => read_url_file(&path)?,
        (None, None) => bail!("provide either --url or --urls"),
        (Some(_), Some(_)) => unreachable!("clap rejects --url with --urls"),
    };
    if urls.is_empty() {
        bail!("no URLs to extract from");
    }

    let schema = Schema::load(schema_path)
        .with_context(|| format!("failed to load schema {}", schema_path.display()))?;
    let model = AnthropicClient::from_env()
        .context("ANTHROPIC_API_KEY not set; add it to the environment or a .env file")?;

    println!("\n{}", "Extraction".bold());
    println!("URLs: {}", urls.len());
    println!("Schema: {}", schema_path.display());
    println!("Browser: {}", if browser { "yes" } else { "no" });
    println!("Parallel: {}\n", if sequential { 1 } else { parallel });

    let timeout = Duration::from_secs(timeout);
    let batch = if browser {
        run_batch(BrowserFetcher::new(timeout), model, &urls, &schema, parallel, sequential).await
    } else {
        let fetcher = HttpFetcher::new(timeout).context("failed to build HTTP client")?;
        run_batch(fetcher, model, &urls, &schema, parallel, sequential).await
    };

    print_summary(&batch);

    export_outcomes(&batch, output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("\n{}", format!("Results saved to {}", output.display()).green().bold());

    if let Some(record) = batch.successes().next() {
        println!("\n{}", "Preview (first result):".bold());
        print_record_fields(record.fields());
    }

    Ok(())
}

async fn run_batch<F: Fetcher>(
    fetcher: F,
    model: AnthropicClient,
    urls: &[String],
    schema: &Schema,
    parallel: usize,
    sequential: bool,
) -> BatchResult {
    let mut extractor = Extractor::new(fetcher, model).with_concurrency(parallel);
    if sequential {
        extractor = extractor.sequential();
    }
    extractor.extract_batch(urls, schema).await
}

fn print_summary(batch: &BatchResult) {
    println!("{}", format!("✓ {} successful", batch.success_count()).green().bold());
    if batch.failure_count() > 0 {
        println!("{}", format!("✗ {} failed", batch.failure_count()).red().bold());

        println!("\n{}", "Errors:".bold());
        let failures: Vec<_> = batch.failures().collect();
        for failure in failures.iter().take(5) {
            println!("  {} {}: {}", "•".red(), failure.url, failure.error);
        }
        if failures.len() > 5 {
            println!("  ... and {} more", failures.len() - 5);
        }
    }
}

fn print_record_fields(fields: &serde_json::Map<String, Value>) {
    for (key, value) in fields {
        if key == "source" {
            continue;
        }
        let rendered = match value {
            Value::String(s) => s.clone(),
            Value::Array(_) | Value::Object(_) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            other => other.to_string(),
        };
        println!("  {}: {}", key.cyan(), rendered);
    }
}

async fn sitemap(base_url: &str, limit: Option<usize>) -> Result<()> {
    let urls = discover_sitemap_urls(base_url, limit)
        .await
        .with_context(|| format!("failed to probe sitemaps for {base_url}"))?;

    if urls.is_empty() {
        println!("{}", "No sitemap URLs found.".yellow());
        return Ok(());
    }
    for url in &urls {
        println!("{url}");
    }
    eprintln!("{}", format!("{} URLs", urls.len()).bold());
    Ok(())
}

fn show_schema(path: &Path) -> Result<()> {
    let schema = Schema::load(path)
        .with_context(|| format!("failed to load schema {}", path.display()))?;

    println!("\n{}\n", format!("{} ({} fields):", path.display(), schema.len()).bold());
    for (name, field_type) in schema.fields() {
        println!("  {}: {}", name.cyan(), field_type);
    }
    Ok(())
}

fn read_url_file(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}
