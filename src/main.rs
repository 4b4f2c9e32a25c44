//! # Awful Novel Source CLI
//!
//! Runs a single adapter stage against a site described by a YAML
//! configuration and emits the result as JSON.
//!
//! ## Usage
//!
//! ```sh
//! awful_novel_source -c sites/myblog.yaml search "dragon"
//! awful_novel_source -c sites/myblog.yaml content https://blog.example/novel/dragons-path/1
//! ```
//!
//! Logs go to stderr (`RUST_LOG` controls the level), so stdout carries
//! nothing but the JSON document.

use awful_novel_source::outputs::json;
use awful_novel_source::utils::ensure_writable_dir;
use awful_novel_source::{
    ChapterContent, ContentSource, DetailRecord, HttpFetcher, ListingSummary, PageResult,
    SiteSource, SourceConfig,
};
use clap::Parser;
use serde::Serialize;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;

use cli::{Cli, Command};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    if let Some(dir) = &args.json_output_dir {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "JSON output directory is not writable");
            return Err(e);
        }
    }

    let config = SourceConfig::load(&args.config).await?;
    let fetcher = HttpFetcher::new(
        &args.user_agent,
        &config.language_tag,
        Duration::from_secs(args.timeout_secs),
    )?;
    let source = SiteSource::new(config, fetcher)?;

    let (label, data) = match run(&source, &args.command).await {
        Ok(result) => result,
        Err(e) => {
            error!(
                stage = args.command.kind(),
                transport = e.is_transport(),
                page_shape = e.is_page_shape(),
                error = %e,
                "Stage failed"
            );
            return Err(e.into());
        }
    };

    match &args.json_output_dir {
        Some(dir) => {
            json::write_result(dir, source.name(), args.command.kind(), &label, &data).await?;
        }
        None => println!("{}", json::render(source.name(), args.command.kind(), &data)?),
    }

    let elapsed = start_time.elapsed();
    info!(?elapsed, stage = args.command.kind(), "Execution complete");
    Ok(())
}

/// Result of whichever stage ran.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum StageOutput {
    Listing(Vec<ListingSummary>),
    Detail(DetailRecord),
    Content(Option<ChapterContent>),
    Page(PageResult),
}

/// Run the selected stage; returns the output file label and the result.
async fn run<S: ContentSource>(
    source: &S,
    command: &Command,
) -> awful_novel_source::Result<(String, StageOutput)> {
    let output = match command {
        Command::Search { query } => (
            query.clone(),
            StageOutput::Listing(source.search(query).await?),
        ),
        Command::Load { url } => (
            json::label_for_url(url),
            StageOutput::Detail(source.load(url).await?),
        ),
        Command::Content { url } => (
            json::label_for_url(url),
            StageOutput::Content(source.load_content(url).await?),
        ),
        Command::Page {
            page,
            category,
            order_by,
            tag,
        } => {
            let result = source
                .load_page(
                    *page,
                    category.as_deref(),
                    order_by.as_deref(),
                    tag.as_deref(),
                )
                .await?;
            (page.to_string(), StageOutput::Page(result))
        }
    };
    Ok(output)
}
