//! Command-line interface definitions for the source adapter tool.
//!
//! The tool runs one stage against a site described by a YAML configuration
//! and prints (or writes) the JSON result. It is meant for authoring and
//! checking site configurations.

use awful_novel_source::fetch::DEFAULT_USER_AGENT;
use clap::{Parser, Subcommand};

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// awful_novel_source -c sites/myblog.yaml search "dragon"
/// awful_novel_source -c sites/myblog.yaml load https://blog.example/novel/dragons-path
/// awful_novel_source -c sites/myblog.yaml page --page 2 --category fantasy -j ./json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the source's YAML configuration
    #[arg(short, long, env = "SOURCE_CONFIG")]
    pub config: String,

    /// Write results as JSON files under this directory instead of printing them
    #[arg(short, long)]
    pub json_output_dir: Option<String>,

    /// User agent sent with every request
    #[arg(long, env = "SOURCE_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

/// The stage to run.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Search the source for titles
    Search { query: String },

    /// Load a title's details and chapter list
    Load { url: String },

    /// Load the cleaned body of one chapter
    Content { url: String },

    /// Load one page of the source's listing
    Page {
        /// 1-based page number
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        order_by: Option<String>,

        #[arg(long)]
        tag: Option<String>,
    },
}

impl Command {
    /// Short name used in output file names and the JSON envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Search { .. } => "search",
            Self::Load { .. } => "detail",
            Self::Content { .. } => "content",
            Self::Page { .. } => "page",
        }
    }
}
