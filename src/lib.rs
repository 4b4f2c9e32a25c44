//! # Awful Novel Source
//!
//! A selector-driven source adapter for reading/cataloging applications. One
//! [`SourceConfig`] describes a website; a [`SiteSource`] built from it turns
//! that site's HTML into:
//!
//! - search results and listing pages ([`ListingSummary`], [`PageResult`])
//! - title records with oldest-first chapter lists ([`DetailRecord`])
//! - cleaned chapter bodies ([`ChapterContent`])
//!
//! ## Usage
//!
//! ```ignore
//! use awful_novel_source::{ContentSource, HttpFetcher, SiteSource, SourceConfig};
//! use std::time::Duration;
//!
//! let config = SourceConfig::load("sites/myblog.yaml").await?;
//! let fetcher = HttpFetcher::new("my-reader/1.0", &config.language_tag, Duration::from_secs(30))?;
//! let source = SiteSource::new(config, fetcher)?;
//!
//! let hits = source.search("dragon").await?;
//! let record = source.load(&hits[0].url).await?;
//! let first = source.load_content(&record.chapters()[0].url).await?;
//! ```
//!
//! ## Architecture
//!
//! Each stage is one fetch followed by synchronous extraction:
//! 1. **Fetch**: a [`DocumentFetcher`] returns the parsed document
//! 2. **Extract**: compiled [`extract::Field`]s pull values out of it
//! 3. **Normalize**: links are made absolute, text is whitespace-collapsed,
//!    broken list entries are dropped
//!
//! Transport failures and a missing title on a detail page are the only
//! errors a stage raises on page content; see [`SourceError`].

pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod models;
pub mod outputs;
pub mod source;
pub mod utils;

pub use config::{DetailVariant, SourceConfig};
pub use error::{Result, SourceError};
pub use fetch::{DocumentFetcher, FixtureFetcher, HttpFetcher};
pub use models::{
    ChapterContent, ChapterRef, DetailBody, DetailRecord, DownloadLink, ListingSummary,
    PageResult, Status,
};
pub use source::{ContentSource, SiteSource};
pub use utils::normalize_url;
