//! Per-adapter configuration.
//!
//! A [`SourceConfig`] is everything that distinguishes one site from another:
//! the origin, the URL templates, the chapter ordering flag, what to strip from
//! chapter bodies and a map from semantic field name to CSS selector. The stage
//! algorithms in [`crate::source`] contain no site knowledge at all.
//!
//! Configurations are usually written as YAML:
//!
//! ```yaml
//! name: My Blog
//! base_origin: https://blog.example
//! language_tag: en
//! search_path_template: /search?q={query}
//! listing_path_template: /latest-updates?page={page}
//! chapter_order_reversed: true
//! content_exclusion_selectors: [".ads", "script", "style", ".hidden-content"]
//! selectors:
//!   detail:
//!     title: h1.entry-title
//!     chapter: .chapter-list li a
//!   next_page: a.next
//! ```
//!
//! Omitted keys fall back to the defaults documented on each field.

use crate::error::{Result, SourceError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument};
use url::Url;

static LANGUAGE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{2,3}(-[A-Za-z0-9]{1,8})*$").unwrap());

const QUERY_PLACEHOLDER: &str = "{query}";
const PAGE_PLACEHOLDER: &str = "{page}";

/// Which reading material a detail page yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailVariant {
    /// Per-chapter HTML pages read through the content stage.
    #[default]
    Chapters,
    /// Whole-work downloads linked from the detail page.
    Bundle,
}

/// Selectors for one kind of result list (search results or a listing page).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarySelectors {
    /// One node per result.
    pub item: String,
    /// Anchor inside `item`; its text is the title and its `href` the URL.
    pub title_link: String,
    /// Image inside `item` (`src`, falling back to `data-src`).
    #[serde(default)]
    pub poster: Option<String>,
    /// Latest chapter label inside `item`.
    #[serde(default)]
    pub latest_chapter: Option<String>,
}

impl SummarySelectors {
    fn search_defaults() -> Self {
        Self {
            item: "div.search-result-item".to_string(),
            title_link: "h3 > a".to_string(),
            poster: Some("img.poster".to_string()),
            latest_chapter: Some(".latest-chapter".to_string()),
        }
    }

    fn listing_defaults() -> Self {
        Self {
            item: "div.latest-item".to_string(),
            title_link: "h3 > a".to_string(),
            poster: Some("img.poster".to_string()),
            latest_chapter: None,
        }
    }
}

/// Selectors evaluated against a detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailSelectors {
    pub title: String,
    pub author: Option<String>,
    pub poster: Option<String>,
    pub synopsis: Option<String>,
    /// Every match becomes one tag.
    pub tags: Option<String>,
    pub status: Option<String>,
    /// Chapter anchors, in document order.
    pub chapter: String,
    /// Release date, searched inside each chapter anchor's parent element.
    pub chapter_date: Option<String>,
    /// Download anchors for [`DetailVariant::Bundle`] sources.
    pub bundle_link: String,
}

impl Default for DetailSelectors {
    fn default() -> Self {
        Self {
            title: "h1.entry-title".to_string(),
            author: Some(".author-name".to_string()),
            poster: Some("img.novel-poster".to_string()),
            synopsis: Some(".novel-summary".to_string()),
            tags: Some(".novel-tags a".to_string()),
            status: Some(".novel-status".to_string()),
            chapter: ".chapter-list li a".to_string(),
            chapter_date: Some(".release-date".to_string()),
            bundle_link: "a.pdf-download-link".to_string(),
        }
    }
}

/// The full selector map of a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub search: SummarySelectors,
    pub listing: SummarySelectors,
    pub detail: DetailSelectors,
    /// The single node holding a chapter's body.
    pub content: String,
    /// "Next page" affordance on listing pages.
    pub next_page: Option<String>,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            search: SummarySelectors::search_defaults(),
            listing: SummarySelectors::listing_defaults(),
            detail: DetailSelectors::default(),
            content: "div.chapter-content".to_string(),
            next_page: Some("a.next, a[rel=next]".to_string()),
        }
    }
}

/// Query parameter names used for listing filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    pub category: String,
    pub order_by: String,
    pub tag: String,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            category: "category".to_string(),
            order_by: "orderBy".to_string(),
            tag: "tag".to_string(),
        }
    }
}

fn default_search_path_template() -> String {
    "/search?q={query}".to_string()
}

fn default_listing_path_template() -> String {
    "/latest-updates?page={page}".to_string()
}

fn default_true() -> bool {
    true
}

fn default_exclusions() -> Vec<String> {
    [".ads", "script", "style", ".hidden-content"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Complete, static configuration of one adapter instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Display name; defaults to the origin's host.
    #[serde(default)]
    pub name: Option<String>,
    /// Scheme and host every relative path is appended to, e.g. `https://blog.example`.
    pub base_origin: String,
    /// BCP-47 style language tag of the site's content, e.g. `en` or `pt-BR`.
    pub language_tag: String,
    /// Path (and query) of the search page; must contain `{query}`.
    #[serde(default = "default_search_path_template")]
    pub search_path_template: String,
    /// Path (and query) of a listing page; must contain `{page}`.
    #[serde(default = "default_listing_path_template")]
    pub listing_path_template: String,
    /// The site lists chapters newest first, so they must be reversed.
    #[serde(default = "default_true")]
    pub chapter_order_reversed: bool,
    /// Removed from chapter bodies at any depth.
    #[serde(default = "default_exclusions")]
    pub content_exclusion_selectors: Vec<String>,
    /// Whether the site has a browsable listing at all.
    #[serde(default = "default_true")]
    pub has_main_page: bool,
    #[serde(default)]
    pub detail_variant: DetailVariant,
    #[serde(default)]
    pub filter_params: FilterParams,
    /// A listing page holding this many items is taken to have a successor.
    #[serde(default)]
    pub page_size: Option<usize>,
    #[serde(default)]
    pub selectors: Selectors,
}

impl SourceConfig {
    /// A configuration with every optional setting at its default.
    pub fn new(base_origin: impl Into<String>, language_tag: impl Into<String>) -> Self {
        Self {
            name: None,
            base_origin: base_origin.into(),
            language_tag: language_tag.into(),
            search_path_template: default_search_path_template(),
            listing_path_template: default_listing_path_template(),
            chapter_order_reversed: true,
            content_exclusion_selectors: default_exclusions(),
            has_main_page: true,
            detail_variant: DetailVariant::default(),
            filter_params: FilterParams::default(),
            page_size: None,
            selectors: Selectors::default(),
        }
    }

    /// Parse and validate a YAML configuration.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML configuration file.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let yaml = tokio::fs::read_to_string(path.as_ref()).await?;
        let config = Self::from_yaml_str(&yaml)?;
        info!(source = %config.display_name(), "Loaded source configuration");
        Ok(config)
    }

    /// Check everything that can be checked without compiling selectors.
    pub fn validate(&self) -> Result<()> {
        let origin = Url::parse(&self.base_origin).map_err(|e| {
            SourceError::InvalidConfig(format!("base_origin {:?}: {e}", self.base_origin))
        })?;
        if !matches!(origin.scheme(), "http" | "https") || !origin.has_host() {
            return Err(SourceError::InvalidConfig(format!(
                "base_origin {:?} must be an http(s) URL with a host",
                self.base_origin
            )));
        }
        if !LANGUAGE_TAG.is_match(&self.language_tag) {
            return Err(SourceError::InvalidConfig(format!(
                "language_tag {:?} is not a language tag",
                self.language_tag
            )));
        }
        if !self.search_path_template.contains(QUERY_PLACEHOLDER) {
            return Err(SourceError::InvalidConfig(format!(
                "search_path_template must contain {QUERY_PLACEHOLDER}"
            )));
        }
        if !self.listing_path_template.contains(PAGE_PLACEHOLDER) {
            return Err(SourceError::InvalidConfig(format!(
                "listing_path_template must contain {PAGE_PLACEHOLDER}"
            )));
        }
        if self.page_size == Some(0) {
            return Err(SourceError::InvalidConfig(
                "page_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Configured name, or the origin's host.
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            Url::parse(&self.base_origin)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string))
                .unwrap_or_else(|| self.base_origin.clone())
        })
    }

    /// Search URL for `query` (percent-encoded into the template).
    pub fn search_url(&self, query: &str) -> Result<String> {
        let path = self
            .search_path_template
            .replace(QUERY_PLACEHOLDER, &urlencoding::encode(query));
        Ok(self.join_origin(&path)?.to_string())
    }

    /// Listing URL for `page`; each present filter becomes one query pair.
    pub fn listing_url(
        &self,
        page: u32,
        category: Option<&str>,
        order_by: Option<&str>,
        tag: Option<&str>,
    ) -> Result<String> {
        let path = self
            .listing_path_template
            .replace(PAGE_PLACEHOLDER, &page.to_string());
        let mut url = self.join_origin(&path)?;

        let filters = [
            (&self.filter_params.category, category),
            (&self.filter_params.order_by, order_by),
            (&self.filter_params.tag, tag),
        ];
        if filters.iter().any(|(_, value)| value.is_some()) {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in filters {
                if let Some(value) = value {
                    pairs.append_pair(name, value);
                }
            }
        }
        Ok(url.to_string())
    }

    fn join_origin(&self, path: &str) -> Result<Url> {
        let origin = self.base_origin.trim_end_matches('/');
        let full = if path.starts_with('/') {
            format!("{origin}{path}")
        } else {
            format!("{origin}/{path}")
        };
        Url::parse(&full).map_err(|e| SourceError::InvalidConfig(format!("{full:?}: {e}")))
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> SourceConfig {
    let mut config = SourceConfig::new("https://blog.example", "en");
    config.name = Some("Test Blog".to_string());
    config
}
