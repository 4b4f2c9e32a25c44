//! The adapter contract and its selector-driven implementation.
//!
//! A host programs against [`ContentSource`]. [`SiteSource`] implements it
//! for any site describable by a [`SourceConfig`], with one submodule per
//! stage:
//!
//! | Stage | Module | Input | Output |
//! |-------|--------|-------|--------|
//! | Search | [`search`] | query | `Vec<ListingSummary>` |
//! | Detail | [`detail`] | title URL | `DetailRecord` |
//! | Content | [`content`] | chapter URL | `Option<ChapterContent>` |
//! | Listing | [`listing`] | page + filters | `PageResult` |
//!
//! Every stage is one fetch followed by synchronous extraction. Stages never
//! call each other and share no mutable state, so a `&SiteSource` can serve
//! any number of concurrent calls. Dropping a stage future cancels its fetch.

pub mod content;
pub mod detail;
pub mod listing;
pub mod search;

use crate::config::SourceConfig;
use crate::error::Result;
use crate::extract::CompiledSelectors;
use crate::fetch::DocumentFetcher;
use crate::models::{ChapterContent, DetailRecord, ListingSummary, PageResult};
use std::future::Future;
use tracing::info;

/// The four-stage contract every source adapter implements.
///
/// Stage futures are `Send`, so a host holding an `Arc<impl ContentSource>`
/// can spawn them, e.g. to fetch several chapters at once.
pub trait ContentSource: Send + Sync {
    /// Human-readable source name.
    fn name(&self) -> &str;

    /// Language of the source's content.
    fn language_tag(&self) -> &str;

    /// Whether [`ContentSource::load_page`] is available.
    fn has_main_page(&self) -> bool;

    /// One page of search results for `query`, in site order.
    fn search(&self, query: &str) -> impl Future<Output = Result<Vec<ListingSummary>>> + Send;

    /// Full record for a title URL produced by `search` or `load_page`.
    fn load(&self, url: &str) -> impl Future<Output = Result<DetailRecord>> + Send;

    /// Cleaned body of a chapter URL from a prior `load`; `None` when the
    /// page has no content container.
    fn load_content(
        &self,
        chapter_url: &str,
    ) -> impl Future<Output = Result<Option<ChapterContent>>> + Send;

    /// One page (1-based) of the browsable listing.
    fn load_page(
        &self,
        page: u32,
        category: Option<&str>,
        order_by: Option<&str>,
        tag: Option<&str>,
    ) -> impl Future<Output = Result<PageResult>> + Send;
}

/// A [`ContentSource`] driven entirely by a [`SourceConfig`].
#[derive(Debug)]
pub struct SiteSource<F> {
    name: String,
    config: SourceConfig,
    selectors: CompiledSelectors,
    fetcher: F,
}

impl<F: DocumentFetcher> SiteSource<F> {
    /// Validate `config`, compile its selectors and bind it to `fetcher`.
    pub fn new(config: SourceConfig, fetcher: F) -> Result<Self> {
        config.validate()?;
        let selectors = CompiledSelectors::compile(&config)?;
        let name = config.display_name();
        info!(
            source = %name,
            origin = %config.base_origin,
            lang = %config.language_tag,
            variant = ?config.detail_variant,
            reversed = config.chapter_order_reversed,
            "Source adapter ready"
        );
        Ok(Self {
            name,
            config,
            selectors,
            fetcher,
        })
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }
}

impl<F: DocumentFetcher> ContentSource for SiteSource<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn language_tag(&self) -> &str {
        &self.config.language_tag
    }

    fn has_main_page(&self) -> bool {
        self.config.has_main_page
    }

    async fn search(&self, query: &str) -> Result<Vec<ListingSummary>> {
        search::search(self, query).await
    }

    async fn load(&self, url: &str) -> Result<DetailRecord> {
        detail::load(self, url).await
    }

    async fn load_content(&self, chapter_url: &str) -> Result<Option<ChapterContent>> {
        content::load_content(self, chapter_url).await
    }

    async fn load_page(
        &self,
        page: u32,
        category: Option<&str>,
        order_by: Option<&str>,
        tag: Option<&str>,
    ) -> Result<PageResult> {
        listing::load_page(self, page, category, order_by, tag).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::error::SourceError;
    use crate::fetch::FixtureFetcher;
    use std::sync::Arc;
    use tokio::task::JoinHandle;

    fn spawn_content<S: ContentSource + 'static>(
        source: Arc<S>,
        url: &'static str,
    ) -> JoinHandle<Result<Option<ChapterContent>>> {
        tokio::spawn(async move { source.load_content(url).await })
    }

    #[test]
    fn test_new_exposes_static_configuration() {
        let source = SiteSource::new(test_config(), FixtureFetcher::new()).unwrap();
        assert_eq!(source.name(), "Test Blog");
        assert_eq!(source.language_tag(), "en");
        assert!(source.has_main_page());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = SourceConfig::new("not-a-url", "en");
        let err = SiteSource::new(config, FixtureFetcher::new()).unwrap_err();
        assert!(matches!(err, SourceError::InvalidConfig(_)));
    }

    #[test]
    fn test_new_rejects_bad_selector() {
        let mut config = test_config();
        config.selectors.content = "div..x".to_string();
        let err = SiteSource::new(config, FixtureFetcher::new()).unwrap_err();
        assert!(matches!(err, SourceError::InvalidSelector { ref field, .. } if field == "content"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stages_run_on_spawned_tasks() {
        let fetcher = FixtureFetcher::new()
            .with_page(
                "https://blog.example/c/1",
                r#"<div class="chapter-content"><p>One</p></div>"#,
            )
            .with_page(
                "https://blog.example/c/2",
                r#"<div class="chapter-content"><p>Two</p></div>"#,
            );
        let source = Arc::new(SiteSource::new(test_config(), fetcher).unwrap());

        let first = spawn_content(Arc::clone(&source), "https://blog.example/c/1");
        let second = spawn_content(Arc::clone(&source), "https://blog.example/c/2");
        let first = first.await.unwrap().unwrap().unwrap();
        let second = second.await.unwrap().unwrap().unwrap();
        assert_eq!(first.html, "<p>One</p>");
        assert_eq!(second.html, "<p>Two</p>");
        assert_eq!(source.fetcher().requested().len(), 2);
    }

    #[tokio::test]
    async fn test_transport_errors_pass_through_unmodified() {
        let fetcher = FixtureFetcher::new().with_status("https://blog.example/search?q=x", 502);
        let source = SiteSource::new(test_config(), fetcher).unwrap();
        let err = source.search("x").await.unwrap_err();
        assert!(matches!(err, SourceError::HttpStatus { status: 502, .. }));
        // no retry
        assert_eq!(source.fetcher().requested().len(), 1);
    }
}
