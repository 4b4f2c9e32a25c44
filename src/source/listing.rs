//! Listing stage: one page of the site's browsable catalogue.
//!
//! `has_more` comes from the fetched document alone: a matching "next page"
//! node, or (when `page_size` is configured) a page holding at least a full
//! page of items. The page number never implies a successor.

use super::SiteSource;
use crate::config::SourceConfig;
use crate::error::{Result, SourceError};
use crate::extract::CompiledSelectors;
use crate::fetch::DocumentFetcher;
use crate::models::PageResult;
use scraper::Html;
use tracing::{debug, info, instrument};

/// Fetch one page of the listing.
///
/// # Arguments
///
/// * `source` - The adapter whose configuration and fetcher are used
/// * `page` - 1-based page number
/// * `category`, `order_by`, `tag` - Optional filters; blank values are omitted
///
/// # Returns
///
/// The page's summaries and whether the document points at a next page.
/// `Unsupported` when the source has no listing, `InvalidArgument` for page 0.
#[instrument(level = "info", skip(source), fields(site = %source.name))]
pub(super) async fn load_page<F: DocumentFetcher>(
    source: &SiteSource<F>,
    page: u32,
    category: Option<&str>,
    order_by: Option<&str>,
    tag: Option<&str>,
) -> Result<PageResult> {
    if !source.config.has_main_page {
        return Err(SourceError::Unsupported("listing pages"));
    }
    if page < 1 {
        return Err(SourceError::InvalidArgument(
            "listing pages start at 1".to_string(),
        ));
    }

    let url = source.config.listing_url(
        page,
        present(category),
        present(order_by),
        present(tag),
    )?;
    debug!(%url, "Fetching listing page");
    let document = source.fetcher.fetch_document(&url).await?;

    let result = parse_page(&source.config, &source.selectors, &document, url);
    info!(
        count = result.items.len(),
        has_more = result.has_more,
        "Parsed listing page"
    );
    Ok(result)
}

/// Blank filters are treated as absent.
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Build a page result from an already fetched listing document at `url`.
pub(crate) fn parse_page(
    config: &SourceConfig,
    selectors: &CompiledSelectors,
    document: &Html,
    url: String,
) -> PageResult {
    let root = document.root_element();
    let (items, dropped) = selectors.listing.extract(root, &url);

    let next_link = selectors
        .next_page
        .as_ref()
        .is_some_and(|sel| root.select(sel).next().is_some());
    let containers = root.select(&selectors.listing.item).count();
    let full_page = config.page_size.is_some_and(|size| containers >= size);
    debug!(dropped, containers, next_link, full_page, "Listing pagination signals");

    PageResult {
        url,
        items,
        has_more: next_link || full_page,
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_config;
    use crate::error::SourceError;
    use crate::fetch::FixtureFetcher;
    use crate::source::{ContentSource, SiteSource};

    const PAGE_1: &str = "https://blog.example/latest-updates?page=1";

    fn listing(items: usize, next: bool) -> String {
        let mut html = String::from("<html><body>");
        for i in 1..=items {
            html.push_str(&format!(
                r#"<div class="latest-item"><img class="poster" src="/c/{i}.jpg"><h3><a href="/novel/{i}">Novel {i}</a></h3></div>"#
            ));
        }
        html.push_str(r#"<div class="latest-item"><h3>Broken, no anchor</h3></div>"#);
        if next {
            html.push_str(r#"<a class="next" href="?page=2">Next</a>"#);
        }
        html.push_str("</body></html>");
        html
    }

    fn source_for(url: &str, html: String) -> SiteSource<FixtureFetcher> {
        SiteSource::new(test_config(), FixtureFetcher::new().with_page(url, html)).unwrap()
    }

    #[tokio::test]
    async fn test_load_page_has_more_with_next_link() {
        let source = source_for(PAGE_1, listing(3, true));
        let page = source.load_page(1, None, None, None).await.unwrap();
        assert!(page.has_more);
        assert_eq!(page.url, PAGE_1);
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.items[0].title, "Novel 1");
        assert_eq!(page.items[0].url, "https://blog.example/novel/1");
        assert_eq!(
            page.items[2].poster_url.as_deref(),
            Some("https://blog.example/c/3.jpg")
        );
    }

    #[tokio::test]
    async fn test_load_page_no_more_without_next_link() {
        let source = source_for(PAGE_1, listing(3, false));
        let page = source.load_page(1, None, None, None).await.unwrap();
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_has_more_ignores_page_number() {
        let url = "https://blog.example/latest-updates?page=7";
        let source = source_for(url, listing(2, false));
        assert!(!source.load_page(7, None, None, None).await.unwrap().has_more);
    }

    #[tokio::test]
    async fn test_has_more_from_full_page_size() {
        let mut config = test_config();
        config.selectors.next_page = None;
        config.page_size = Some(4);
        // 3 valid items + 1 broken container fill a page of 4.
        let fetcher = FixtureFetcher::new().with_page(PAGE_1, listing(3, false));
        let source = SiteSource::new(config.clone(), fetcher).unwrap();
        assert!(source.load_page(1, None, None, None).await.unwrap().has_more);

        config.page_size = Some(5);
        let fetcher = FixtureFetcher::new().with_page(PAGE_1, listing(3, true));
        let source = SiteSource::new(config, fetcher).unwrap();
        assert!(!source.load_page(1, None, None, None).await.unwrap().has_more);
    }

    #[tokio::test]
    async fn test_load_page_filters_in_url() {
        let url = "https://blog.example/latest-updates?page=2&category=fantasy&orderBy=new";
        let source = source_for(url, listing(1, false));
        let page = source
            .load_page(2, Some("fantasy"), Some("new"), Some("  "))
            .await
            .unwrap();
        assert_eq!(page.url, url);
        assert_eq!(source.fetcher().requested(), vec![url]);
    }

    #[tokio::test]
    async fn test_load_page_tolerates_unclosed_tags() {
        let html = r#"<html><body>
            <div class="latest-item"><h3><a href="/novel/1">Novel 1</h3>
            <div class="latest-item"><h3><a href="/novel/2">Novel 2
            <a class="next" href="?page=2">Next"#;
        let source = source_for(PAGE_1, html.to_string());
        let page = source.load_page(1, None, None, None).await.unwrap();
        assert!(!page.items.is_empty());
        assert_eq!(page.items[0].url, "https://blog.example/novel/1");
        assert!(page.has_more);
    }

    #[tokio::test]
    async fn test_load_page_rejects_page_zero() {
        let source = source_for(PAGE_1, listing(1, false));
        let err = source.load_page(0, None, None, None).await.unwrap_err();
        assert!(matches!(err, SourceError::InvalidArgument(_)));
        assert!(source.fetcher().requested().is_empty());
    }

    #[tokio::test]
    async fn test_load_page_unsupported_without_main_page() {
        let mut config = test_config();
        config.has_main_page = false;
        let source = SiteSource::new(config, FixtureFetcher::new()).unwrap();
        let err = source.load_page(1, None, None, None).await.unwrap_err();
        assert!(matches!(err, SourceError::Unsupported(_)));
    }
}
