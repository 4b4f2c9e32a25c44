//! Detail stage: title URL to a full [`DetailRecord`].
//!
//! The title is the only mandatory field. Chapters (or bundle downloads) are
//! collected in document order, stripped of anchors without a resolvable URL,
//! de-duplicated by URL and then flipped when the source is configured as
//! newest-first. Ordering is never guessed from the content.

use super::SiteSource;
use crate::config::{DetailVariant, SourceConfig};
use crate::error::{Result, SourceError};
use crate::extract::{DetailFields, Extractor, Field};
use crate::fetch::DocumentFetcher;
use crate::models::{ChapterRef, DetailBody, DetailRecord, DownloadLink, Status};
use crate::utils::{clean_text, is_absolute_web_url};
use itertools::Itertools;
use scraper::{ElementRef, Html};
use tracing::{debug, info, instrument};
use url::Url;

/// Fetch and parse the detail page of one title.
///
/// # Arguments
///
/// * `source` - The adapter whose configuration and fetcher are used
/// * `url` - Absolute URL of the title, as produced by search or listing
///
/// # Returns
///
/// The parsed record, `InvalidArgument` for a non-absolute URL (nothing is
/// fetched), or `MandatoryFieldMissing` when the page has no title.
#[instrument(level = "info", skip(source), fields(site = %source.name))]
pub(super) async fn load<F: DocumentFetcher>(
    source: &SiteSource<F>,
    url: &str,
) -> Result<DetailRecord> {
    if !is_absolute_web_url(url) {
        return Err(SourceError::InvalidArgument(format!(
            "detail URL {url:?} is not an absolute http(s) URL"
        )));
    }

    let document = source.fetcher.fetch_document(url).await?;
    let record = parse_detail(&source.config, &source.selectors.detail, &document, url)?;
    info!(
        title = %record.title,
        chapters = record.chapters().len(),
        downloads = record.downloads().len(),
        tags = record.tags.len(),
        "Parsed detail page"
    );
    Ok(record)
}

/// Build a record from an already fetched detail page at `url`.
pub(crate) fn parse_detail(
    config: &SourceConfig,
    fields: &DetailFields,
    document: &Html,
    url: &str,
) -> Result<DetailRecord> {
    let root = document.root_element();
    let title = fields
        .title
        .first(root, url)
        .ok_or_else(|| SourceError::MandatoryFieldMissing {
            field: "title",
            url: url.to_string(),
        })?;

    let optional = |field: &Option<Field>| {
        field.as_ref().and_then(|f| f.first(root, url))
    };

    let body = match config.detail_variant {
        DetailVariant::Chapters => DetailBody::Chapters(oldest_first(
            chapters(fields, root, url),
            config.chapter_order_reversed,
        )),
        DetailVariant::Bundle => DetailBody::Bundle(oldest_first(
            bundle_links(fields, root, url),
            config.chapter_order_reversed,
        )),
    };

    Ok(DetailRecord {
        title,
        canonical_url: url.to_string(),
        author: optional(&fields.author),
        poster_url: optional(&fields.poster),
        synopsis: optional(&fields.synopsis),
        tags: fields
            .tags
            .as_ref()
            .map(|f| f.all(root, url))
            .unwrap_or_default(),
        status: optional(&fields.status).map(|label| Status::from_label(&label)),
        body,
    })
}

fn chapters(fields: &DetailFields, root: ElementRef<'_>, base: &str) -> Vec<ChapterRef> {
    let found: Vec<ChapterRef> = root
        .select(&fields.chapter)
        .filter_map(|anchor| {
            let Some(url) = Extractor::Link.apply(anchor, base) else {
                debug!(href = ?anchor.value().attr("href"), "Dropping chapter anchor without URL");
                return None;
            };
            let release_date = fields.chapter_date.as_ref().and_then(|date| {
                anchor
                    .parent()
                    .and_then(ElementRef::wrap)
                    .and_then(|parent| date.first(parent, base))
            });
            Some(ChapterRef {
                label: anchor_label(anchor, &url),
                url,
                release_date,
            })
        })
        .collect();
    dedupe(found, |c| url_key(&c.url))
}

fn bundle_links(fields: &DetailFields, root: ElementRef<'_>, base: &str) -> Vec<DownloadLink> {
    let found: Vec<DownloadLink> = root
        .select(&fields.bundle_link)
        .filter_map(|anchor| {
            let url = Extractor::Link.apply(anchor, base)?;
            Some(DownloadLink {
                label: anchor_label(anchor, &url),
                url,
            })
        })
        .collect();
    dedupe(found, |d| url_key(&d.url))
}

/// Anchor text, else its `title` attribute, else the URL itself.
fn anchor_label(anchor: ElementRef<'_>, url: &str) -> String {
    Extractor::Text
        .apply(anchor, url)
        .or_else(|| anchor.value().attr("title").and_then(clean_text))
        .unwrap_or_else(|| url.to_string())
}

/// Comparison form of a URL: host case and default ports don't make a
/// different chapter. The emitted URL keeps its original spelling.
fn url_key(url: &str) -> String {
    Url::parse(url).map(String::from).unwrap_or_else(|_| url.to_string())
}

/// Keep the first occurrence of every URL.
fn dedupe<T>(items: Vec<T>, key: impl FnMut(&T) -> String) -> Vec<T> {
    let before = items.len();
    let unique: Vec<T> = items.into_iter().unique_by(key).collect();
    if unique.len() < before {
        debug!(duplicates = before - unique.len(), "Dropped duplicate links");
    }
    unique
}

fn oldest_first<T>(mut items: Vec<T>, reversed: bool) -> Vec<T> {
    if reversed {
        items.reverse();
    }
    items
}

#[cfg(test)]
mod tests {
    use crate::config::{DetailVariant, test_config};
    use crate::error::SourceError;
    use crate::fetch::FixtureFetcher;
    use crate::models::Status;
    use crate::source::{ContentSource, SiteSource};

    const URL: &str = "https://blog.example/novel/dragons-path";

    const NEWEST_FIRST: &str = r#"
<html><body>
  <h1 class="entry-title"> Dragon's Path </h1>
  <span class="author-name">A. Writer</span>
  <img class="novel-poster" src="/covers/dragons-path.jpg">
  <div class="novel-summary"><p>A long road.</p></div>
  <div class="novel-tags"><a>Fantasy</a><a>Adventure</a></div>
  <span class="novel-status">Ongoing</span>
  <ul class="chapter-list">
    <li><a href="/novel/dragons-path/3">Chapter 3</a><span class="release-date">2024-03-01</span></li>
    <li><a href="/novel/dragons-path/2">Chapter 2</a></li>
    <li><a href="/novel/dragons-path/1">Chapter 1</a></li>
  </ul>
</body></html>"#;

    fn source_with(html: &str, reversed: bool) -> SiteSource<FixtureFetcher> {
        let mut config = test_config();
        config.chapter_order_reversed = reversed;
        SiteSource::new(config, FixtureFetcher::new().with_page(URL, html)).unwrap()
    }

    #[tokio::test]
    async fn test_load_reverses_newest_first_listing() {
        let record = source_with(NEWEST_FIRST, true).load(URL).await.unwrap();
        let chapters = record.chapters();
        assert_eq!(chapters.len(), 3);
        assert_eq!(chapters[0].label, "Chapter 1");
        assert_eq!(chapters[2].label, "Chapter 3");
        assert_eq!(chapters[0].url, "https://blog.example/novel/dragons-path/1");
        assert_eq!(chapters[2].release_date.as_deref(), Some("2024-03-01"));
        assert_eq!(chapters[0].release_date, None);
    }

    #[tokio::test]
    async fn test_load_keeps_order_when_not_reversed() {
        let record = source_with(NEWEST_FIRST, false).load(URL).await.unwrap();
        let labels: Vec<_> = record.chapters().iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Chapter 3", "Chapter 2", "Chapter 1"]);
    }

    #[tokio::test]
    async fn test_load_extracts_metadata() {
        let record = source_with(NEWEST_FIRST, true).load(URL).await.unwrap();
        assert_eq!(record.title, "Dragon's Path");
        assert_eq!(record.canonical_url, URL);
        assert_eq!(record.author.as_deref(), Some("A. Writer"));
        assert_eq!(
            record.poster_url.as_deref(),
            Some("https://blog.example/covers/dragons-path.jpg")
        );
        assert_eq!(record.synopsis.as_deref(), Some("A long road."));
        assert_eq!(record.tags, vec!["Fantasy", "Adventure"]);
        assert_eq!(record.status, Some(Status::Ongoing));
    }

    #[tokio::test]
    async fn test_load_optional_fields_absent() {
        let html = r#"<h1 class="entry-title">Bare</h1>"#;
        let record = source_with(html, true).load(URL).await.unwrap();
        assert_eq!(record.title, "Bare");
        assert_eq!(record.author, None);
        assert_eq!(record.poster_url, None);
        assert_eq!(record.synopsis, None);
        assert!(record.tags.is_empty());
        assert_eq!(record.status, None);
        assert!(record.chapters().is_empty());
    }

    #[tokio::test]
    async fn test_load_drops_invalid_and_duplicate_chapters() {
        // 4 valid anchors, 3 without a resolvable URL, 1 duplicate.
        let html = r#"
<h1 class="entry-title">Dragon's Path</h1>
<ul class="chapter-list">
  <li><a href="/c/4">Chapter 4</a></li>
  <li><a>Chapter 3.5 (locked)</a></li>
  <li><a href="/c/3">Chapter 3</a></li>
  <li><a href="">Teaser</a></li>
  <li><a href="/c/2">Chapter 2</a></li>
  <li><a href="javascript:void(0)">Chapter 1.5</a></li>
  <li><a href="https://blog.example/c/2">Chapter 2 (mirror)</a></li>
  <li><a href="c/1" title="Chapter 1"></a></li>
</ul>"#;
        let record = source_with(html, true).load(URL).await.unwrap();
        let chapters = record.chapters();
        let urls: Vec<_> = chapters.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://blog.example/novel/c/1",
                "https://blog.example/c/2",
                "https://blog.example/c/3",
                "https://blog.example/c/4",
            ]
        );
        assert_eq!(chapters[0].label, "Chapter 1");
        assert_eq!(chapters[1].label, "Chapter 2");
    }

    #[tokio::test]
    async fn test_load_dedupes_equivalent_spellings_of_one_url() {
        let html = r#"
<h1 class="entry-title">Dragon's Path</h1>
<ul class="chapter-list">
  <li><a href="/c/3">Chapter 3</a></li>
  <li><a href="https://blog.example:443/c/2">Chapter 2</a></li>
  <li><a href="https://BLOG.example/c/2">Chapter 2 (again)</a></li>
  <li><a href="/c/2">Chapter 2 (relative)</a></li>
</ul>"#;
        let record = source_with(html, false).load(URL).await.unwrap();
        let urls: Vec<_> = record.chapters().iter().map(|c| c.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://blog.example/c/3", "https://blog.example:443/c/2"]
        );
    }

    #[tokio::test]
    async fn test_load_separates_words_across_blocks_and_line_breaks() {
        let html = r#"
<h1 class="entry-title">Dragon's<br>Path</h1>
<div class="novel-summary"><p>A long road.</p><p>Then a river.</p></div>"#;
        let record = source_with(html, true).load(URL).await.unwrap();
        assert_eq!(record.title, "Dragon's Path");
        assert_eq!(record.synopsis.as_deref(), Some("A long road. Then a river."));
    }

    #[tokio::test]
    async fn test_load_without_title_is_mandatory_field_missing() {
        let html = r#"<ul class="chapter-list"><li><a href="/c/1">Chapter 1</a></li></ul>"#;
        let err = source_with(html, true).load(URL).await.unwrap_err();
        assert!(err.is_page_shape());
        assert!(matches!(
            err,
            SourceError::MandatoryFieldMissing { field: "title", .. }
        ));
    }

    #[tokio::test]
    async fn test_load_blank_title_counts_as_missing() {
        let html = r#"<h1 class="entry-title">   </h1>"#;
        let err = source_with(html, true).load(URL).await.unwrap_err();
        assert!(err.is_page_shape());
    }

    #[tokio::test]
    async fn test_load_bundle_variant() {
        let html = r#"
<h1 class="entry-title">Dragon's Path</h1>
<ul class="chapter-list"><li><a href="/c/1">Chapter 1</a></li></ul>
<a class="pdf-download-link" href="/files/vol2.pdf">Volume 2</a>
<a class="pdf-download-link" href="/files/vol1.pdf">Volume 1</a>
<a class="pdf-download-link">Volume 0 (missing)</a>"#;
        let mut config = test_config();
        config.detail_variant = DetailVariant::Bundle;
        let source =
            SiteSource::new(config, FixtureFetcher::new().with_page(URL, html)).unwrap();

        let record = source.load(URL).await.unwrap();
        assert!(record.chapters().is_empty());
        let downloads = record.downloads();
        assert_eq!(downloads.len(), 2);
        assert_eq!(downloads[0].label, "Volume 1");
        assert_eq!(downloads[0].url, "https://blog.example/files/vol1.pdf");
    }

    #[tokio::test]
    async fn test_load_rejects_relative_url() {
        let source = source_with(NEWEST_FIRST, true);
        let err = source.load("/novel/dragons-path").await.unwrap_err();
        assert!(matches!(err, SourceError::InvalidArgument(_)));
        assert!(source.fetcher().requested().is_empty());
    }
}
