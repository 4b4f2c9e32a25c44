//! Content stage: chapter URL to cleaned chapter markup.
//!
//! A page without the content container yields `Ok(None)`: the host decides
//! whether to retry or skip. When the container exists, every descendant
//! matching one of the exclusion selectors is detached from the parsed tree
//! before the container is serialized, however deeply it is nested.

use super::SiteSource;
use crate::error::{Result, SourceError};
use crate::fetch::DocumentFetcher;
use crate::models::ChapterContent;
use crate::utils::{is_absolute_web_url, truncate_for_log};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};

/// Fetch a chapter page and return its cleaned body.
///
/// # Returns
///
/// `Ok(None)` when the page has no content container, `InvalidArgument` for a
/// non-absolute URL.
#[instrument(level = "info", skip(source), fields(site = %source.name))]
pub(super) async fn load_content<F: DocumentFetcher>(
    source: &SiteSource<F>,
    chapter_url: &str,
) -> Result<Option<ChapterContent>> {
    if !is_absolute_web_url(chapter_url) {
        return Err(SourceError::InvalidArgument(format!(
            "chapter URL {chapter_url:?} is not an absolute http(s) URL"
        )));
    }

    let document = source.fetcher.fetch_document(chapter_url).await?;
    let content = sanitize(
        document,
        &source.selectors.content,
        &source.selectors.exclusions,
    );

    match &content {
        Some(content) => {
            info!(bytes = content.html.len(), "Parsed chapter content");
            debug!(preview = %truncate_for_log(&content.html, 200), "Chapter content");
        }
        None => warn!("Chapter page has no content container"),
    }
    Ok(content)
}

/// Inner HTML of the first `container` match with every `exclusions` match
/// inside it removed.
pub(crate) fn sanitize(
    mut document: Html,
    container: &Selector,
    exclusions: &[Selector],
) -> Option<ChapterContent> {
    let (container_id, doomed) = {
        let element = document.select(container).next()?;
        let id = element.id();
        let doomed: Vec<_> = exclusions
            .iter()
            .flat_map(move |sel| element.select(sel))
            .map(|el| el.id())
            .filter(|node| *node != id)
            .collect();
        (id, doomed)
    };

    let removed = doomed.len();
    for node_id in doomed {
        if let Some(mut node) = document.tree.get_mut(node_id) {
            node.detach();
        }
    }
    if removed > 0 {
        debug!(removed, "Removed excluded nodes from chapter body");
    }

    let element = document.tree.get(container_id).and_then(ElementRef::wrap)?;
    Some(ChapterContent {
        html: element.inner_html().trim().to_string(),
    })
}
