//! Search stage: query string to listing summaries.
//!
//! Only the first result page is read; the site's own search pagination is
//! not followed.

use super::SiteSource;
use crate::error::{Result, SourceError};
use crate::fetch::DocumentFetcher;
use crate::models::ListingSummary;
use tracing::{debug, info, instrument};

/// Run a search and return the first page of results.
///
/// # Arguments
///
/// * `source` - The adapter whose configuration and fetcher are used
/// * `query` - Free-text query; surrounding whitespace is ignored
///
/// # Returns
///
/// Results in site order, possibly empty. A blank query is `InvalidArgument`
/// and fetches nothing.
#[instrument(level = "info", skip(source), fields(site = %source.name))]
pub(super) async fn search<F: DocumentFetcher>(
    source: &SiteSource<F>,
    query: &str,
) -> Result<Vec<ListingSummary>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(SourceError::InvalidArgument(
            "search query is empty".to_string(),
        ));
    }

    let url = source.config.search_url(query)?;
    debug!(%url, "Fetching search page");
    let document = source.fetcher.fetch_document(&url).await?;

    let (results, dropped) = source
        .selectors
        .search
        .extract(document.root_element(), &url);
    info!(count = results.len(), dropped, "Parsed search results");
    Ok(results)
}
