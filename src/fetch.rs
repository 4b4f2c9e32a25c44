//! Document fetching.
//!
//! Stages only need "give me the parsed document at this URL", expressed by
//! [`DocumentFetcher`]. Two implementations ship with the crate:
//!
//! - [`HttpFetcher`]: a `reqwest` client with a user agent, an
//!   `Accept-Language` header matching the source and a request timeout
//! - [`FixtureFetcher`]: serves stored HTML from memory, for tests and for
//!   trying out a configuration against saved pages
//!
//! Neither retries. A failing site must surface as an error, not as an empty
//! result.

use crate::error::{Result, SourceError};
use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use scraper::Html;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, instrument};

/// Default user agent for [`HttpFetcher`].
pub const DEFAULT_USER_AGENT: &str = concat!("awful_novel_source/", env!("CARGO_PKG_VERSION"));

/// Source of parsed documents.
///
/// Implementations report transport failures as [`SourceError::Network`] and
/// non-success responses as [`SourceError::HttpStatus`]. The returned future
/// is `Send` so stages built on a fetcher can run on any executor thread.
pub trait DocumentFetcher: Send + Sync {
    /// Fetch `url` and parse it as an HTML document.
    fn fetch_document(&self, url: &str) -> impl Future<Output = Result<Html>> + Send;
}

/// HTTP implementation of [`DocumentFetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client sending `user_agent` and `Accept-Language: {language_tag}`.
    pub fn new(user_agent: &str, language_tag: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let language = HeaderValue::from_str(language_tag)
            .map_err(|e| SourceError::InvalidConfig(format!("language_tag header: {e}")))?;
        headers.insert(ACCEPT_LANGUAGE, language);

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::InvalidConfig(format!("http client: {e}")))?;
        Ok(Self { client })
    }
}

impl DocumentFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch_document(&self, url: &str) -> Result<Html> {
        let network = |source| SourceError::Network {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(network)?;
        debug!(bytes = body.len(), %status, "Fetched document");
        Ok(Html::parse_document(&body))
    }
}

/// In-memory [`DocumentFetcher`] serving stored HTML by exact URL.
///
/// Unknown URLs answer 404. Every requested URL is recorded, so callers can
/// check which URL a stage built.
#[derive(Debug, Default)]
pub struct FixtureFetcher {
    pages: HashMap<String, String>,
    statuses: HashMap<String, u16>,
    requests: Mutex<Vec<String>>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` at `url`.
    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    /// Answer `url` with a non-success `status`.
    pub fn with_status(mut self, url: impl Into<String>, status: u16) -> Self {
        self.statuses.insert(url.into(), status);
        self
    }

    /// URLs requested so far, in request order.
    pub fn requested(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

impl DocumentFetcher for FixtureFetcher {
    async fn fetch_document(&self, url: &str) -> Result<Html> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(url.to_string());
        }
        if let Some(&status) = self.statuses.get(url) {
            return Err(SourceError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }
        match self.pages.get(url) {
            Some(html) => Ok(Html::parse_document(html)),
            None => Err(SourceError::HttpStatus {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}
