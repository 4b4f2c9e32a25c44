//! Error taxonomy for the source adapter.
//!
//! Only a few things are fatal for a stage call. Everything else the pipeline
//! tolerates silently:
//!
//! | Situation | Outcome |
//! |-----------|---------|
//! | Transport failure / non-success HTTP status | [`SourceError::Network`] / [`SourceError::HttpStatus`] |
//! | Detail page without a title | [`SourceError::MandatoryFieldMissing`] |
//! | Optional field missing | field is `None` |
//! | List item missing its title or link | item dropped |
//! | Chapter page without a content container | `Ok(None)` |
//!
//! Configuration problems (bad selectors, bad origin) surface when an adapter
//! is built, never while a stage runs.

use thiserror::Error;

/// The error type for every fallible adapter operation.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The request never produced a response (DNS, TLS, connection reset, timeout).
    #[error("network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus { url: String, status: u16 },

    /// A field the record cannot exist without was not found on the page.
    #[error("mandatory field `{field}` missing on {url}")]
    MandatoryFieldMissing { field: &'static str, url: String },

    /// The caller broke a precondition (empty query, page 0, relative URL).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The adapter was configured without this capability.
    #[error("operation not supported by this source: {0}")]
    Unsupported(&'static str),

    /// A configured selector could not be compiled.
    #[error("invalid selector for `{field}` ({selector:?}): {reason}")]
    InvalidSelector {
        field: String,
        selector: String,
        reason: String,
    },

    /// The configuration is structurally valid YAML but semantically unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// The configuration file is not valid YAML for [`crate::config::SourceConfig`].
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),
}

impl SourceError {
    /// True when the site could not be reached or refused the request.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::HttpStatus { .. })
    }

    /// True when the page was reachable but no longer has the expected shape.
    pub fn is_page_shape(&self) -> bool {
        matches!(self, Self::MandatoryFieldMissing { .. })
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SourceError>;
