//! Records handed to the host application.
//!
//! - [`ListingSummary`]: one entry of a search result or listing page
//! - [`DetailRecord`]: full metadata for one title, with a [`DetailBody`]
//!   holding either its chapters or its downloadable bundles
//! - [`ChapterContent`]: the cleaned body of one chapter
//! - [`PageResult`]: one page of a browsable listing
//!
//! Every URL-bearing field is absolute by the time a value is constructed.
//! Field names serialize as camelCase to match the host's JSON vocabulary.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Minimal identifying record for a discoverable title.
///
/// Identity is `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSummary {
    /// Display title; never empty.
    pub title: String,
    /// Absolute URL of the title's detail page.
    pub url: String,
    /// Absolute URL of the cover image, if the listing shows one.
    pub poster_url: Option<String>,
    /// Label of the most recent chapter, e.g. `"Chapter 41"`.
    pub latest_chapter: Option<String>,
}

/// Publication status of a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ongoing,
    Completed,
    Unknown,
}

static ONGOING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(ongoing|on-going|updating|serializ|serialis|publishing)").unwrap());
static COMPLETED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(completed?|finished|ended)\b").unwrap());

impl Status {
    /// Map a site's free-form status label onto [`Status`].
    ///
    /// Labels that mention neither state map to [`Status::Unknown`].
    pub fn from_label(label: &str) -> Self {
        if COMPLETED.is_match(label) {
            Self::Completed
        } else if ONGOING.is_match(label) {
            Self::Ongoing
        } else {
            Self::Unknown
        }
    }
}

/// A link to one chapter of a title.
///
/// Identity is `url`; a [`DetailRecord`] never holds two chapters with the same URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterRef {
    pub label: String,
    pub url: String,
    pub release_date: Option<String>,
}

/// A whole-work download offered instead of per-chapter pages (PDF, EPUB, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLink {
    pub label: String,
    pub url: String,
}

/// What a detail page offers for reading. A record carries exactly one shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "items", rename_all = "camelCase")]
pub enum DetailBody {
    /// Per-chapter HTML pages, oldest first.
    Chapters(Vec<ChapterRef>),
    /// Whole-work downloads, oldest first.
    Bundle(Vec<DownloadLink>),
}

/// Full metadata and reading material for one title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailRecord {
    pub title: String,
    pub canonical_url: String,
    pub author: Option<String>,
    pub poster_url: Option<String>,
    pub synopsis: Option<String>,
    pub tags: Vec<String>,
    pub status: Option<Status>,
    pub body: DetailBody,
}

impl DetailRecord {
    /// Chapters of a per-chapter record; empty for bundle records.
    pub fn chapters(&self) -> &[ChapterRef] {
        match &self.body {
            DetailBody::Chapters(chapters) => chapters,
            DetailBody::Bundle(_) => &[],
        }
    }

    /// Downloads of a bundle record; empty for per-chapter records.
    pub fn downloads(&self) -> &[DownloadLink] {
        match &self.body {
            DetailBody::Bundle(links) => links,
            DetailBody::Chapters(_) => &[],
        }
    }
}

/// The readable body of one chapter, with ads, scripts and boilerplate removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterContent {
    pub html: String,
}

/// One page of a browsable listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    /// The listing URL that was fetched.
    pub url: String,
    pub items: Vec<ListingSummary>,
    /// Whether the document advertised a following page.
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(n: u32) -> ChapterRef {
        ChapterRef {
            label: format!("Chapter {n}"),
            url: format!("https://blog.example/dragon/{n}"),
            release_date: None,
        }
    }

    fn record(body: DetailBody) -> DetailRecord {
        DetailRecord {
            title: "Dragon's Path".to_string(),
            canonical_url: "https://blog.example/dragon".to_string(),
            author: None,
            poster_url: None,
            synopsis: None,
            tags: vec![],
            status: None,
            body,
        }
    }

    #[test]
    fn test_status_from_label() {
        assert_eq!(Status::from_label("Ongoing"), Status::Ongoing);
        assert_eq!(Status::from_label("Status: updating weekly"), Status::Ongoing);
        assert_eq!(Status::from_label("COMPLETED"), Status::Completed);
        assert_eq!(Status::from_label("Complete"), Status::Completed);
        assert_eq!(Status::from_label("Finished (120 chapters)"), Status::Completed);
        assert_eq!(Status::from_label("Hiatus"), Status::Unknown);
    }

    #[test]
    fn test_chapters_accessor_by_variant() {
        let chapters = record(DetailBody::Chapters(vec![chapter(1), chapter(2)]));
        assert_eq!(chapters.chapters().len(), 2);
        assert!(chapters.downloads().is_empty());

        let bundle = record(DetailBody::Bundle(vec![DownloadLink {
            label: "Volume 1 (PDF)".to_string(),
            url: "https://blog.example/dragon-v1.pdf".to_string(),
        }]));
        assert!(bundle.chapters().is_empty());
        assert_eq!(bundle.downloads()[0].label, "Volume 1 (PDF)");
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let summary = ListingSummary {
            title: "Dragon's Path".to_string(),
            url: "https://blog.example/dragon".to_string(),
            poster_url: Some("https://blog.example/dragon.jpg".to_string()),
            latest_chapter: None,
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"posterUrl\""));
        assert!(json.contains("\"latestChapter\":null"));
    }

    #[test]
    fn test_detail_record_round_trips_through_json() {
        let mut original = record(DetailBody::Chapters(vec![chapter(1)]));
        original.status = Some(Status::Ongoing);
        let json = serde_json::to_string(&original).unwrap();
        assert!(json.contains("\"kind\":\"chapters\""));
        assert!(json.contains("\"status\":\"ongoing\""));

        let back: DetailRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, original);
    }
}
