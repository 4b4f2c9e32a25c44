//! URL normalization, text cleanup and small file system helpers.
//!
//! - [`normalize_url`]: turn whatever an `href`/`src` holds into an absolute URL
//! - [`clean_text`]: collapse the whitespace scraped text is full of
//! - [`truncate_for_log`] / [`slugify_title`]: logging and output file naming
//! - [`ensure_writable_dir`]: output directory validation for the CLI

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Resolve a link candidate against `base`.
///
/// * `None`, empty or whitespace-only input yields `None`; a URL is never made up.
/// * Absolute `http`/`https` input is returned as given (trimmed), which makes
///   the function idempotent.
/// * Relative input (`chapter-2`, `/novel/x`, `../x`, `//cdn.host/img.png`) is
///   resolved with standard URL joining rules.
/// * Anything unparsable, an unparsable base, or a non-web scheme
///   (`javascript:`, `mailto:`, `data:`) yields `None`.
///
/// # Examples
///
/// ```ignore
/// let base = "https://blog.example/novels/dragon/";
/// assert_eq!(
///     normalize_url(Some("../other/"), base).as_deref(),
///     Some("https://blog.example/novels/other/")
/// );
/// assert_eq!(normalize_url(None, base), None);
/// ```
pub fn normalize_url(candidate: Option<&str>, base: &str) -> Option<String> {
    let candidate = candidate?.trim();
    if candidate.is_empty() {
        return None;
    }

    if let Ok(absolute) = Url::parse(candidate) {
        return is_web_scheme(&absolute).then(|| candidate.to_string());
    }

    // base is the URL of the page the link came from, not the site origin
    let base = Url::parse(base).ok()?;
    let resolved = base.join(candidate).ok()?;
    is_web_scheme(&resolved).then(|| resolved.to_string())
}

fn is_web_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https") && url.has_host()
}

/// True when `url` is an absolute `http`/`https` URL.
pub fn is_absolute_web_url(url: &str) -> bool {
    Url::parse(url).map(|u| is_web_scheme(&u)).unwrap_or(false)
}

/// Collapse whitespace runs to a single space and trim.
///
/// Returns `None` when nothing but whitespace remains, so callers can treat
/// blank text the same as a missing node.
pub fn clean_text(raw: &str) -> Option<String> {
    let collapsed = WHITESPACE.replace_all(raw.trim(), " ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed.into_owned())
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (backing off to a char
/// boundary) with an ellipsis and a count of the dropped bytes.
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Convert a title or query to a file-name friendly slug.
///
/// ```ignore
/// assert_eq!(slugify_title("Dragon's Path"), "dragons-path");
/// ```
pub fn slugify_title(title: &str) -> String {
    title
        .to_lowercase()
        .replace(|c: char| !c.is_alphanumeric() && c != ' ' && c != '-', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
