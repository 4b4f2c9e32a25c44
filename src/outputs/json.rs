//! JSON output for stage results.
//!
//! Results are wrapped in an envelope recording which source and stage
//! produced them and when:
//!
//! ```json
//! { "source": "My Blog", "kind": "search", "fetchedAt": "2025-05-06T20:30:00+02:00", "data": [...] }
//! ```
//!
//! Files land in a per-day directory:
//!
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── search-dragon.json
//!     └── detail-dragons-path.json
//! ```

use crate::utils::slugify_title;
use chrono::Local;
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};
use url::Url;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a, T> {
    source: &'a str,
    kind: &'a str,
    fetched_at: String,
    data: &'a T,
}

/// Pretty-printed envelope around `data`.
pub fn render<T: Serialize>(source: &str, kind: &str, data: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&Envelope {
        source,
        kind,
        fetched_at: Local::now().to_rfc3339(),
        data,
    })
}

/// File-name label for a URL: its last non-empty path segment, else its host.
pub fn label_for_url(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return slugify_title(url);
    };
    parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .or_else(|| parsed.host_str())
        .map(slugify_title)
        .unwrap_or_default()
}

/// Write `data` to `{output_dir}/{date}/{kind}-{slug(label)}.json`.
///
/// Returns the path written.
#[instrument(level = "info", skip_all, fields(%output_dir, %kind, %label))]
pub async fn write_result<T: Serialize>(
    output_dir: &str,
    source: &str,
    kind: &str,
    label: &str,
    data: &T,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = render(source, kind, data)?;

    let day_dir = PathBuf::from(output_dir).join(Local::now().date_naive().to_string());
    if let Err(e) = fs::create_dir_all(&day_dir).await {
        error!(dir = %day_dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let mut slug = slugify_title(label);
    if slug.is_empty() {
        slug = "result".to_string();
    }
    let path = day_dir.join(format!("{kind}-{slug}.json"));
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote JSON result");
    Ok(path)
}
