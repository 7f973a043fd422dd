//! Calendar feed retrieval: remote URL or local file.

use std::time::Duration;

use anyhow::{Context, Result};
use busylight_core::Config;
use tracing::debug;

// Feeds can be slow to generate server-side; more generous than the light timeout
const FEED_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetch the raw ICS text the config points at.
pub async fn fetch_feed(config: &Config) -> Result<String> {
    if config.use_local {
        let path = config
            .local_calendar
            .as_ref()
            .context("useLocal is set but localCalendar is missing")?;
        debug!(path = %path.display(), "reading local feed");
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read local feed {}", path.display()));
    }

    let url = config.calendar.as_ref().context("Missing calendar feed URL")?;
    debug!(%url, "fetching feed");

    let http = reqwest::Client::builder()
        .timeout(FEED_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")?;

    let resp = http
        .get(url)
        .send()
        .await
        .context("Failed to fetch the calendar feed")?;

    if !resp.status().is_success() {
        anyhow::bail!("Calendar feed request failed: {}", resp.status());
    }

    resp.text()
        .await
        .context("Failed to read the calendar feed body")
}
