//! HTTP client for the light's control API.
//!
//! All four endpoints are plain GETs off one base URL; the three command
//! endpoints return no body and are idempotent on the device side.

use std::time::Duration;

use anyhow::{Context, Result};
use busylight_core::light::{LightColorState, LightCommand, LightStatus};
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct LightClient {
    http: reqwest::Client,
    base_url: String,
}

impl LightClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(LightClient {
            http,
            base_url: base_url.to_string(),
        })
    }

    /// GET {base}status
    pub async fn status(&self) -> Result<LightColorState> {
        let resp = self
            .http
            .get(format!("{}status", self.base_url))
            .send()
            .await
            .context("Failed to reach the light")?;

        if !resp.status().is_success() {
            anyhow::bail!("Light status request failed: {}", resp.status());
        }

        let status: LightStatus = resp
            .json()
            .await
            .context("Light returned an unreadable status")?;
        let color = LightColorState::from(&status);
        debug!(?color, "observed light state");
        Ok(color)
    }

    /// GET {base}available | {base}busy | {base}off
    pub async fn send(&self, command: LightCommand) -> Result<()> {
        let suffix = command.endpoint_suffix();
        debug!(command = suffix, "sending light command");

        let resp = self
            .http
            .get(format!("{}{}", self.base_url, suffix))
            .send()
            .await
            .with_context(|| format!("Failed to send '{suffix}' to the light"))?;

        if !resp.status().is_success() {
            anyhow::bail!("Light rejected '{}': {}", suffix, resp.status());
        }

        Ok(())
    }
}
