//! Bridge transport
//!
//! Sends an assembled raw command to the Tasmota web endpoint of the
//! RF bridge. One bounded, non-retried request; the protocol has no
//! acknowledgment channel, so a success here only means the bridge
//! accepted the command.

use anyhow::{bail, Context, Result};
use std::time::Duration;
use tracing::info;

/// HTTP client for a Tasmota RF bridge.
pub struct Bridge {
    host: String,
    client: reqwest::blocking::Client,
}

impl Bridge {
    pub fn new(host: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            host: host.to_string(),
            client,
        })
    }

    /// Send a raw command string through the bridge's `cm` endpoint.
    pub fn send_raw(&self, command: &str) -> Result<()> {
        let url = format!("http://{}/cm", self.host);
        info!(host = %self.host, "sending raw command to bridge");

        let response = self
            .client
            .get(&url)
            .query(&[("cmnd", command)])
            .send()
            .with_context(|| format!("transport error: request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("transport error: bridge {} returned status {}", self.host, status);
        }
        Ok(())
    }
}
