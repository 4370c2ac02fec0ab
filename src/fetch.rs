use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::settings::DEFAULT_TIMEOUT;

/// Image hosts reject the default reqwest agent often enough to matter.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .context("Failed to build download HTTP client")?;
        Ok(Self { client })
    }

    /// Downloads `url` into `dest`, returning the number of bytes written.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<usize> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;
        let status = res.status();
        if !status.is_success() {
            return Err(anyhow!("GET {url} returned {status}"));
        }
        let bytes = res.bytes().await.context("reading image body failed")?;
        fs::write(dest, &bytes).with_context(|| format!("Failed to write {}", dest.display()))?;
        Ok(bytes.len())
    }
}
