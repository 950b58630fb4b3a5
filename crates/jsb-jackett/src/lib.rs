//! Jackett adapter (Torznab feed fetch).
//!
//! Implements the `jsb-core` FeedSource port with a plain reqwest GET.

use std::time::Duration;

use async_trait::async_trait;

use jsb_core::{errors::Error, ports::FeedSource, Result};

#[derive(Clone, Debug)]
pub struct JackettClient {
    http: reqwest::Client,
}

impl JackettClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("jackett http client: {e}")))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl FeedSource for JackettClient {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            // The URL carries the API key; keep it out of error text.
            .map_err(|e| Error::Transport(format!("jackett request error: {}", e.without_url())))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Transport(format!(
                "jackett search failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| Error::Transport(format!("jackett body error: {}", e.without_url())))?;
        tracing::debug!(bytes = bytes.len(), "jackett response received");
        Ok(bytes.to_vec())
    }
}
