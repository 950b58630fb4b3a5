//! Liveness checker for an external site (`/check`).

use std::time::Duration;

use crate::{errors::Error, Result};

pub const UP_MESSAGE: &str = "chal raha hai";
pub const DOWN_MESSAGE: &str = "gaya bhai";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SiteStatus {
    Up,
    Down,
}

impl SiteStatus {
    pub fn message(self) -> &'static str {
        match self {
            Self::Up => UP_MESSAGE,
            Self::Down => DOWN_MESSAGE,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SiteChecker {
    url: String,
    http: reqwest::Client,
}

impl SiteChecker {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("liveness http client: {e}")))?;
        Ok(Self {
            url: url.into(),
            http,
        })
    }

    /// One GET; anything but a 2xx answer within the timeout counts as down.
    pub async fn check(&self) -> SiteStatus {
        match self.http.get(&self.url).send().await {
            Ok(resp) if resp.status().is_success() => SiteStatus::Up,
            Ok(resp) => {
                tracing::info!(url = %self.url, status = %resp.status(), "liveness check: bad status");
                SiteStatus::Down
            }
            Err(e) => {
                tracing::info!(url = %self.url, error = %e, "liveness check failed");
                SiteStatus::Down
            }
        }
    }
}
