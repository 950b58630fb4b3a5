//! Telegraph adapter (results page publishing).
//!
//! Implements the `jsb-core` PagePublisher port over the Telegraph HTTP API.
//! The account is created once at startup and its token is reused for every page.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use jsb_core::{
    errors::Error,
    ports::{PagePublisher, PageRequest},
    render::PAGE_LINE_BREAK,
    Result,
};

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self, method: &str) -> Result<T> {
        if !self.ok {
            return Err(Error::PublishFailure(format!(
                "telegraph {method} failed: {}",
                self.error.unwrap_or_else(|| "unknown error".to_string())
            )));
        }
        self.result.ok_or_else(|| {
            Error::PublishFailure(format!("telegraph {method} returned no result"))
        })
    }
}

#[derive(Debug, Deserialize)]
struct Account {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Page {
    url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct TelegraphClient {
    api_url: String,
    access_token: String,
    http: reqwest::Client,
}

impl TelegraphClient {
    /// Create a Telegraph account named `short_name` and keep its access token.
    pub async fn create_account(
        api_url: impl Into<String>,
        short_name: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("telegraph http client: {e}")))?;

        let account: Account = call(
            &http,
            &api_url,
            "createAccount",
            json!({ "short_name": short_name, "author_name": short_name }),
        )
        .await?;
        let access_token = account
            .access_token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                Error::PublishFailure("telegraph createAccount returned no access token".into())
            })?;

        tracing::info!(short_name, "telegraph account created");
        Ok(Self {
            api_url,
            access_token,
            http,
        })
    }
}

#[async_trait]
impl PagePublisher for TelegraphClient {
    async fn publish(&self, page: PageRequest) -> Result<String> {
        let content = html_to_nodes(&page.html_content);
        let created: Page = call(
            &self.http,
            &self.api_url,
            "createPage",
            json!({
                "access_token": self.access_token,
                "title": page.title,
                "author_name": page.author_name,
                "content": content,
                "return_content": false,
            }),
        )
        .await?;

        created
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| Error::PublishFailure("telegraph createPage returned no url".into()))
    }
}

async fn call<T: serde::de::DeserializeOwned>(
    http: &reqwest::Client,
    api_url: &str,
    method: &str,
    body: Value,
) -> Result<T> {
    let resp = http
        .post(format!("{api_url}/{method}"))
        .json(&body)
        .send()
        .await
        .map_err(|e| Error::Transport(format!("telegraph request error: {e}")))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Transport(format!(
            "telegraph {method} failed: {status} {}",
            body.chars().take(200).collect::<String>()
        )));
    }

    let text = resp
        .text()
        .await
        .map_err(|e| Error::Transport(format!("telegraph body error: {e}")))?;
    let parsed: ApiResponse<T> = serde_json::from_str(&text)?;
    parsed.into_result(method)
}

/// Convert `<br>`-separated, HTML-escaped text into Telegraph content nodes.
fn html_to_nodes(html: &str) -> Vec<Value> {
    let mut nodes = Vec::new();
    for (i, part) in html.split(PAGE_LINE_BREAK).enumerate() {
        if i > 0 {
            nodes.push(json!({ "tag": "br" }));
        }
        if !part.is_empty() {
            nodes.push(Value::String(unescape_html(part)));
        }
    }
    nodes
}

fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}
