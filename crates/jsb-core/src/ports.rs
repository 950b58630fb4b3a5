use async_trait::async_trait;

use crate::Result;

/// Fetches a raw indexer response body.
///
/// Implementations map transport failures and non-2xx statuses to
/// [`crate::Error::Transport`].
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// A page to publish on an external paste service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub title: String,
    /// HTML content using `<br>` line breaks.
    pub html_content: String,
    pub author_name: String,
}

/// Publishes a page and returns its public URL.
#[async_trait]
pub trait PagePublisher: Send + Sync {
    async fn publish(&self, page: PageRequest) -> Result<String>;
}
