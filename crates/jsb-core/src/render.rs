//! Rendering of search results: a truncated rich preview for the chat and a
//! complete plain listing for the published page.

use crate::{feed::NormalizedResult, formatting::escape_html};

/// Line break understood by the publish service's HTML content.
pub const PAGE_LINE_BREAK: &str = "<br>";

/// Plain three-line block, as published on the full page.
pub fn plain_block(r: &NormalizedResult) -> String {
    format!("Title: {}\nAge: {}\nSize: {}\n", r.title, r.age, r.size)
}

/// Rich block in Telegram HTML: bold labels, title in a code span.
pub fn rich_block(r: &NormalizedResult) -> String {
    format!(
        "<b>Title:</b> <code>{}</code>\n<b>Age:</b> {}\n<b>Size:</b> {}\n",
        escape_html(&r.title),
        escape_html(&r.age),
        escape_html(&r.size)
    )
}

/// The chat-sized subset of a result list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Preview<'a> {
    pub golden_popcorn: bool,
    pub shown: &'a [NormalizedResult],
    /// Results left out of the preview; zero means no trailer.
    pub more: usize,
}

impl<'a> Preview<'a> {
    pub fn new(results: &'a [NormalizedResult], max_results: usize, golden_popcorn: bool) -> Self {
        let take = results.len().min(max_results);
        Self {
            golden_popcorn,
            shown: &results[..take],
            more: results.len() - take,
        }
    }

    pub fn header(&self) -> String {
        if self.golden_popcorn {
            "SEARCH RESULTS (GP)".to_string()
        } else {
            "SEARCH RESULTS".to_string()
        }
    }

    pub fn to_html(&self) -> String {
        let mut html = format!("▫️<b><u>{}</u></b>\n\n", self.header());
        html.push_str(
            &self
                .shown
                .iter()
                .map(rich_block)
                .collect::<Vec<_>>()
                .join("\n"),
        );
        if self.more > 0 {
            html.push_str(&format!("\n+{} <b>More Results..</b>", self.more));
        }
        html
    }
}

/// Every result as plain blocks, escaped for HTML and with newlines turned into
/// [`PAGE_LINE_BREAK`].
pub fn full_page_html(results: &[NormalizedResult]) -> String {
    results
        .iter()
        .map(|r| escape_html(&plain_block(r)).replace('\n', PAGE_LINE_BREAK))
        .collect::<Vec<_>>()
        .join(PAGE_LINE_BREAK)
}
