//! Torznab/RSS feed parsing into normalized search results.

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Utc};

use crate::{
    errors::Error,
    formatting::{format_age, human_size},
    Result,
};

/// Marker that identifies Golden Popcorn releases in a title.
pub const GOLDEN_POPCORN_MARKER: &str = "Golden Popcorn";

/// `pubDate` layout used by Jackett, e.g. `Mon, 02 Jan 2006 15:04:05 -0700`.
const PUB_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// One search hit, ready for rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedResult {
    pub title: String,
    pub size_bytes: i64,
    pub size: String,
    pub age: String,
}

/// What to do with an `<item>` whose fields are missing or unparsable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ItemErrorPolicy {
    /// Fail the whole parse on the first bad item.
    #[default]
    Abort,
    /// Log and drop the bad item, keep the rest.
    Skip,
}

impl FromStr for ItemErrorPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            other => Err(Error::Config(format!(
                "ITEM_ERROR_POLICY must be `abort` or `skip`, got `{other}`"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ParseOptions {
    pub golden_popcorn: bool,
    pub on_bad_item: ItemErrorPolicy,
}

/// Parse a feed document using the current wall clock for ages.
pub fn parse_feed(xml: &[u8], opts: ParseOptions) -> Result<Vec<NormalizedResult>> {
    parse_feed_at(xml, opts, Utc::now())
}

/// Parse every `<item>` (at any depth) in document order.
pub fn parse_feed_at(
    xml: &[u8],
    opts: ParseOptions,
    now: DateTime<Utc>,
) -> Result<Vec<NormalizedResult>> {
    let text = std::str::from_utf8(xml)
        .map_err(|e| Error::MalformedFeed(format!("feed is not valid utf-8: {e}")))?;
    let doc = roxmltree::Document::parse(text).map_err(|e| Error::MalformedFeed(e.to_string()))?;

    let mut out = Vec::new();
    for (idx, item) in doc
        .descendants()
        .filter(|n| n.is_element() && n.has_tag_name("item"))
        .enumerate()
    {
        match parse_item(&item, opts.golden_popcorn, now) {
            Ok(Some(result)) => out.push(result),
            Ok(None) => {}
            Err(e) => match opts.on_bad_item {
                ItemErrorPolicy::Abort => return Err(e),
                ItemErrorPolicy::Skip => {
                    tracing::warn!(item = idx, error = %e, "skipping malformed feed item");
                }
            },
        }
    }

    Ok(out)
}

/// `Ok(None)` means the item was filtered out, not that it was broken.
fn parse_item(
    item: &roxmltree::Node<'_, '_>,
    golden_popcorn: bool,
    now: DateTime<Utc>,
) -> Result<Option<NormalizedResult>> {
    let title = child_text(item, "title")?;
    if golden_popcorn && !title.contains(GOLDEN_POPCORN_MARKER) {
        return Ok(None);
    }

    let raw_size = child_text(item, "size")?;
    let size_bytes = raw_size
        .trim()
        .parse::<u64>()
        .ok()
        .and_then(|v| i64::try_from(v).ok())
        .ok_or_else(|| Error::MissingField {
            field: "size",
            reason: format!("not a byte count: `{raw_size}`"),
        })?;
    let size = human_size(size_bytes)?;

    let raw_date = child_text(item, "pubDate")?;
    let published = parse_pub_date(&raw_date)?;

    Ok(Some(NormalizedResult {
        title,
        size_bytes,
        size,
        age: format_age(published, now),
    }))
}

fn parse_pub_date(raw: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_str(raw.trim(), PUB_DATE_FORMAT).map_err(|e| Error::MissingField {
        field: "pubDate",
        reason: format!("`{raw}`: {e}"),
    })
}

/// Text of the first direct child element named `name`; an empty element yields `""`.
fn child_text(node: &roxmltree::Node<'_, '_>, name: &'static str) -> Result<String> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == name)
        .map(|c| c.text().unwrap_or("").to_string())
        .ok_or_else(|| Error::MissingField {
            field: name,
            reason: "element not present".to_string(),
        })
}
