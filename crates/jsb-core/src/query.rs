//! Search command arguments and the Jackett Torznab query URL.

use std::sync::OnceLock;

use regex::Regex;

/// Token that switches on the Golden Popcorn filter.
pub const GOLDEN_POPCORN_FLAG: &str = "-gp";

const IMDB_PREFIX: &str = "tt";

/// What to look up: free text or an IMDb identifier (`tt` + digits).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchQuery {
    Text(String),
    ImdbId(String),
}

impl SearchQuery {
    /// Classify a query. Bare `tt1234567` ids and IMDb title URLs become [`SearchQuery::ImdbId`].
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if is_imdb_id(raw) {
            return Self::ImdbId(raw.to_string());
        }
        if let Some(id) = imdb_id_from_url(raw) {
            return Self::ImdbId(id);
        }
        Self::Text(raw.to_string())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::ImdbId(_) => "imdb",
        }
    }
}

fn is_imdb_id(s: &str) -> bool {
    match s.strip_prefix(IMDB_PREFIX) {
        Some(rest) => !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

fn imdb_id_from_url(s: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^(?:https?://)?(?:[a-z]+\.)?imdb\.com/title/(tt[0-9]+)(?:[/?#].*)?$")
            .expect("valid regex")
    });
    re.captures(s)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// A parsed `/release` invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: SearchQuery,
    pub golden_popcorn: bool,
}

impl SearchRequest {
    /// Parse the whitespace-separated command arguments.
    ///
    /// Every `-gp` token is removed and turns the quality filter on. Returns `None`
    /// when nothing is left to search for.
    pub fn from_args(args: &str) -> Option<Self> {
        let mut golden_popcorn = false;
        let mut words = Vec::new();
        for word in args.split_whitespace() {
            if word == GOLDEN_POPCORN_FLAG {
                golden_popcorn = true;
            } else {
                words.push(word);
            }
        }

        if words.is_empty() {
            return None;
        }

        Some(Self {
            query: SearchQuery::parse(&words.join(" ")),
            golden_popcorn,
        })
    }
}

/// Build the aggregated Torznab search URL for every configured indexer.
pub fn search_url(base_url: &str, api_key: &str, query: &SearchQuery) -> String {
    let base = format!(
        "{}/api/v2.0/indexers/all/results/torznab/api?apikey={api_key}",
        base_url.trim_end_matches('/')
    );
    match query {
        SearchQuery::ImdbId(id) => format!("{base}&imdbid={id}"),
        SearchQuery::Text(text) => format!("{base}&t=search&q={}", urlencoding::encode(text)),
    }
}
