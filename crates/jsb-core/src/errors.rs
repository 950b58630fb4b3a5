/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type so the search flow
/// can decide which short message the user sees and what gets logged.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Network failure or non-success status from the indexer or publish service.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed feed: {0}")]
    MalformedFeed(String),

    #[error("missing or invalid field `{field}`: {reason}")]
    MissingField { field: &'static str, reason: String },

    /// The publish call went through but produced no usable link.
    #[error("publish failure: {0}")]
    PublishFailure(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
