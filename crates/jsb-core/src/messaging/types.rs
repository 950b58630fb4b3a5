use crate::domain::{ChatId, UserId};

/// Cross-messenger command model.
///
/// Telegram-specific fields live in the Telegram adapter.
#[derive(Clone, Debug)]
pub struct Command {
    pub chat_id: ChatId,
    pub user_id: Option<UserId>,
    pub name: String,
    pub args: String,
}

impl Command {
    /// Split `/cmd@botname arg1 ...` into a lowercase command name and its raw arguments.
    pub fn parse(chat_id: ChatId, user_id: Option<UserId>, text: &str) -> Option<Self> {
        let text = text.trim();
        if !text.starts_with('/') {
            return None;
        }

        let mut parts = text.splitn(2, char::is_whitespace);
        let first = parts.next().unwrap_or("");
        let args = parts.next().unwrap_or("").trim().to_string();

        let name = first
            .trim_start_matches('/')
            .split('@')
            .next()
            .unwrap_or("")
            .to_lowercase();
        if name.is_empty() {
            return None;
        }

        Some(Self {
            chat_id,
            user_id,
            name,
            args,
        })
    }
}

/// Inline keyboard of link buttons, one per row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub buttons: Vec<InlineButton>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub url: String,
}

impl InlineKeyboard {
    pub fn single_link(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            buttons: vec![InlineButton {
                label: label.into(),
                url: url.into(),
            }],
        }
    }
}
