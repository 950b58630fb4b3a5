use crate::{
    config::Config,
    domain::{ChatId, UserId},
};

// ============== Authorization ==============

/// A request is allowed when it comes from an authorized chat, or from the owner in any chat.
pub fn is_authorized(user_id: Option<UserId>, chat_id: ChatId, cfg: &Config) -> bool {
    is_authorized_with(user_id, chat_id, &cfg.authorized_chat_ids, cfg.owner_id)
}

fn is_authorized_with(
    user_id: Option<UserId>,
    chat_id: ChatId,
    authorized_chats: &[i64],
    owner_id: Option<i64>,
) -> bool {
    if authorized_chats.contains(&chat_id.0) {
        return true;
    }
    match (user_id, owner_id) {
        (Some(user), Some(owner)) => user.0 == owner,
        _ => false,
    }
}
