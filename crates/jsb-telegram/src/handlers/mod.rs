//! Telegram update handlers.
//!
//! Only commands are handled; every other message is ignored.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use jsb_core::{
    domain::{ChatId, UserId},
    messaging::types::Command,
};

use crate::router::AppState;

mod commands;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let user_id = msg.from().map(|u| UserId(u.id.0 as i64));
    let Some(cmd) = Command::parse(ChatId(msg.chat.id.0), user_id, text) else {
        return Ok(());
    };

    commands::handle_command(&state, cmd).await;
    Ok(())
}
