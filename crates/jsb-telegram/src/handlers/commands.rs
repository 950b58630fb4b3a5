use jsb_core::{
    domain::ChatId,
    messaging::{port::MessagingPort, types::Command},
    query::SearchRequest,
    security::is_authorized,
};

use crate::router::AppState;

const NOT_AUTHORIZED: &str = "Not Authorized";
const STARTED: &str = "Bot Started";
const USAGE: &str = "Please Provide Query or IMDb ID/URL";

pub async fn handle_command(state: &AppState, cmd: Command) {
    let handled = matches!(cmd.name.as_str(), "start" | "release" | "check");
    if !handled {
        return;
    }

    let authorized = is_authorized(cmd.user_id, cmd.chat_id, &state.cfg);
    tracing::info!(
        command = %cmd.name,
        chat_id = cmd.chat_id.0,
        user_id = cmd.user_id.map(|u| u.0),
        authorized,
        "command received"
    );
    if !authorized {
        reply(state.messenger.as_ref(), cmd.chat_id, NOT_AUTHORIZED).await;
        return;
    }

    match cmd.name.as_str() {
        "start" => reply(state.messenger.as_ref(), cmd.chat_id, STARTED).await,
        "release" => handle_release(state, &cmd).await,
        "check" => handle_check(state, &cmd).await,
        _ => {}
    }
}

async fn handle_release(state: &AppState, cmd: &Command) {
    let Some(request) = SearchRequest::from_args(&cmd.args) else {
        reply(state.messenger.as_ref(), cmd.chat_id, USAGE).await;
        return;
    };

    let outcome = state
        .search
        .run(state.messenger.as_ref(), cmd.chat_id, &request)
        .await;
    tracing::debug!(chat_id = cmd.chat_id.0, ?outcome, "search done");
}

async fn handle_check(state: &AppState, cmd: &Command) {
    let status = state.checker.check().await;
    reply(state.messenger.as_ref(), cmd.chat_id, status.message()).await;
}

async fn reply(messenger: &dyn MessagingPort, chat_id: ChatId, text: &str) {
    if let Err(e) = messenger.send_text(chat_id, text).await {
        tracing::warn!(chat_id = chat_id.0, error = %e, "failed to send reply");
    }
}
