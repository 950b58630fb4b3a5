use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use jsb_core::{
    config::Config, liveness::SiteChecker, messaging::port::MessagingPort, search::SearchService,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub search: Arc<SearchService>,
    pub messenger: Arc<dyn MessagingPort>,
    pub checker: Arc<SiteChecker>,
}

pub async fn run_polling(
    cfg: Arc<Config>,
    search: Arc<SearchService>,
    checker: Arc<SiteChecker>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_token.clone());

    // Basic startup info.
    match bot.get_me().await {
        Ok(me) => tracing::info!(username = %me.username(), "jsb started"),
        Err(e) => tracing::warn!(error = %e, "getMe failed; continuing"),
    }
    tracing::info!(
        authorized_chats = cfg.authorized_chat_ids.len(),
        owner = cfg.owner_id.is_some(),
        max_results = cfg.max_results,
        "authorization loaded"
    );

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));

    let state = Arc::new(AppState {
        cfg,
        search,
        messenger,
        checker,
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
