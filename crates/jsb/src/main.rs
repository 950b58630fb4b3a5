use std::sync::Arc;

use jsb_jackett::JackettClient;
use jsb_telegraph::TelegraphClient;

use jsb_core::{config::Config, liveness::SiteChecker, search::SearchService};

#[tokio::main]
async fn main() -> Result<(), jsb_core::Error> {
    jsb_core::logging::init("jsb")?;

    let cfg = Arc::new(Config::load()?);

    let feed = Arc::new(JackettClient::new(cfg.http_timeout)?);
    let publisher = Arc::new(
        TelegraphClient::create_account(
            cfg.telegraph_api_url.clone(),
            &cfg.telegraph_short_name,
            cfg.http_timeout,
        )
        .await?,
    );
    let checker = Arc::new(SiteChecker::new(cfg.liveness_url.clone(), cfg.liveness_timeout)?);

    let search = Arc::new(SearchService::new(cfg.clone(), feed, publisher));

    jsb_telegram::router::run_polling(cfg, search, checker)
        .await
        .map_err(|e| jsb_core::Error::External(format!("telegram bot failed: {e}")))?;

    tracing::info!("jsb stopped");
    Ok(())
}
