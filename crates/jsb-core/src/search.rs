//! Search flow: build URL -> fetch -> parse -> publish -> preview reply.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    config::Config,
    domain::{ChatId, MessageRef},
    feed::{parse_feed_at, ParseOptions},
    messaging::{port::MessagingPort, types::InlineKeyboard},
    ports::{FeedSource, PagePublisher, PageRequest},
    query::{search_url, SearchRequest},
    render::{full_page_html, Preview},
};

pub const SEARCHING_MESSAGE: &str = "Please Wait, Searching...";
pub const NO_RESULTS_MESSAGE: &str = "No Results";
pub const FETCH_ERROR_MESSAGE: &str = "HTTP Error Occurred";
pub const PARSE_ERROR_MESSAGE: &str = "Unexpected Error Occurred";
pub const PUBLISH_ERROR_MESSAGE: &str = "Telegraph Error";
pub const RESULTS_BUTTON_LABEL: &str = "RESULTS";
pub const PAGE_TITLE: &str = "Search Results";

/// Terminal state of one search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    Done {
        page_url: String,
        shown: usize,
        total: usize,
    },
    NoResults,
    FetchFailed,
    ParseFailed,
    PublishFailed,
}

/// What to send back to the chat for a given outcome.
enum Reply {
    Text(String),
    Results { html: String, page_url: String },
}

/// Orchestrates one search per call. Holds no per-request state, so a single
/// instance is shared by every chat.
pub struct SearchService {
    cfg: Arc<Config>,
    feed: Arc<dyn FeedSource>,
    publisher: Arc<dyn PagePublisher>,
}

impl SearchService {
    pub fn new(
        cfg: Arc<Config>,
        feed: Arc<dyn FeedSource>,
        publisher: Arc<dyn PagePublisher>,
    ) -> Self {
        Self {
            cfg,
            feed,
            publisher,
        }
    }

    /// Run a search and deliver its result to `chat_id`.
    ///
    /// The "searching" indicator is deleted on every exit path.
    pub async fn run(
        &self,
        messenger: &dyn MessagingPort,
        chat_id: ChatId,
        request: &SearchRequest,
    ) -> SearchOutcome {
        self.run_at(messenger, chat_id, request, Utc::now()).await
    }

    pub async fn run_at(
        &self,
        messenger: &dyn MessagingPort,
        chat_id: ChatId,
        request: &SearchRequest,
        now: DateTime<Utc>,
    ) -> SearchOutcome {
        let indicator = match messenger.send_text(chat_id, SEARCHING_MESSAGE).await {
            Ok(m) => Some(m),
            Err(e) => {
                tracing::warn!(chat_id = chat_id.0, error = %e, "failed to send searching indicator");
                None
            }
        };

        let (outcome, reply) = self.search(request, now).await;
        deliver(messenger, chat_id, reply).await;

        if let Some(msg) = indicator {
            retract(messenger, msg).await;
        }

        outcome
    }

    async fn search(&self, request: &SearchRequest, now: DateTime<Utc>) -> (SearchOutcome, Reply) {
        let url = search_url(
            &self.cfg.jackett_url,
            &self.cfg.jackett_api_key,
            &request.query,
        );

        let body = match self.feed.fetch(&url).await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(query = request.query.kind(), error = %e, "indexer fetch failed");
                return (
                    SearchOutcome::FetchFailed,
                    Reply::Text(FETCH_ERROR_MESSAGE.to_string()),
                );
            }
        };

        if body.iter().all(u8::is_ascii_whitespace) {
            tracing::info!(
                query = request.query.kind(),
                golden_popcorn = request.golden_popcorn,
                results = 0,
                "search finished"
            );
            return no_results(request);
        }

        let opts = ParseOptions {
            golden_popcorn: request.golden_popcorn,
            on_bad_item: self.cfg.item_error_policy,
        };
        let results = match parse_feed_at(&body, opts, now) {
            Ok(results) => results,
            Err(e) => {
                tracing::error!(query = request.query.kind(), error = %e, "failed to parse indexer feed");
                return (
                    SearchOutcome::ParseFailed,
                    Reply::Text(PARSE_ERROR_MESSAGE.to_string()),
                );
            }
        };

        tracing::info!(
            query = request.query.kind(),
            golden_popcorn = request.golden_popcorn,
            results = results.len(),
            "search finished"
        );

        if results.is_empty() {
            return no_results(request);
        }

        let page = PageRequest {
            title: PAGE_TITLE.to_string(),
            html_content: full_page_html(&results),
            author_name: self.cfg.telegraph_short_name.clone(),
        };
        let page_url = match self.publisher.publish(page).await {
            Ok(url) if !url.trim().is_empty() => url,
            Ok(_) => {
                tracing::warn!("publish returned an empty url");
                return (
                    SearchOutcome::PublishFailed,
                    Reply::Text(PUBLISH_ERROR_MESSAGE.to_string()),
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to publish results page");
                return (
                    SearchOutcome::PublishFailed,
                    Reply::Text(PUBLISH_ERROR_MESSAGE.to_string()),
                );
            }
        };

        let preview = Preview::new(&results, self.cfg.max_results, request.golden_popcorn);
        let outcome = SearchOutcome::Done {
            page_url: page_url.clone(),
            shown: preview.shown.len(),
            total: results.len(),
        };
        (
            outcome,
            Reply::Results {
                html: preview.to_html(),
                page_url,
            },
        )
    }
}

fn no_results(request: &SearchRequest) -> (SearchOutcome, Reply) {
    let text = if request.golden_popcorn {
        format!("{NO_RESULTS_MESSAGE} (with GP)")
    } else {
        NO_RESULTS_MESSAGE.to_string()
    };
    (SearchOutcome::NoResults, Reply::Text(text))
}

async fn deliver(messenger: &dyn MessagingPort, chat_id: ChatId, reply: Reply) {
    let sent = match reply {
        Reply::Text(text) => messenger.send_text(chat_id, &text).await,
        Reply::Results { html, page_url } => {
            messenger
                .send_inline_keyboard(
                    chat_id,
                    &html,
                    InlineKeyboard::single_link(RESULTS_BUTTON_LABEL, page_url),
                )
                .await
        }
    };
    if let Err(e) = sent {
        tracing::error!(chat_id = chat_id.0, error = %e, "failed to deliver search reply");
    }
}

async fn retract(messenger: &dyn MessagingPort, msg: MessageRef) {
    if let Err(e) = messenger.delete_message(msg).await {
        tracing::warn!(chat_id = msg.chat_id.0, error = %e, "failed to delete searching indicator");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageId;
    use crate::errors::Error;
    use crate::feed::ItemErrorPolicy;
    use crate::query::SearchQuery;
    use crate::Result;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;
    use std::time::Duration;

    fn cfg(max_results: usize, policy: ItemErrorPolicy) -> Arc<Config> {
        Arc::new(Config {
            telegram_token: "x".to_string(),
            authorized_chat_ids: vec![1],
            owner_id: None,
            jackett_url: "http://jackett:9117".to_string(),
            jackett_api_key: "secret".to_string(),
            max_results,
            item_error_policy: policy,
            telegraph_api_url: "http://telegraph".to_string(),
            telegraph_short_name: "JackettSearchBot".to_string(),
            http_timeout: Duration::from_secs(1),
            liveness_url: "http://site".to_string(),
            liveness_timeout: Duration::from_secs(1),
        })
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn feed_xml(titles: &[&str]) -> Vec<u8> {
        let items = titles
            .iter()
            .map(|t| {
                format!(
                    "<item><title>{t}</title><size>1073741824</size><pubDate>Sun, 10 Mar 2024 09:00:00 +0000</pubDate></item>"
                )
            })
            .collect::<String>();
        format!("<rss><channel>{items}</channel></rss>").into_bytes()
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum Sent {
        Text(String),
        Keyboard(String, InlineKeyboard),
        Delete(MessageRef),
    }

    #[derive(Default)]
    struct FakeMessenger {
        next_id: Mutex<i32>,
        log: Mutex<Vec<Sent>>,
    }

    impl FakeMessenger {
        fn alloc(&self, chat_id: ChatId) -> MessageRef {
            let mut guard = self.next_id.lock().unwrap();
            *guard += 1;
            MessageRef {
                chat_id,
                message_id: MessageId(*guard),
            }
        }

        fn log(&self) -> Vec<Sent> {
            self.log.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessagingPort for FakeMessenger {
        async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
            self.log.lock().unwrap().push(Sent::Text(text.to_string()));
            Ok(self.alloc(chat_id))
        }

        async fn delete_message(&self, msg: MessageRef) -> Result<()> {
            self.log.lock().unwrap().push(Sent::Delete(msg));
            Ok(())
        }

        async fn send_inline_keyboard(
            &self,
            chat_id: ChatId,
            html: &str,
            keyboard: InlineKeyboard,
        ) -> Result<MessageRef> {
            self.log
                .lock()
                .unwrap()
                .push(Sent::Keyboard(html.to_string(), keyboard));
            Ok(self.alloc(chat_id))
        }
    }

    struct FakeFeed {
        body: Result<Vec<u8>>,
        urls: Mutex<Vec<String>>,
    }

    impl FakeFeed {
        fn ok(body: Vec<u8>) -> Self {
            Self {
                body: Ok(body),
                urls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                body: Err(Error::Transport("indexer returned 502".to_string())),
                urls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl FeedSource for FakeFeed {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.urls.lock().unwrap().push(url.to_string());
            match &self.body {
                Ok(b) => Ok(b.clone()),
                Err(e) => Err(Error::Transport(e.to_string())),
            }
        }
    }

    struct FakePublisher {
        url: Option<String>,
        pages: Mutex<Vec<PageRequest>>,
    }

    impl FakePublisher {
        fn returning(url: Option<&str>) -> Self {
            Self {
                url: url.map(str::to_string),
                pages: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.pages.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PagePublisher for FakePublisher {
        async fn publish(&self, page: PageRequest) -> Result<String> {
            self.pages.lock().unwrap().push(page);
            self.url
                .clone()
                .ok_or_else(|| Error::PublishFailure("no url in response".to_string()))
        }
    }

    fn request(query: &str, golden_popcorn: bool) -> SearchRequest {
        SearchRequest {
            query: SearchQuery::parse(query),
            golden_popcorn,
        }
    }

    fn indicator() -> Sent {
        Sent::Delete(MessageRef {
            chat_id: ChatId(7),
            message_id: MessageId(1),
        })
    }

    async fn run(
        feed: Arc<FakeFeed>,
        publisher: Arc<FakePublisher>,
        req: &SearchRequest,
        max_results: usize,
    ) -> (SearchOutcome, Vec<Sent>) {
        let service = SearchService::new(
            cfg(max_results, ItemErrorPolicy::Abort),
            feed,
            publisher,
        );
        let messenger = FakeMessenger::default();
        let outcome = service.run_at(&messenger, ChatId(7), req, now()).await;
        (outcome, messenger.log())
    }

    #[tokio::test]
    async fn publishes_full_list_and_replies_with_preview() {
        let feed = Arc::new(FakeFeed::ok(feed_xml(&["A", "B", "C", "D", "E"])));
        let publisher = Arc::new(FakePublisher::returning(Some("https://telegra.ph/x-01")));

        let (outcome, log) = run(feed.clone(), publisher.clone(), &request("the matrix", false), 2).await;

        assert_eq!(
            outcome,
            SearchOutcome::Done {
                page_url: "https://telegra.ph/x-01".to_string(),
                shown: 2,
                total: 5,
            }
        );
        assert_eq!(
            feed.urls.lock().unwrap()[0],
            "http://jackett:9117/api/v2.0/indexers/all/results/torznab/api?apikey=secret&t=search&q=the%20matrix"
        );

        let pages = publisher.pages.lock().unwrap().clone();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].title, "Search Results");
        assert_eq!(pages[0].author_name, "JackettSearchBot");
        assert_eq!(pages[0].html_content.matches("Title: ").count(), 5);

        assert_eq!(log.len(), 3);
        assert_eq!(log[0], Sent::Text(SEARCHING_MESSAGE.to_string()));
        let Sent::Keyboard(html, keyboard) = &log[1] else {
            panic!("expected keyboard reply, got {:?}", log[1]);
        };
        assert_eq!(html.matches("<b>Title:</b>").count(), 2);
        assert!(html.contains("<b>Age:</b> 3 h"));
        assert!(html.contains("<b>Size:</b> 1 GB"));
        assert!(html.ends_with("+3 <b>More Results..</b>"));
        assert_eq!(
            keyboard,
            &InlineKeyboard::single_link("RESULTS", "https://telegra.ph/x-01")
        );
        assert_eq!(log[2], indicator());
    }

    #[tokio::test]
    async fn empty_feed_skips_publish() {
        let feed = Arc::new(FakeFeed::ok(feed_xml(&[])));
        let publisher = Arc::new(FakePublisher::returning(Some("https://telegra.ph/x")));

        let (outcome, log) = run(feed, publisher.clone(), &request("nothing", false), 10).await;

        assert_eq!(outcome, SearchOutcome::NoResults);
        assert_eq!(publisher.calls(), 0);
        assert_eq!(
            log,
            vec![
                Sent::Text(SEARCHING_MESSAGE.to_string()),
                Sent::Text("No Results".to_string()),
                indicator(),
            ]
        );
    }

    #[tokio::test]
    async fn golden_popcorn_filtering_everything_says_so() {
        let feed = Arc::new(FakeFeed::ok(feed_xml(&["Plain 1080p", "Plain 720p"])));
        let publisher = Arc::new(FakePublisher::returning(Some("https://telegra.ph/x")));

        let (outcome, log) = run(feed, publisher.clone(), &request("tt0133093", true), 10).await;

        assert_eq!(outcome, SearchOutcome::NoResults);
        assert_eq!(publisher.calls(), 0);
        assert_eq!(log[1], Sent::Text("No Results (with GP)".to_string()));
        assert_eq!(log[2], indicator());
    }

    #[tokio::test]
    async fn whitespace_body_is_no_results_without_parsing() {
        let feed = Arc::new(FakeFeed::ok(b" \n\t ".to_vec()));
        let publisher = Arc::new(FakePublisher::returning(Some("https://telegra.ph/x")));

        let (outcome, log) = run(feed, publisher.clone(), &request("x", false), 10).await;

        assert_eq!(outcome, SearchOutcome::NoResults);
        assert_eq!(publisher.calls(), 0);
        assert_eq!(log[1], Sent::Text("No Results".to_string()));
        assert_eq!(log[2], indicator());
    }

    #[tokio::test]
    async fn publish_failure_sends_no_preview() {
        let feed = Arc::new(FakeFeed::ok(feed_xml(&["A"])));
        let publisher = Arc::new(FakePublisher::returning(None));

        let (outcome, log) = run(feed, publisher.clone(), &request("x", false), 10).await;

        assert_eq!(outcome, SearchOutcome::PublishFailed);
        assert_eq!(publisher.calls(), 1);
        assert_eq!(
            log,
            vec![
                Sent::Text(SEARCHING_MESSAGE.to_string()),
                Sent::Text("Telegraph Error".to_string()),
                indicator(),
            ]
        );
    }

    #[tokio::test]
    async fn blank_publish_url_counts_as_failure() {
        let feed = Arc::new(FakeFeed::ok(feed_xml(&["A"])));
        let publisher = Arc::new(FakePublisher::returning(Some("  ")));

        let (outcome, _) = run(feed, publisher, &request("x", false), 10).await;
        assert_eq!(outcome, SearchOutcome::PublishFailed);
    }

    #[tokio::test]
    async fn fetch_failure_reports_http_error() {
        let feed = Arc::new(FakeFeed::failing());
        let publisher = Arc::new(FakePublisher::returning(Some("https://telegra.ph/x")));

        let (outcome, log) = run(feed, publisher.clone(), &request("x", false), 10).await;

        assert_eq!(outcome, SearchOutcome::FetchFailed);
        assert_eq!(publisher.calls(), 0);
        assert_eq!(log[1], Sent::Text("HTTP Error Occurred".to_string()));
        assert_eq!(log[2], indicator());
    }

    #[tokio::test]
    async fn malformed_feed_reports_unexpected_error() {
        let feed = Arc::new(FakeFeed::ok(b"<rss><channel><item>".to_vec()));
        let publisher = Arc::new(FakePublisher::returning(Some("https://telegra.ph/x")));

        let (outcome, log) = run(feed, publisher.clone(), &request("x", false), 10).await;

        assert_eq!(outcome, SearchOutcome::ParseFailed);
        assert_eq!(publisher.calls(), 0);
        assert_eq!(log[1], Sent::Text("Unexpected Error Occurred".to_string()));
        assert_eq!(log[2], indicator());
    }

    #[tokio::test]
    async fn skip_policy_publishes_the_good_items() {
        let xml = br#"<rss><channel>
            <item><title>Good</title><size>10</size><pubDate>Sun, 10 Mar 2024 11:00:00 +0000</pubDate></item>
            <item><title>Bad</title><size>?</size><pubDate>Sun, 10 Mar 2024 11:00:00 +0000</pubDate></item>
        </channel></rss>"#;
        let service = SearchService::new(
            cfg(10, ItemErrorPolicy::Skip),
            Arc::new(FakeFeed::ok(xml.to_vec())),
            Arc::new(FakePublisher::returning(Some("https://telegra.ph/x"))),
        );
        let messenger = FakeMessenger::default();

        let outcome = service
            .run_at(&messenger, ChatId(7), &request("x", false), now())
            .await;

        assert_eq!(
            outcome,
            SearchOutcome::Done {
                page_url: "https://telegra.ph/x".to_string(),
                shown: 1,
                total: 1,
            }
        );
    }

    #[tokio::test]
    async fn same_feed_renders_identically_twice() {
        let xml = feed_xml(&["A", "B", "C"]);
        let publisher = Arc::new(FakePublisher::returning(Some("https://telegra.ph/x")));

        let req = request("x", false);

        let (_, first) = run(Arc::new(FakeFeed::ok(xml.clone())), publisher.clone(), &req, 2).await;
        let (_, second) = run(Arc::new(FakeFeed::ok(xml)), publisher.clone(), &req, 2).await;

        assert_eq!(first, second);
        assert!(matches!(first[1], Sent::Keyboard(..)));
        let pages = publisher.pages.lock().unwrap().clone();
        assert_eq!(pages[0], pages[1]);
    }
}
