mod common;

use async_trait::async_trait;
use blog_reader::{
    ContentStore, Cursor, FeedPage, FeedPaginator, FeedSession, InMemoryStore, LoadOutcome, Predicate, QueryOptions,
    QueryResponse, RawRecord, ReaderConfig, ReaderError, Result,
};
use common::{init_tracing, post, six_posts, test_config, SlowStore};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;

/// Answers the first query and each cursor from canned responses, recording what was asked.
struct ScriptedStore {
    first: QueryResponse,
    pages: Vec<(String, QueryResponse)>,
    seen_cursors: Mutex<Vec<String>>,
}

#[async_trait]
impl ContentStore for ScriptedStore {
    fn store_name(&self) -> String {
        "Scripted".to_string()
    }

    async fn query(&self, _predicates: &[Predicate], _options: &QueryOptions) -> Result<QueryResponse> {
        Ok(self.first.clone())
    }

    async fn fetch_page(&self, cursor: &Cursor) -> Result<QueryResponse> {
        self.seen_cursors.lock().unwrap().push(cursor.to_string());
        self.pages
            .iter()
            .find(|(token, _)| token == cursor.as_str())
            .map(|(_, response)| response.clone())
            .ok_or_else(|| ReaderError::InvalidCursor(cursor.to_string()))
    }

    async fn get_by_uid(&self, _document_type: &str, _uid: &str) -> Result<Option<RawRecord>> {
        Ok(None)
    }
}

fn response(records: Vec<RawRecord>, next_page: Option<&str>) -> QueryResponse {
    QueryResponse {
        page: 1,
        results_per_page: 2,
        total_results_size: 4,
        total_pages: 2,
        next_page: next_page.map(str::to_string),
        results: records,
    }
}

#[tokio::test]
async fn test_load_more_appends_and_hides_trigger() {
    init_tracing();

    let store = Arc::new(ScriptedStore {
        first: response(
            vec![
                post("d", "Post D", "2021-03-04T10:00:00+0000", &[]),
                post("c", "Post C", "2021-03-03T10:00:00+0000", &[]),
            ],
            Some("p2"),
        ),
        pages: vec![(
            "p2".to_string(),
            response(
                vec![
                    post("b", "Post B", "2021-03-02T10:00:00+0000", &[]),
                    post("a", "Post A", "2021-03-01T10:00:00+0000", &[]),
                ],
                None,
            ),
        )],
        seen_cursors: Mutex::new(Vec::new()),
    });
    let paginator = FeedPaginator::new(store.clone(), &test_config());

    let first = paginator.initial_load().await.expect("initial load");
    assert_eq!(first.len(), 2);
    assert!(first.has_more());
    assert_eq!(first.next_cursor, Some(Cursor::new("p2")));

    let second = paginator.load_more(&first).await.expect("load more");
    let ids: Vec<&str> = second.items.iter().map(|item| item.id.as_str()).collect();
    assert_eq!(ids, vec!["d", "c", "b", "a"]);
    assert!(!second.has_more());
    assert_eq!(*store.seen_cursors.lock().unwrap(), vec!["p2".to_string()]);

    // The input page is left untouched.
    assert_eq!(first.len(), 2);

    info!("Scripted pagination completed");
}

#[tokio::test]
async fn test_feed_over_memory_store_is_newest_first_and_monotonic() {
    init_tracing();

    let store = Arc::new(InMemoryStore::new(six_posts()));
    let paginator = FeedPaginator::new(store.clone(), &test_config());

    let mut page = paginator.initial_load().await.expect("initial load");
    assert_eq!(page.items[0].id, "post-6");
    assert_eq!(page.items[0].title, "Post 6");
    assert_eq!(page.items[0].subtitle, "Sobre Post 6");
    assert_eq!(page.items[0].author_name, "Joseph Oliveira");

    let mut previous_ids: Vec<String> = page.items.iter().map(|item| item.id.clone()).collect();
    while page.has_more() {
        page = paginator.load_more(&page).await.expect("load more");
        let ids: Vec<String> = page.items.iter().map(|item| item.id.clone()).collect();
        assert!(ids.len() > previous_ids.len());
        assert_eq!(&ids[..previous_ids.len()], previous_ids.as_slice());
        previous_ids = ids;
    }

    assert_eq!(
        previous_ids,
        vec!["post-6", "post-5", "post-4", "post-3", "post-2", "post-1"]
    );
    assert_eq!(store.request_count(), 3);
}

#[tokio::test]
async fn test_exhausted_feed_makes_no_request() {
    init_tracing();

    let store = Arc::new(InMemoryStore::new(six_posts()));
    let config = ReaderConfig { page_size: 10, ..test_config() };
    let paginator = FeedPaginator::new(store.clone(), &config);

    let page = paginator.initial_load().await.expect("initial load");
    assert_eq!(page.len(), 6);
    assert!(!page.has_more());
    assert_eq!(store.request_count(), 1);

    let result = paginator.load_more(&page).await;
    assert!(matches!(result, Err(ReaderError::NoMoreContent)));
    assert_eq!(store.request_count(), 1);
}

#[tokio::test]
async fn test_empty_store_gives_empty_feed() {
    init_tracing();

    let store = Arc::new(InMemoryStore::new(Vec::new()));
    let paginator = FeedPaginator::new(store, &test_config());

    let page = paginator.initial_load().await.expect("initial load");
    assert!(page.is_empty());
    assert!(!page.has_more());
}

#[test]
fn test_fold_page_replaces_cursor_and_keeps_raw_dates() {
    let current = FeedPage::default();
    let folded = FeedPaginator::fold_page(
        current.clone(),
        response(vec![post("x", "Post X", "2021-03-25T19:25:28+0000", &[])], None),
    );

    assert!(current.is_empty());
    assert_eq!(folded.len(), 1);
    assert_eq!(folded.next_cursor, None);
    assert_eq!(
        folded.items[0].publication_date.map(|date| date.timestamp_millis()),
        Some(1616700328000)
    );
    assert_eq!(folded.items[0].display_date().as_deref(), Some("25 mar 2021"));
    assert_eq!(folded.items[0].href(), "/post/x");

    let with_cursor = FeedPage { next_cursor: Some(Cursor::new("old")), ..folded.clone() };
    let refolded = FeedPaginator::fold_page(with_cursor, response(Vec::new(), Some("new")));
    assert_eq!(refolded.len(), 1);
    assert_eq!(refolded.next_cursor, Some(Cursor::new("new")));
}

#[tokio::test]
async fn test_session_ignores_trigger_while_loading() {
    init_tracing();

    let store = Arc::new(SlowStore {
        inner: InMemoryStore::new(six_posts()),
        delay: Duration::from_millis(50),
    });
    let session = FeedSession::open(FeedPaginator::new(store.clone(), &test_config()))
        .await
        .expect("open session");
    assert!(!session.is_loading());

    let (a, b) = tokio::join!(session.load_more(), session.load_more());
    let outcomes = [a.expect("first trigger"), b.expect("second trigger")];

    assert!(outcomes.contains(&LoadOutcome::Loaded(2)));
    assert!(outcomes.contains(&LoadOutcome::Busy));
    assert_eq!(session.snapshot().await.len(), 4);
    assert_eq!(store.inner.request_count(), 2);
    assert!(!session.is_loading());
}

#[tokio::test]
async fn test_session_reports_exhaustion() {
    init_tracing();

    let store = Arc::new(InMemoryStore::new(six_posts()));
    let config = ReaderConfig { page_size: 4, ..test_config() };
    let session = FeedSession::open(FeedPaginator::new(store.clone(), &config))
        .await
        .expect("open session");

    assert!(session.can_load_more().await);
    assert_eq!(session.load_more().await.expect("load"), LoadOutcome::Loaded(2));
    assert!(!session.can_load_more().await);
    assert_eq!(session.load_more().await.expect("load"), LoadOutcome::Exhausted);
    assert_eq!(store.request_count(), 2);
}

#[tokio::test]
async fn test_failed_load_keeps_page_and_releases_gate() {
    init_tracing();

    let store = Arc::new(InMemoryStore::new(six_posts()));
    let session = FeedSession::open(FeedPaginator::new(store.clone(), &test_config()))
        .await
        .expect("open session");
    let before = session.snapshot().await;

    store.set_available(false);
    let result = session.load_more().await;
    assert!(matches!(result, Err(ReaderError::Unavailable(_))));
    assert_eq!(session.snapshot().await, before);
    assert!(!session.is_loading());

    store.set_available(true);
    assert_eq!(session.load_more().await.expect("retry"), LoadOutcome::Loaded(2));
    assert_eq!(session.snapshot().await.len(), 4);
}
