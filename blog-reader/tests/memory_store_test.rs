mod common;

use blog_reader::{
    ContentStore, Cursor, InMemoryStore, Ordering, Predicate, QueryOptions, ReaderError, ReaderConfig,
};
use common::{init_tracing, post, six_posts, test_config};
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;

#[tokio::test]
async fn test_query_filters_orders_and_pages() {
    init_tracing();

    let store = InMemoryStore::new(six_posts());
    let predicates = [Predicate::document_type("posts")];
    let options = QueryOptions::new()
        .with_page_size(4)
        .ordered_by(Ordering::ascending("document.first_publication_date"));

    let first = store.query(&predicates, &options).await.expect("query");
    assert_eq!(first.page, 1);
    assert_eq!(first.total_pages, 2);
    assert_eq!(first.total_results_size, 6);
    assert_eq!(first.results[0].identifier(), "post-1");

    let cursor = first.next_cursor().expect("cursor");
    assert!(cursor.as_str().starts_with("memory:"));

    let second = store.fetch_page(&cursor).await.expect("second page");
    assert_eq!(second.page, 2);
    let ids: Vec<&str> = second.results.iter().map(|record| record.identifier()).collect();
    assert_eq!(ids, vec!["post-5", "post-6"]);
    assert!(second.next_cursor().is_none());
}

#[tokio::test]
async fn test_field_predicates_and_uid_lookup() {
    init_tracing();

    let store = InMemoryStore::new(six_posts());

    let by_title = store
        .query(&[Predicate::at("my.posts.title", "Post 3")], &QueryOptions::new())
        .await
        .expect("query");
    assert_eq!(by_title.results.len(), 1);
    assert_eq!(by_title.results[0].identifier(), "post-3");

    let record = store.get_by_uid("posts", "post-2").await.expect("lookup");
    assert_eq!(record.map(|r| r.id), Some("id-post-2".to_string()));
    assert!(store.get_by_uid("pages", "post-2").await.expect("lookup").is_none());
    assert_eq!(store.request_count(), 3);
}

#[tokio::test]
async fn test_bad_cursor_is_rejected() {
    init_tracing();

    let store = InMemoryStore::new(six_posts());
    let result = store.fetch_page(&Cursor::new("https://blog.cdn.prismic.io/page/2")).await;
    assert!(matches!(result, Err(ReaderError::InvalidCursor(_))));
}

#[tokio::test]
async fn test_loads_fixture_files() {
    init_tracing();

    let records = vec![
        post("a", "A", "2021-03-01T10:00:00+0000", &["um"]),
        post("b", "B", "2021-03-02T10:00:00+0000", &["dois"]),
    ];

    let mut array_file = NamedTempFile::new().expect("temp file");
    write!(array_file, "{}", serde_json::to_string(&records).expect("json")).expect("write");
    let store = InMemoryStore::from_json_file(array_file.path()).expect("array fixture");
    assert_eq!(store.len(), 2);

    let mut response_file = NamedTempFile::new().expect("temp file");
    write!(
        response_file,
        "{}",
        json!({ "page": 1, "next_page": null, "results": records })
    )
    .expect("write");
    let store = InMemoryStore::from_json_file(response_file.path()).expect("response fixture");
    assert_eq!(store.len(), 2);

    let config = ReaderConfig { page_size: 1, ..test_config() };
    let session = blog_reader::FeedSession::open(blog_reader::FeedPaginator::new(std::sync::Arc::new(store), &config))
        .await
        .expect("open");
    assert_eq!(session.snapshot().await.items[0].id, "b");

    let mut broken = NamedTempFile::new().expect("temp file");
    write!(broken, "{{ not json").expect("write");
    assert!(matches!(InMemoryStore::from_json_file(broken.path()), Err(ReaderError::Parse(_))));

    assert!(matches!(
        InMemoryStore::from_json_file("/definitely/not/here.json"),
        Err(ReaderError::Io(_))
    ));
}
