#![allow(dead_code)]

use async_trait::async_trait;
use blog_reader::{ContentStore, Cursor, Predicate, QueryOptions, QueryResponse, RawRecord, ReaderConfig, Result};
use serde_json::{json, Value};
use std::sync::Once;
use std::time::Duration;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .try_init()
            .ok();
    });
}

pub fn test_config() -> ReaderConfig {
    ReaderConfig {
        api_endpoint: "http://localhost/api/v2".to_string(),
        retry_delay_ms: 1,
        ..ReaderConfig::default()
    }
}

/// A `posts` document published at `date` (store format), with one paragraph per body.
pub fn post(uid: &str, title: &str, date: &str, bodies: &[&str]) -> RawRecord {
    let content: Vec<Value> = bodies
        .iter()
        .enumerate()
        .map(|(i, text)| {
            json!({
                "heading": format!("Seção {}", i + 1),
                "body": [{ "type": "paragraph", "text": text, "spans": [] }]
            })
        })
        .collect();

    serde_json::from_value(json!({
        "id": format!("id-{uid}"),
        "uid": uid,
        "type": "posts",
        "first_publication_date": date,
        "last_publication_date": date,
        "tags": [],
        "data": {
            "title": title,
            "subtitle": format!("Sobre {title}"),
            "author": "Joseph Oliveira",
            "banner": { "url": format!("https://images.prismic.io/spacetraveling/{uid}.png") },
            "content": content
        }
    }))
    .expect("valid test record")
}

/// Six posts published on consecutive days, `post-1` oldest.
pub fn six_posts() -> Vec<RawRecord> {
    (1..=6)
        .map(|day| {
            post(
                &format!("post-{day}"),
                &format!("Post {day}"),
                &format!("2021-03-{:02}T10:00:00+0000", day),
                &["Lorem ipsum dolor sit amet"],
            )
        })
        .collect()
}

pub fn words(count: usize) -> String {
    vec!["palavra"; count].join(" ")
}

/// Wraps a store and delays every call, so overlapping requests can be observed.
pub struct SlowStore<S> {
    pub inner: S,
    pub delay: Duration,
}

#[async_trait]
impl<S: ContentStore> ContentStore for SlowStore<S> {
    fn store_name(&self) -> String {
        format!("Slow {}", self.inner.store_name())
    }

    async fn query(&self, predicates: &[Predicate], options: &QueryOptions) -> Result<QueryResponse> {
        tokio::time::sleep(self.delay).await;
        self.inner.query(predicates, options).await
    }

    async fn fetch_page(&self, cursor: &Cursor) -> Result<QueryResponse> {
        tokio::time::sleep(self.delay).await;
        self.inner.fetch_page(cursor).await
    }

    async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<Option<RawRecord>> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_by_uid(document_type, uid).await
    }
}
