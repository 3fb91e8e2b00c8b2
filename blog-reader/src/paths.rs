use crate::traits::ContentStore;
use crate::types::{Ordering, Predicate, QueryOptions, ReaderConfig, Result};
use crate::utils;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use content_interfaces::defs::FIRST_PUBLICATION_DATE;
use serde::Serialize;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// How routes missing from the pre-rendered list are served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Fallback {
    /// Render on the first request, holding the response until the page is ready.
    Blocking,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaticPaths {
    pub paths: Vec<String>,
    pub fallback: Fallback,
}

impl StaticPaths {
    pub fn is_prerendered(&self, id: &str) -> bool {
        self.paths.iter().any(|path| path == id)
    }

    pub fn routes(&self) -> Vec<String> {
        self.paths.iter().map(|id| utils::url::post_href(id)).collect()
    }
}

/// Lists every article identifier for pre-rendering.
///
/// Pages are requested by number. A page that still errors after the
/// configured retries is skipped and enumeration resumes with the next one;
/// its articles are served through the fallback. Never fails.
pub async fn enumerate_article_paths(store: &dyn ContentStore, config: &ReaderConfig) -> StaticPaths {
    let predicates = [Predicate::document_type(&config.document_type)];
    let base = QueryOptions::new()
        .with_fetch([format!("{}.title", config.document_type)])
        .with_page_size(config.enumeration_page_size.max(1))
        .ordered_by(Ordering::descending(FIRST_PUBLICATION_DATE));

    let mut seen = HashSet::new();
    let mut paths = Vec::new();
    let mut skipped = Vec::new();
    let mut total_pages = 0;
    let mut page = 1;

    loop {
        let options = base.clone().with_page(page);
        let (predicates, options) = (&predicates, &options);

        let has_next = match with_retry(config, move || store.query(predicates, options)).await {
            Ok(response) => {
                for record in &response.results {
                    let id = record.identifier().to_string();
                    if seen.insert(id.clone()) {
                        paths.push(id);
                    }
                }
                total_pages = total_pages.max(response.total_pages as usize);
                page < total_pages || (response.next_cursor().is_some() && !response.results.is_empty())
            }
            Err(e) if page < total_pages => {
                warn!("Skipping page {} of {} from {}: {}", page, total_pages, store.store_name(), e);
                skipped.push(page);
                true
            }
            Err(e) => {
                warn!("Could not list articles from {} at page {}: {}", store.store_name(), page, e);
                false
            }
        };

        if !has_next {
            break;
        }
        page += 1;
    }

    if skipped.is_empty() {
        info!("Enumerated {} article paths", paths.len());
    } else {
        warn!("Enumerated {} article paths, pages {:?} skipped", paths.len(), skipped);
    }
    StaticPaths { paths, fallback: Fallback::Blocking }
}

/// Runs `operation`, retrying transient failures with exponential backoff.
async fn with_retry<T, F, Fut>(config: &ReaderConfig, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let initial = Duration::from_millis(config.retry_delay_ms);
    let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
        current_interval: initial,
        initial_interval: initial,
        max_interval: initial * 32,
        multiplier: 2.0,
        max_elapsed_time: None,
        ..Default::default()
    };

    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < config.max_retries => {
                attempt += 1;
                let delay = backoff.next_backoff().unwrap_or(initial);
                warn!("Attempt {} failed: {}, retrying in {:?}", attempt, e, delay);
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
