use crate::parser::RecordParser;
use crate::traits::ContentStore;
use crate::types::{FeedPage, Ordering, Predicate, QueryOptions, QueryResponse, ReaderConfig, ReaderError, Result};
use content_interfaces::defs::FIRST_PUBLICATION_DATE;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Loads the article listing page by page.
///
/// The paginator itself is stateless: every call takes the current
/// [`FeedPage`] and returns a new one. Callers that may trigger loads
/// concurrently should go through [`FeedSession`].
#[derive(Clone)]
pub struct FeedPaginator {
    store: Arc<dyn ContentStore>,
    document_type: String,
    page_size: usize,
}

impl FeedPaginator {
    pub fn new(store: Arc<dyn ContentStore>, config: &ReaderConfig) -> Self {
        Self {
            store,
            document_type: config.document_type.clone(),
            page_size: config.page_size.max(1),
        }
    }

    /// First page of articles, newest first.
    pub async fn initial_load(&self) -> Result<FeedPage> {
        let predicates = [Predicate::document_type(&self.document_type)];
        let options = QueryOptions::new()
            .with_fetch(RecordParser::summary_fetch_fields(&self.document_type))
            .with_page_size(self.page_size)
            .ordered_by(Ordering::descending(FIRST_PUBLICATION_DATE));

        let response = self.store.query(&predicates, &options).await?;
        let page = Self::fold_page(FeedPage::default(), response);
        info!(
            "Loaded {} articles from {} (more: {})",
            page.len(),
            self.store.store_name(),
            page.has_more()
        );
        Ok(page)
    }

    /// Fetches the page after `current` and appends it.
    ///
    /// Returns [`ReaderError::NoMoreContent`] without any store request when
    /// `current` has no cursor.
    pub async fn load_more(&self, current: &FeedPage) -> Result<FeedPage> {
        let cursor = current.next_cursor.as_ref().ok_or(ReaderError::NoMoreContent)?;
        debug!("Loading more articles from cursor {}", cursor);

        let response = self.store.fetch_page(cursor).await?;
        let next = Self::fold_page(current.clone(), response);
        info!(
            "Feed grew from {} to {} articles (more: {})",
            current.len(),
            next.len(),
            next.has_more()
        );
        Ok(next)
    }

    /// Appends a fetched page to the accumulated one. The cursor is always
    /// replaced by the one the store reported for this page.
    pub fn fold_page(current: FeedPage, response: QueryResponse) -> FeedPage {
        let next_cursor = response.next_cursor();
        let mut items = current.items;
        items.extend(RecordParser::summaries(&response.results));
        FeedPage { items, next_cursor }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was appended with this many articles.
    Loaded(usize),
    /// Another load is still in flight; nothing was fetched.
    Busy,
    /// The feed has no further pages; nothing was fetched.
    Exhausted,
}

/// View-local feed state with a single-flight gate around `load_more`.
pub struct FeedSession {
    paginator: FeedPaginator,
    page: RwLock<FeedPage>,
    in_flight: AtomicBool,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, AtomicOrdering::Release);
    }
}

impl FeedSession {
    pub async fn open(paginator: FeedPaginator) -> Result<Self> {
        let page = paginator.initial_load().await?;
        Ok(Self::from_page(paginator, page))
    }

    pub fn from_page(paginator: FeedPaginator, page: FeedPage) -> Self {
        Self {
            paginator,
            page: RwLock::new(page),
            in_flight: AtomicBool::new(false),
        }
    }

    pub async fn snapshot(&self) -> FeedPage {
        self.page.read().await.clone()
    }

    /// True while a load is pending; the trigger should be disabled.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(AtomicOrdering::Acquire)
    }

    /// False once the cursor is gone; the trigger should be hidden.
    pub async fn can_load_more(&self) -> bool {
        self.page.read().await.has_more()
    }

    pub async fn load_more(&self) -> Result<LoadOutcome> {
        if self
            .in_flight
            .compare_exchange(false, true, AtomicOrdering::AcqRel, AtomicOrdering::Acquire)
            .is_err()
        {
            debug!("Load already in flight, ignoring trigger");
            return Ok(LoadOutcome::Busy);
        }
        let _gate = InFlight(&self.in_flight);

        let current = self.snapshot().await;
        match self.paginator.load_more(&current).await {
            Ok(next) => {
                let added = next.len() - current.len();
                *self.page.write().await = next;
                Ok(LoadOutcome::Loaded(added))
            }
            Err(ReaderError::NoMoreContent) => Ok(LoadOutcome::Exhausted),
            Err(e) => Err(e),
        }
    }
}
