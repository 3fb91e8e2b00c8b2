use crate::traits::ContentStore;
use crate::types::{Cursor, Predicate, QueryOptions, QueryResponse, RawRecord, ReaderError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use content_interfaces::defs::{DOCUMENT_ID, DOCUMENT_TYPE, FIRST_PUBLICATION_DATE};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering as CmpOrdering;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use tracing::{debug, info};

const CURSOR_SCHEME: &str = "memory:";
const DEFAULT_PAGE_SIZE: usize = 20;
const LAST_PUBLICATION_DATE: &str = "document.last_publication_date";

#[derive(Debug, Serialize, Deserialize)]
struct PageToken {
    predicates: Vec<Predicate>,
    options: QueryOptions,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Fixture {
    Records(Vec<RawRecord>),
    Response(QueryResponse),
}

/// Content store holding its documents in memory. Used for offline runs and tests.
pub struct InMemoryStore {
    records: Vec<RawRecord>,
    available: AtomicBool,
    requests: AtomicUsize,
}

impl InMemoryStore {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self {
            records,
            available: AtomicBool::new(true),
            requests: AtomicUsize::new(0),
        }
    }

    /// Loads documents from a JSON file holding either an array of documents
    /// or a saved search response.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let records = match serde_json::from_str::<Fixture>(&content)
            .map_err(|e| ReaderError::Parse(format!("Invalid fixture {}: {}", path.display(), e)))?
        {
            Fixture::Records(records) => records,
            Fixture::Response(response) => response.results,
        };
        info!("Loaded {} documents from {}", records.len(), path.display());
        Ok(Self::new(records))
    }

    /// Simulates an outage: while unavailable every request fails.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, AtomicOrdering::SeqCst);
    }

    /// Number of requests served or refused so far.
    pub fn request_count(&self) -> usize {
        self.requests.load(AtomicOrdering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn begin_request(&self) -> Result<()> {
        self.requests.fetch_add(1, AtomicOrdering::SeqCst);
        if self.available.load(AtomicOrdering::SeqCst) {
            Ok(())
        } else {
            Err(ReaderError::Unavailable("in-memory store switched off".to_string()))
        }
    }

    fn run(&self, predicates: &[Predicate], options: &QueryOptions) -> Result<QueryResponse> {
        let mut matching: Vec<&RawRecord> = self
            .records
            .iter()
            .filter(|record| predicates.iter().all(|predicate| matches(record, predicate)))
            .collect();

        matching.sort_by(|a, b| {
            options
                .orderings
                .iter()
                .map(|ordering| {
                    let order = compare_field(a, b, &ordering.field);
                    if ordering.descending {
                        order.reverse()
                    } else {
                        order
                    }
                })
                .find(|order| *order != CmpOrdering::Equal)
                .unwrap_or(CmpOrdering::Equal)
        });

        let page_size = options.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let page = options.page.unwrap_or(1).max(1);
        let total = matching.len();
        let total_pages = total.div_ceil(page_size);

        let results: Vec<RawRecord> = matching
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .cloned()
            .collect();

        let next_page = if page < total_pages {
            let token = PageToken {
                predicates: predicates.to_vec(),
                options: options.clone().with_page(page + 1),
            };
            Some(format!("{}{}", CURSOR_SCHEME, serde_json::to_string(&token)?))
        } else {
            None
        };

        debug!("In-memory query matched {} documents, page {}/{}", total, page, total_pages);

        Ok(QueryResponse {
            page: page as u32,
            results_per_page: page_size as u32,
            total_results_size: total as u32,
            total_pages: total_pages as u32,
            next_page,
            results,
        })
    }
}

#[async_trait]
impl ContentStore for InMemoryStore {
    fn store_name(&self) -> String {
        format!("In-memory ({} documents)", self.records.len())
    }

    async fn query(&self, predicates: &[Predicate], options: &QueryOptions) -> Result<QueryResponse> {
        self.begin_request()?;
        self.run(predicates, options)
    }

    async fn fetch_page(&self, cursor: &Cursor) -> Result<QueryResponse> {
        self.begin_request()?;
        let token: PageToken = cursor
            .as_str()
            .strip_prefix(CURSOR_SCHEME)
            .and_then(|json| serde_json::from_str(json).ok())
            .ok_or_else(|| ReaderError::InvalidCursor(cursor.to_string()))?;
        self.run(&token.predicates, &token.options)
    }

    async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<Option<RawRecord>> {
        self.begin_request()?;
        Ok(self
            .records
            .iter()
            .find(|record| record.document_type == document_type && record.uid.as_deref() == Some(uid))
            .cloned())
    }
}

fn matches(record: &RawRecord, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::At { field, value } => text_value(record, field).as_deref() == Some(value.as_str()),
        Predicate::DateAfter { field, date } => date_value(record, field).is_some_and(|d| d > *date),
        Predicate::DateBefore { field, date } => date_value(record, field).is_some_and(|d| d < *date),
    }
}

fn text_value(record: &RawRecord, field: &str) -> Option<String> {
    match field {
        DOCUMENT_TYPE => Some(record.document_type.clone()),
        DOCUMENT_ID => Some(record.id.clone()),
        _ => {
            // my.<type>.<field>
            let mut parts = field.splitn(3, '.');
            match (parts.next(), parts.next(), parts.next()) {
                (Some("my"), Some(document_type), Some(name)) if document_type == record.document_type => {
                    if name == "uid" {
                        record.uid.clone()
                    } else {
                        record.text_field(name)
                    }
                }
                _ => None,
            }
        }
    }
}

fn date_value(record: &RawRecord, field: &str) -> Option<DateTime<Utc>> {
    match field {
        FIRST_PUBLICATION_DATE => record.first_publication_date,
        LAST_PUBLICATION_DATE => record.last_publication_date,
        _ => None,
    }
}

fn compare_field(a: &RawRecord, b: &RawRecord, field: &str) -> CmpOrdering {
    match field {
        FIRST_PUBLICATION_DATE | LAST_PUBLICATION_DATE => date_value(a, field).cmp(&date_value(b, field)),
        _ => text_value(a, field).cmp(&text_value(b, field)),
    }
}
