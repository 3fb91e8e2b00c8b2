use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::env;

use crate::utils;

pub use content_interfaces::richtext::RichTextBlock;
pub use content_interfaces::{Cursor, Ordering, Predicate, QueryOptions, QueryResponse, RawRecord};

/// Display-ready entry of the article listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub id: String,
    pub publication_date: Option<DateTime<Utc>>,
    pub title: String,
    pub subtitle: String,
    pub author_name: String,
}

impl ArticleSummary {
    /// Publication date formatted for display. Formatting happens here, at
    /// render time, so the stored timestamp stays canonical across merges.
    pub fn display_date(&self) -> Option<String> {
        self.publication_date.as_ref().map(utils::time::format_publication_date)
    }

    pub fn href(&self) -> String {
        utils::url::post_href(&self.id)
    }
}

/// Accumulated listing state: everything loaded so far plus the cursor to the next page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedPage {
    pub items: Vec<ArticleSummary>,
    pub next_cursor: Option<Cursor>,
}

impl FeedPage {
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    pub body: Vec<RichTextBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub publication_date: Option<DateTime<Utc>>,
    pub title: String,
    pub subtitle: Option<String>,
    pub banner_image_url: Option<String>,
    pub author_name: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacentArticle {
    pub id: String,
    pub title: String,
}

impl AdjacentArticle {
    pub fn href(&self) -> String {
        utils::url::post_href(&self.id)
    }
}

/// Chronological neighbours of an article. `previous` is the nearest earlier
/// publication, `next` the nearest later one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacentLinks {
    pub previous: Option<AdjacentArticle>,
    pub next: Option<AdjacentArticle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedSection {
    pub heading: String,
    pub html: String,
}

/// Fully resolved article page: nothing in here needs another store round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleView {
    pub article: Article,
    pub adjacent: AdjacentLinks,
    pub reading_time_minutes: u32,
    pub formatted_date: Option<String>,
    pub rendered_sections: Vec<RenderedSection>,
}

impl ArticleView {
    pub fn reading_time_label(&self) -> String {
        utils::text::format_reading_time(self.reading_time_minutes)
    }
}

/// Outcome of resolving an article route.
#[derive(Debug, Clone, PartialEq)]
pub enum ArticleState {
    Ready(Box<ArticleView>),
    NotFound,
}

#[derive(Debug, Clone)]
pub struct ReaderConfig {
    pub api_endpoint: String,
    pub access_token: Option<String>,
    pub document_type: String,
    pub page_size: usize,
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_response_size_mb: usize,
    pub words_per_minute: usize,
    pub enumeration_page_size: usize,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

pub const DEFAULT_API_ENDPOINT: &str = "https://spacetraveling.cdn.prismic.io/api/v2";

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            access_token: None,
            document_type: "posts".to_string(),
            page_size: 2,
            user_agent: "Spacetraveling-Reader/1.0".to_string(),
            timeout_seconds: 30,
            max_response_size_mb: 10,
            words_per_minute: 200,
            enumeration_page_size: 100,
            max_retries: 3,
            retry_delay_ms: 500,
        }
    }
}

impl ReaderConfig {
    /// Defaults overridden by `PRISMIC_API_ENDPOINT`, `PRISMIC_ACCESS_TOKEN`,
    /// `BLOG_DOCUMENT_TYPE` and `BLOG_PAGE_SIZE`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_endpoint: env::var("PRISMIC_API_ENDPOINT").unwrap_or(defaults.api_endpoint),
            access_token: env::var("PRISMIC_ACCESS_TOKEN").ok().filter(|token| !token.is_empty()),
            document_type: env::var("BLOG_DOCUMENT_TYPE").unwrap_or(defaults.document_type),
            page_size: env::var("BLOG_PAGE_SIZE")
                .ok()
                .and_then(|size| size.parse().ok())
                .filter(|size| *size > 0)
                .unwrap_or(defaults.page_size),
            ..defaults
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("Document not found: {uid}")]
    NotFound { uid: String },

    #[error("No more content to load")]
    NoMoreContent,

    #[error("Content store unavailable: {0}")]
    Unavailable(String),

    #[error("Response size exceeds limit: {size_mb}MB")]
    ResponseTooLarge { size_mb: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(String),
}

impl ReaderError {
    /// Errors worth retrying: network failures, server-side statuses, outages.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Unavailable(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReaderError>;
