use crate::types::{AdjacentArticle, Article, ArticleSummary, RawRecord, RichTextBlock, Section};
use content_interfaces::richtext;
use serde_json::Value;
use tracing::{debug, warn};

/// Data fields a listing entry needs; everything else is left out of feed queries.
pub const SUMMARY_FIELDS: [&str; 3] = ["title", "subtitle", "author"];

/// Maps raw store records into the display models.
pub struct RecordParser;

impl RecordParser {
    /// Fully qualified `fetch` field names for a listing query, e.g. `posts.title`.
    pub fn summary_fetch_fields(document_type: &str) -> Vec<String> {
        SUMMARY_FIELDS
            .iter()
            .map(|field| format!("{}.{}", document_type, field))
            .collect()
    }

    pub fn summary(record: &RawRecord) -> ArticleSummary {
        ArticleSummary {
            id: record.identifier().to_string(),
            publication_date: record.first_publication_date,
            title: record.text_field("title").unwrap_or_default(),
            subtitle: record.text_field("subtitle").unwrap_or_default(),
            author_name: record.text_field("author").unwrap_or_default(),
        }
    }

    pub fn summaries(records: &[RawRecord]) -> Vec<ArticleSummary> {
        records.iter().map(Self::summary).collect()
    }

    pub fn adjacent(record: &RawRecord) -> AdjacentArticle {
        AdjacentArticle {
            id: record.identifier().to_string(),
            title: record.text_field("title").unwrap_or_default(),
        }
    }

    pub fn article(record: &RawRecord) -> Article {
        let sections = match record.field("content") {
            Some(Value::Array(items)) => items.iter().map(Self::parse_section).collect(),
            Some(other) => {
                warn!("Document {} has non-list content ({}), rendering no sections", record.id, type_name(other));
                Vec::new()
            }
            None => Vec::new(),
        };

        Article {
            id: record.identifier().to_string(),
            publication_date: record.first_publication_date,
            title: record.text_field("title").unwrap_or_default(),
            subtitle: record.text_field("subtitle").filter(|subtitle| !subtitle.is_empty()),
            banner_image_url: record
                .path("banner.url")
                .and_then(Value::as_str)
                .map(str::to_string),
            author_name: record.text_field("author").unwrap_or_default(),
            sections,
        }
    }

    fn parse_section(item: &Value) -> Section {
        let heading = match item.get("heading") {
            Some(Value::String(heading)) => heading.clone(),
            Some(Value::Array(_)) => richtext::as_text(&Self::parse_blocks(item.get("heading"))),
            _ => String::new(),
        };

        Section {
            heading,
            body: Self::parse_blocks(item.get("body")),
        }
    }

    /// Parses blocks one by one so a single malformed block does not drop the whole body.
    fn parse_blocks(value: Option<&Value>) -> Vec<RichTextBlock> {
        let Some(Value::Array(items)) = value else {
            return Vec::new();
        };

        items
            .iter()
            .filter_map(|item| match serde_json::from_value::<RichTextBlock>(item.clone()) {
                Ok(block) => Some(block),
                Err(e) => {
                    debug!("Skipping malformed rich text block: {}", e);
                    None
                }
            })
            .collect()
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
