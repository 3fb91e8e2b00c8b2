use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::richtext::{self, RichTextBlock};

pub const DOCUMENT_TYPE: &str = "document.type";
pub const DOCUMENT_ID: &str = "document.id";
pub const FIRST_PUBLICATION_DATE: &str = "document.first_publication_date";

/// Field path of the unique identifier of a custom type, e.g. `my.posts.uid`.
pub fn uid_field(document_type: &str) -> String {
    format!("my.{document_type}.uid")
}

/// One document as returned by the content store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(rename = "type")]
    pub document_type: String,
    #[serde(default, with = "prismic_date")]
    pub first_publication_date: Option<DateTime<Utc>>,
    #[serde(default, with = "prismic_date")]
    pub last_publication_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub data: Value,
}

impl RawRecord {
    /// The routing identifier: the uid when set, the document id otherwise.
    pub fn identifier(&self) -> &str {
        self.uid.as_deref().filter(|uid| !uid.is_empty()).unwrap_or(&self.id)
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Reads a text field that may be stored either as key text or as rich text.
    pub fn text_field(&self, name: &str) -> Option<String> {
        match self.field(name)? {
            Value::String(text) => Some(text.clone()),
            value @ Value::Array(_) => {
                let blocks: Vec<RichTextBlock> = serde_json::from_value(value.clone()).ok()?;
                Some(richtext::as_text(&blocks))
            }
            _ => None,
        }
    }

    /// Looks up a dotted path (`banner.url`) inside the document data.
    pub fn path(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(&self.data, |value, key| value.get(key))
    }
}

/// Opaque position in a paginated result set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Builds a cursor from a store-reported token; empty tokens mean "no more pages".
    pub fn from_token(token: Option<&str>) -> Option<Self> {
        token
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    At { field: String, value: String },
    DateAfter { field: String, date: DateTime<Utc> },
    DateBefore { field: String, date: DateTime<Utc> },
}

impl Predicate {
    pub fn at(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::At { field: field.into(), value: value.into() }
    }

    pub fn document_type(document_type: &str) -> Self {
        Self::at(DOCUMENT_TYPE, document_type)
    }

    pub fn uid(document_type: &str, uid: &str) -> Self {
        Self::at(uid_field(document_type), uid)
    }

    pub fn published_after(date: DateTime<Utc>) -> Self {
        Self::DateAfter { field: FIRST_PUBLICATION_DATE.to_string(), date }
    }

    pub fn published_before(date: DateTime<Utc>) -> Self {
        Self::DateBefore { field: FIRST_PUBLICATION_DATE.to_string(), date }
    }

    /// Renders the predicate in the store's query language, e.g. `[at(document.type, "posts")]`.
    pub fn to_query_fragment(&self) -> String {
        match self {
            Self::At { field, value } => format!("[at({}, \"{}\")]", field, escape_quotes(value)),
            Self::DateAfter { field, date } => {
                format!("[date.after({}, {})]", field, date.timestamp_millis())
            }
            Self::DateBefore { field, date } => {
                format!("[date.before({}, {})]", field, date.timestamp_millis())
            }
        }
    }
}

fn escape_quotes(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Joins predicates into the `q` parameter of a search request.
pub fn query_string(predicates: &[Predicate]) -> String {
    let fragments: String = predicates.iter().map(Predicate::to_query_fragment).collect();
    format!("[{fragments}]")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ordering {
    pub field: String,
    pub descending: bool,
}

impl Ordering {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self { field: field.into(), descending: false }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self { field: field.into(), descending: true }
    }

    pub fn to_query_fragment(&self) -> String {
        if self.descending {
            format!("{} desc", self.field)
        } else {
            self.field.clone()
        }
    }
}

/// Renders orderings as the `orderings` parameter, e.g. `[document.first_publication_date desc]`.
pub fn orderings_string(orderings: &[Ordering]) -> String {
    let fields: Vec<String> = orderings.iter().map(Ordering::to_query_fragment).collect();
    format!("[{}]", fields.join(","))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    #[serde(default)]
    pub fetch: Vec<String>,
    #[serde(default)]
    pub page_size: Option<usize>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub orderings: Vec<Ordering>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fetch(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.fetch = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    pub fn ordered_by(mut self, ordering: Ordering) -> Self {
        self.orderings.push(ordering);
        self
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub results_per_page: u32,
    #[serde(default)]
    pub total_results_size: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub results: Vec<RawRecord>,
}

fn first_page() -> u32 {
    1
}

impl QueryResponse {
    pub fn next_cursor(&self) -> Option<Cursor> {
        Cursor::from_token(self.next_page.as_deref())
    }
}

/// Publication timestamps as written by the store (`2021-03-25T19:25:28+0000`).
/// RFC 3339 input is accepted as well.
pub mod prismic_date {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

    pub fn parse(value: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .or_else(|_| DateTime::parse_from_str(value, FORMAT))
            .ok()
            .map(|date| date.with_timezone(&Utc))
    }

    pub fn format(date: &DateTime<Utc>) -> String {
        date.format(FORMAT).to_string()
    }

    pub fn serialize<S: Serializer>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.serialize_some(&format(date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(value) if value.trim().is_empty() => Ok(None),
            Some(value) => parse(&value)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid publication date: {value}"))),
        }
    }
}
