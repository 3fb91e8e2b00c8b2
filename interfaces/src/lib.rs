pub mod defs;
pub mod richtext;

pub use defs::{Cursor, Ordering, Predicate, QueryOptions, QueryResponse, RawRecord};
pub use richtext::{LinkData, LinkResolver, RichTextBlock, Span, SpanKind, WebLinkResolver};
