pub mod types;
pub mod traits;
pub mod fetcher;
pub mod parser;
pub mod sources;
pub mod paginator;
pub mod assembler;
pub mod paths;
pub mod utils;

pub use types::*;
pub use traits::ContentStore;
pub use fetcher::Fetcher;
pub use parser::RecordParser;
pub use sources::{InMemoryStore, PrismicStore};
pub use paginator::{FeedPaginator, FeedSession, LoadOutcome};
pub use assembler::{DocumentAssembler, PostLinkResolver};
pub use paths::{enumerate_article_paths, Fallback, StaticPaths};
