pub mod memory;
pub mod prismic;

pub use memory::InMemoryStore;
pub use prismic::PrismicStore;
