use crate::parser::RecordParser;
use crate::traits::ContentStore;
use crate::types::{
    AdjacentArticle, AdjacentLinks, ArticleState, ArticleView, Ordering, Predicate, QueryOptions, ReaderConfig,
    ReaderError, RenderedSection, Result, Section,
};
use crate::utils;
use chrono::{DateTime, Utc};
use content_interfaces::defs::FIRST_PUBLICATION_DATE;
use content_interfaces::richtext::{self, LinkData, LinkResolver};
use std::sync::Arc;
use tracing::{debug, info};

/// Resolves document links to article routes and web links to their URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostLinkResolver;

impl LinkResolver for PostLinkResolver {
    fn resolve(&self, link: &LinkData) -> Option<String> {
        match link.link_type.as_deref() {
            Some("Document") => link.uid.as_deref().map(utils::url::post_href),
            _ => link.url.clone(),
        }
    }
}

/// Builds the article page: the document, its neighbours, reading time,
/// display date and rendered sections.
pub struct DocumentAssembler {
    store: Arc<dyn ContentStore>,
    document_type: String,
    words_per_minute: usize,
}

impl DocumentAssembler {
    pub fn new(store: Arc<dyn ContentStore>, config: &ReaderConfig) -> Self {
        Self {
            store,
            document_type: config.document_type.clone(),
            words_per_minute: config.words_per_minute,
        }
    }

    pub async fn fetch_article(&self, uid: &str) -> Result<ArticleView> {
        let record = self
            .store
            .get_by_uid(&self.document_type, uid)
            .await?
            .ok_or_else(|| ReaderError::NotFound { uid: uid.to_string() })?;

        let article = RecordParser::article(&record);
        let adjacent = self.adjacent_links(article.publication_date).await?;
        let reading_time_minutes = reading_time(&article.sections, self.words_per_minute);
        let formatted_date = article
            .publication_date
            .as_ref()
            .map(utils::time::format_publication_date);
        let rendered_sections = render_sections(&article.sections);

        info!(
            "Assembled article {} ({} sections, {} min, previous: {}, next: {})",
            article.id,
            article.sections.len(),
            reading_time_minutes,
            adjacent.previous.is_some(),
            adjacent.next.is_some()
        );

        Ok(ArticleView {
            article,
            adjacent,
            reading_time_minutes,
            formatted_date,
            rendered_sections,
        })
    }

    /// Article state for a route: missing documents become `NotFound`, other errors propagate.
    pub async fn resolve(&self, uid: &str) -> Result<ArticleState> {
        match self.fetch_article(uid).await {
            Ok(view) => Ok(ArticleState::Ready(Box::new(view))),
            Err(ReaderError::NotFound { uid }) => {
                info!("Article {} not found", uid);
                Ok(ArticleState::NotFound)
            }
            Err(e) => Err(e),
        }
    }

    async fn adjacent_links(&self, published: Option<DateTime<Utc>>) -> Result<AdjacentLinks> {
        let Some(published) = published else {
            debug!("Unpublished document has no neighbours");
            return Ok(AdjacentLinks::default());
        };

        let next = self
            .nearest(
                Predicate::published_after(published),
                Ordering::ascending(FIRST_PUBLICATION_DATE),
            )
            .await?;
        let previous = self
            .nearest(
                Predicate::published_before(published),
                Ordering::descending(FIRST_PUBLICATION_DATE),
            )
            .await?;

        Ok(AdjacentLinks { previous, next })
    }

    async fn nearest(&self, bound: Predicate, ordering: Ordering) -> Result<Option<AdjacentArticle>> {
        let predicates = [Predicate::document_type(&self.document_type), bound];
        let options = QueryOptions::new()
            .with_fetch([format!("{}.title", self.document_type)])
            .with_page_size(1)
            .ordered_by(ordering);

        let response = self.store.query(&predicates, &options).await?;
        Ok(response.results.first().map(RecordParser::adjacent))
    }
}

/// Reading time over all sections: total word count divided by the reading
/// speed, rounded up.
pub fn reading_time(sections: &[Section], words_per_minute: usize) -> u32 {
    let words: usize = sections
        .iter()
        .map(|section| utils::text::word_count(&richtext::as_text(&section.body)))
        .sum();
    utils::text::reading_time_minutes(words, words_per_minute)
}

pub fn render_sections(sections: &[Section]) -> Vec<RenderedSection> {
    sections
        .iter()
        .map(|section| RenderedSection {
            heading: section.heading.clone(),
            html: richtext::as_html(&section.body, &PostLinkResolver),
        })
        .collect()
}
