use crate::fetcher::Fetcher;
use crate::traits::ContentStore;
use crate::types::{Cursor, Predicate, QueryOptions, QueryResponse, RawRecord, ReaderConfig, ReaderError, Result};
use crate::utils;
use async_trait::async_trait;
use content_interfaces::defs::{orderings_string, query_string};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Deserialize)]
struct ApiInfo {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(default, rename = "isMasterRef")]
    is_master_ref: bool,
}

/// Content store backed by the Prismic REST API (v2)
pub struct PrismicStore {
    endpoint: Url,
    access_token: Option<String>,
    fetcher: Fetcher,
    master_ref: RwLock<Option<String>>,
}

impl PrismicStore {
    pub fn new(config: &ReaderConfig) -> Result<Self> {
        if !utils::url::is_valid_api_endpoint(&config.api_endpoint) {
            return Err(ReaderError::General(format!(
                "API endpoint must be an http(s) URL: {}",
                config.api_endpoint
            )));
        }

        Ok(Self {
            endpoint: Url::parse(&config.api_endpoint)?,
            access_token: config.access_token.clone(),
            fetcher: Fetcher::new(config)?,
            master_ref: RwLock::new(None),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn with_access_token(&self, url: &mut Url) {
        if let Some(token) = &self.access_token {
            if !url.query_pairs().any(|(key, _)| key == "access_token") {
                url.query_pairs_mut().append_pair("access_token", token);
            }
        }
    }

    /// The ref of the current published release, looked up once per store.
    async fn master_ref(&self) -> Result<String> {
        {
            let cached = self.master_ref.read().await;
            if let Some(reference) = cached.as_ref() {
                return Ok(reference.clone());
            }
        }

        let mut url = self.endpoint.clone();
        self.with_access_token(&mut url);
        let info: ApiInfo = self.fetcher.get_json(&url).await?;

        let reference = info
            .refs
            .into_iter()
            .find(|api_ref| api_ref.is_master_ref)
            .map(|api_ref| api_ref.reference)
            .ok_or_else(|| ReaderError::Parse(format!("No master ref advertised by {}", self.endpoint)))?;

        info!("Using master ref {} from {}", reference, self.endpoint);
        let mut cached = self.master_ref.write().await;
        *cached = Some(reference.clone());
        Ok(reference)
    }

    fn search_url(&self, reference: &str, predicates: &[Predicate], options: &QueryOptions) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| ReaderError::General(format!("API endpoint cannot be a base URL: {}", self.endpoint)))?
            .pop_if_empty()
            .extend(["documents", "search"]);

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("ref", reference);
            if !predicates.is_empty() {
                pairs.append_pair("q", &query_string(predicates));
            }
            if let Some(page_size) = options.page_size {
                pairs.append_pair("pageSize", &page_size.to_string());
            }
            if let Some(page) = options.page {
                pairs.append_pair("page", &page.to_string());
            }
            if !options.orderings.is_empty() {
                pairs.append_pair("orderings", &orderings_string(&options.orderings));
            }
            if !options.fetch.is_empty() {
                pairs.append_pair("fetch", &options.fetch.join(","));
            }
        }

        self.with_access_token(&mut url);
        Ok(url)
    }
}

#[async_trait]
impl ContentStore for PrismicStore {
    fn store_name(&self) -> String {
        match self.endpoint.host_str() {
            Some(host) => format!("Prismic ({})", host),
            None => "Prismic".to_string(),
        }
    }

    async fn query(&self, predicates: &[Predicate], options: &QueryOptions) -> Result<QueryResponse> {
        let reference = self.master_ref().await?;
        let url = self.search_url(&reference, predicates, options)?;
        let response: QueryResponse = self.fetcher.get_json(&url).await?;
        debug!(
            "Query returned {} of {} results (page {}/{})",
            response.results.len(),
            response.total_results_size,
            response.page,
            response.total_pages
        );
        Ok(response)
    }

    async fn fetch_page(&self, cursor: &Cursor) -> Result<QueryResponse> {
        let mut url = Url::parse(cursor.as_str())
            .map_err(|e| ReaderError::InvalidCursor(format!("{}: {}", cursor, e)))?;

        if !utils::url::same_origin(&url, &self.endpoint) {
            warn!("Refusing cursor outside {}: {}", self.endpoint, cursor);
            return Err(ReaderError::InvalidCursor(cursor.to_string()));
        }

        self.with_access_token(&mut url);
        self.fetcher.get_json(&url).await
    }

    async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<Option<RawRecord>> {
        let predicates = [Predicate::uid(document_type, uid)];
        let options = QueryOptions::new().with_page_size(1);
        let response = self.query(&predicates, &options).await?;
        Ok(response
            .results
            .into_iter()
            .find(|record| record.document_type == document_type))
    }
}
