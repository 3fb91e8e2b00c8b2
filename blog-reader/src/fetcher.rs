use crate::types::{ReaderConfig, ReaderError, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

const BYTES_PER_MB: usize = 1024 * 1024;

fn size_mb(bytes: usize) -> usize {
    bytes.div_ceil(BYTES_PER_MB)
}

/// Thin JSON-over-HTTP layer shared by the HTTP content stores.
pub struct Fetcher {
    client: Client,
    max_response_size_mb: usize,
}

impl Fetcher {
    pub fn new(config: &ReaderConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            max_response_size_mb: config.max_response_size_mb,
        })
    }

    /// GETs `url` and decodes the body. A 404 yields `Ok(None)`.
    pub async fn get_json_optional<T: DeserializeOwned>(&self, url: &Url) -> Result<Option<T>> {
        let start_time = Instant::now();
        debug!("GET {}", url);

        let mut response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            debug!("Not found: {}", url);
            return Ok(None);
        }

        if !status.is_success() {
            warn!("HTTP {} from {}", status, url);
            return Err(ReaderError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let limit = self.max_response_size_mb.saturating_mul(BYTES_PER_MB);
        if let Some(content_length) = response.content_length() {
            if content_length as usize > limit {
                return Err(ReaderError::ResponseTooLarge { size_mb: size_mb(content_length as usize) });
            }
        }

        // Decompressed bodies report no content length; the cap applies while reading.
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > limit {
                warn!("Response from {} exceeds {}MB, aborting", url, self.max_response_size_mb);
                return Err(ReaderError::ResponseTooLarge { size_mb: size_mb(body.len() + chunk.len()) });
            }
            body.extend_from_slice(&chunk);
        }

        debug!(
            "Fetched {} bytes from {} in {}ms",
            body.len(),
            url,
            start_time.elapsed().as_millis()
        );

        let value = serde_json::from_slice(&body)
            .map_err(|e| ReaderError::Parse(format!("Invalid JSON from {}: {}", url, e)))?;
        Ok(Some(value))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        self.get_json_optional(url).await?.ok_or_else(|| ReaderError::Status {
            status: StatusCode::NOT_FOUND.as_u16(),
            url: url.to_string(),
        })
    }
}
