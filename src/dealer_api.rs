// Client for the dealership REST API (/api/cars/*)

use std::sync::Arc;

use axum::async_trait;
use cached::{Cached, TimedSizedCache};
use reqwest::{header::ACCEPT, Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};

use crate::config::Settings;
use crate::models::{CarRecord, FilterMetadata, SearchPage};
use crate::query::SearchQuery;

const MAX_RETRIES: u32 = 1;
const RETRY_DELAY_MS: u64 = 250;
const SEARCH_CACHE_SIZE: usize = 256;
const FILTERS_CACHE_KEY: &str = "filters";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} responded with {status}")]
    Status { url: String, status: StatusCode },
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("car {0} not found")]
    NotFound(String),
}

impl ApiError {
    fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport { .. } => true,
            ApiError::Status { status, .. } => status.is_server_error(),
            ApiError::Decode { .. } | ApiError::NotFound(_) => false,
        }
    }
}

/// Where cars come from. The inventory controller and the pages only talk
/// to this trait.
#[async_trait]
pub trait CarSource: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, ApiError>;
    async fn filters(&self) -> Result<FilterMetadata, ApiError>;
    async fn car(&self, id: &str) -> Result<CarRecord, ApiError>;
}

pub struct DealerApi {
    http_client: Arc<Client>,
    base_url: Url,
    token: Option<String>,
    search_cache: Mutex<TimedSizedCache<String, SearchPage>>,
    filters_cache: Mutex<TimedSizedCache<String, FilterMetadata>>,
}

impl DealerApi {
    pub fn new(http_client: Arc<Client>, settings: &Settings) -> anyhow::Result<Self> {
        let base_url = Url::parse(&settings.api_base_url).map_err(|e| {
            anyhow::anyhow!("Invalid api_base_url '{}': {}", settings.api_base_url, e)
        })?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("api_base_url '{}' cannot be used as a base URL", base_url);
        }

        let ttl = settings.cache_ttl_secs;
        Ok(DealerApi {
            http_client,
            base_url,
            token: settings.api_token.clone().filter(|t| !t.is_empty()),
            search_cache: Mutex::new(TimedSizedCache::with_size_and_lifespan(SEARCH_CACHE_SIZE, ttl)),
            filters_cache: Mutex::new(TimedSizedCache::with_size_and_lifespan(1, ttl)),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in new(), so path_segments_mut succeeds
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        url: &Url,
        query: Option<&SearchQuery>,
    ) -> Result<T, ApiError> {
        let mut request = self
            .http_client
            .get(url.clone())
            .header(ACCEPT, "application/json");
        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status,
            });
        }

        response.json::<T>().await.map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }

    // One retry on transport errors and 5xx, then give up
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: Option<&SearchQuery>,
    ) -> Result<T, ApiError> {
        let mut attempt = 0;
        loop {
            tracing::debug!(url = %url, attempt, "Requesting dealer API");
            match self.get_once(&url, query).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < MAX_RETRIES => {
                    attempt += 1;
                    tracing::warn!(url = %url, attempt, error = %e, "Dealer API request failed. Retrying...");
                    sleep(Duration::from_millis(RETRY_DELAY_MS)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl CarSource for DealerApi {
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, ApiError> {
        let key = query.cache_key();
        if let Some(hit) = self.search_cache.lock().await.cache_get(&key) {
            tracing::debug!(page = query.page, "Serving search results from cache");
            return Ok(hit.clone());
        }

        let page: SearchPage = self
            .get_json(self.endpoint(&["api", "cars", "search"]), Some(query))
            .await?;
        tracing::info!(page = query.page, total = page.total, items = page.items.len(), "Fetched search results");

        self.search_cache.lock().await.cache_set(key, page.clone());
        Ok(page)
    }

    async fn filters(&self) -> Result<FilterMetadata, ApiError> {
        let key = FILTERS_CACHE_KEY.to_string();
        if let Some(hit) = self.filters_cache.lock().await.cache_get(&key) {
            return Ok(hit.clone());
        }

        let metadata: FilterMetadata = self
            .get_json(self.endpoint(&["api", "cars", "filters"]), None)
            .await?;
        self.filters_cache.lock().await.cache_set(key, metadata.clone());
        Ok(metadata)
    }

    async fn car(&self, id: &str) -> Result<CarRecord, ApiError> {
        match self.get_json(self.endpoint(&["api", "cars", id]), None).await {
            Err(ApiError::Status { status, .. }) if status == StatusCode::NOT_FOUND => {
                Err(ApiError::NotFound(id.to_string()))
            }
            other => other,
        }
    }
}
