//! Strategy executors.
//!
//! Each strategy is a fixed sequence of network, cache and fallback steps:
//!
//! | strategy                | first     | on network failure                 | stores        |
//! |-------------------------|-----------|------------------------------------|---------------|
//! | `AlwaysNetworkBusted`   | network   | cached copy, else empty config     | 2xx responses |
//! | `NetworkFirst`          | network   | cached copy, else 503 `Offline`    | 2xx responses |
//! | `CacheFirst`            | cache     | error propagated                   | 2xx responses |
//!
//! Any response that arrives, whatever its status, is returned to the caller.
//! Only 2xx responses are written through: a 404 or 500 answer never replaces
//! a good cached copy, and an error page is never served offline as if it were
//! the asset.

use shellcache_core::{Error, RequestDescriptor, RequestKey, ResponseSnapshot, Strategy};

use crate::fetch::{CacheMode, FetchRequest, Fetcher, cache_bust};
use crate::generation::GenerationManager;

/// Runs strategies against one generation and one network.
pub struct Executor<'a> {
    pub generations: &'a GenerationManager,
    pub fetcher: &'a dyn Fetcher,
    pub bust_param: &'a str,
}

impl Executor<'_> {
    /// Run `strategy` for `request`.
    ///
    /// Only `CacheFirst` can return `Err`.
    pub async fn run(&self, strategy: Strategy, request: &RequestDescriptor) -> Result<ResponseSnapshot, Error> {
        match strategy {
            Strategy::AlwaysNetworkBusted => {
                let token = chrono::Utc::now().timestamp_millis().to_string();
                Ok(self.network_busted(request, &token).await)
            }
            Strategy::NetworkFirst => Ok(self.network_first(request).await),
            Strategy::CacheFirst => self.cache_first(request).await,
        }
    }

    /// Fetch `request` with a uniqueness token in the query.
    pub async fn network_busted(&self, request: &RequestDescriptor, token: &str) -> ResponseSnapshot {
        let key = RequestKey::new(&request.method, &request.url);
        let busted = cache_bust(&request.url, self.bust_param, token);
        let outgoing = FetchRequest::from_descriptor(request)
            .with_url(busted)
            .with_cache(CacheMode::Reload);

        match self.fetcher.fetch(&outgoing).await {
            Ok(response) => {
                self.write_through(&key, &response).await;
                response
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "dynamic config fetch failed");
                match self.generations.get(&key).await {
                    Some(cached) => cached,
                    None => {
                        tracing::info!(url = %request.url, "serving empty dynamic config");
                        ResponseSnapshot::empty_config(request.url.clone())
                    }
                }
            }
        }
    }

    /// Network with cache bypass, falling back to the cached copy or an offline page.
    pub async fn network_first(&self, request: &RequestDescriptor) -> ResponseSnapshot {
        let key = RequestKey::new(&request.method, &request.url);
        let outgoing = FetchRequest::from_descriptor(request).with_cache(CacheMode::Reload);

        match self.fetcher.fetch(&outgoing).await {
            Ok(response) => {
                self.write_through(&key, &response).await;
                response
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "document fetch failed");
                match self.generations.get(&key).await {
                    Some(cached) => cached,
                    None => {
                        tracing::info!(url = %request.url, "serving offline document");
                        ResponseSnapshot::offline(request.url.clone())
                    }
                }
            }
        }
    }

    /// Cached copy if present, otherwise the network.
    pub async fn cache_first(&self, request: &RequestDescriptor) -> Result<ResponseSnapshot, Error> {
        let key = RequestKey::new(&request.method, &request.url);

        if let Some(cached) = self.generations.get(&key).await {
            tracing::debug!(url = %request.url, "cache hit");
            return Ok(cached);
        }

        tracing::debug!(url = %request.url, "cache miss");
        let response = self.fetcher.fetch(&FetchRequest::from_descriptor(request)).await?;
        self.write_through(&key, &response).await;
        Ok(response)
    }

    async fn write_through(&self, key: &RequestKey, response: &ResponseSnapshot) {
        if response.is_ok() {
            self.generations.put(key, response).await;
        } else {
            tracing::debug!(url = %key.url, status = response.status, "not caching unsuccessful response");
        }
    }
}
