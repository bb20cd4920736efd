//! Cache generation manager.
//!
//! Owns every read and write against the cache store for one generation.
//! Storage is advisory: write failures are logged and dropped, read failures
//! look like a miss.
//!
//! Once retired, a manager never writes again. A write that races with
//! retirement either finishes before [`GenerationManager::retire`] returns or
//! is dropped, so garbage collection that follows retirement cannot be undone
//! by a late write-through.

use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;
use shellcache_core::{CacheDb, RequestKey, ResponseSnapshot};
use tokio::sync::RwLock;
use url::Url;

use crate::fetch::{FetchRequest, Fetcher};

/// Outcome of seeding a generation at install time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    /// Seed URLs stored in the generation.
    pub stored: Vec<String>,
    /// Seed URLs that could not be stored, with the reason.
    pub failed: Vec<(String, String)>,
}

/// Read/write access to the current cache generation.
#[derive(Clone, Debug)]
pub struct GenerationManager {
    db: CacheDb,
    current: String,
    retired: Arc<RwLock<bool>>,
}

impl GenerationManager {
    pub fn new(db: CacheDb, current: impl Into<String>) -> Self {
        Self { db, current: current.into(), retired: Arc::new(RwLock::new(false)) }
    }

    /// Identifier of the generation this manager writes to.
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Open the current generation and store every seed that fetches cleanly.
    ///
    /// A seed that fails (transport error, non-2xx status, storage error) is
    /// reported and skipped; the remaining seeds are still stored.
    pub async fn ensure_current(&self, seeds: &[Url], fetcher: &dyn Fetcher) -> SeedReport {
        if let Err(e) = self.db.open_generation(&self.current).await {
            tracing::warn!(generation = %self.current, error = %e, "failed to open generation");
        }

        let results = join_all(seeds.iter().map(|seed| self.seed_one(seed, fetcher))).await;

        let mut report = SeedReport::default();
        for (seed, result) in seeds.iter().zip(results) {
            match result {
                Ok(()) => report.stored.push(seed.to_string()),
                Err(reason) => {
                    tracing::warn!(generation = %self.current, seed = %seed, %reason, "seed asset skipped");
                    report.failed.push((seed.to_string(), reason));
                }
            }
        }

        tracing::info!(
            generation = %self.current,
            stored = report.stored.len(),
            failed = report.failed.len(),
            "generation seeded"
        );
        report
    }

    async fn seed_one(&self, seed: &Url, fetcher: &dyn Fetcher) -> Result<(), String> {
        let response = fetcher
            .fetch(&FetchRequest::get(seed.clone()))
            .await
            .map_err(|e| e.to_string())?;
        if !response.is_ok() {
            return Err(format!("status {}", response.status));
        }
        self.db
            .put_entry(&self.current, &RequestKey::get(seed), &response)
            .await
            .map_err(|e| e.to_string())
    }

    /// Delete every generation other than the current one.
    ///
    /// Returns the deleted identifiers.
    pub async fn promote_and_gc(&self) -> Vec<String> {
        let names = match self.db.generation_names().await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(generation = %self.current, error = %e, "failed to list generations");
                return Vec::new();
            }
        };

        let mut deleted = Vec::new();
        for name in names.into_iter().filter(|n| *n != self.current) {
            match self.db.delete_generation(&name).await {
                Ok(true) => deleted.push(name),
                Ok(false) => {}
                Err(e) => tracing::warn!(generation = %name, error = %e, "failed to delete old generation"),
            }
        }

        if !deleted.is_empty() {
            tracing::info!(current = %self.current, deleted = ?deleted, "old generations removed");
        }
        deleted
    }

    /// Look up `key` in the current generation.
    pub async fn get(&self, key: &RequestKey) -> Option<ResponseSnapshot> {
        if !key.is_cacheable() {
            return None;
        }
        match self.db.get_entry(&self.current, key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(generation = %self.current, url = %key.url, error = %e, "cache read failed");
                None
            }
        }
    }

    /// Store `response` under `key` in the current generation, best effort.
    pub async fn put(&self, key: &RequestKey, response: &ResponseSnapshot) {
        if !key.is_cacheable() {
            tracing::debug!(method = %key.method, url = %key.url, "not caching non-GET request");
            return;
        }
        let retired = self.retired.read().await;
        if *retired {
            tracing::debug!(generation = %self.current, url = %key.url, "generation retired, write dropped");
            return;
        }
        if let Err(e) = self.db.put_entry(&self.current, key, response).await {
            tracing::warn!(generation = %self.current, url = %key.url, error = %e, "cache write dropped");
        }
    }

    /// Stop writing to this generation.
    ///
    /// Waits for writes already in progress.
    pub async fn retire(&self) {
        *self.retired.write().await = true;
        tracing::debug!(generation = %self.current, "generation retired");
    }

    /// Delete every generation, the current one included.
    pub async fn purge_all(&self) -> u64 {
        match self.db.delete_all_generations().await {
            Ok(count) => {
                tracing::info!(deleted = count, "all cache generations purged");
                count
            }
            Err(e) => {
                tracing::warn!(error = %e, "cache purge failed");
                0
            }
        }
    }

    /// Shared store handle.
    pub fn db(&self) -> &CacheDb {
        &self.db
    }
}
