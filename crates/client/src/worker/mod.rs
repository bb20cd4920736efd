//! The worker: one cache generation plus the policy that serves requests from it.
//!
//! A [`Worker`] is built from a [`WorkerConfig`]; its generation identifier is
//! the configured `cache_name`. Workers are driven through their lifecycle by
//! a [`Registration`].

pub mod registration;
pub mod strategy;

pub use registration::{InstallOutcome, Registration, RegistrationStatus};
pub use strategy::Executor;

use std::sync::Arc;

use shellcache_core::{CacheDb, Error, FetchPolicy, RequestDescriptor, ResponseSnapshot, WorkerConfig, WorkerState};
use tokio::sync::RwLock;
use url::Url;

use crate::fetch::{Fetcher, resolve_in_scope};
use crate::generation::{GenerationManager, SeedReport};

/// A worker instance bound to one cache generation.
pub struct Worker {
    generations: GenerationManager,
    fetcher: Arc<dyn Fetcher>,
    policy: FetchPolicy,
    seeds: Vec<Url>,
    bust_param: String,
    state: RwLock<WorkerState>,
}

impl Worker {
    /// Build a worker for `config.cache_name`, resolving seeds against the scope.
    pub fn new(config: &WorkerConfig, db: CacheDb, fetcher: Arc<dyn Fetcher>) -> Result<Self, Error> {
        let scope = config.scope_url().map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let seeds = config
            .seed_paths
            .iter()
            .map(|p| resolve_in_scope(&scope, p).map_err(|e| Error::InvalidUrl(e.to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            generations: GenerationManager::new(db, config.cache_name.clone()),
            fetcher,
            policy: config.policy(),
            seeds,
            bust_param: config.bust_param.clone(),
            state: RwLock::new(WorkerState::Installing),
        })
    }

    /// Generation identifier owned by this worker.
    pub fn generation(&self) -> &str {
        self.generations.current()
    }

    pub fn generations(&self) -> &GenerationManager {
        &self.generations
    }

    /// Resolved seed URLs.
    pub fn seeds(&self) -> &[Url] {
        &self.seeds
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    pub(crate) async fn transition(&self, next: WorkerState) -> Result<(), Error> {
        let mut state = self.state.write().await;
        *state = state.transition(next)?;
        tracing::info!(generation = %self.generation(), state = %next, "worker state changed");
        Ok(())
    }

    /// Take this worker out of service: no further writes, then `superseded`.
    pub(crate) async fn retire(&self) -> Result<(), Error> {
        self.generations.retire().await;
        self.transition(WorkerState::Superseded).await
    }

    /// Mark a worker whose generation is already stored as active, without
    /// seeding or collecting.
    pub(crate) async fn restore_active(&self) -> Result<(), Error> {
        self.transition(WorkerState::Activating).await?;
        self.transition(WorkerState::Active).await
    }

    /// Install hook: seed the generation. Never fails on individual seeds.
    pub async fn install(&self) -> SeedReport {
        self.generations.ensure_current(&self.seeds, self.fetcher.as_ref()).await
    }

    /// Activate hook: drop every other generation.
    pub async fn activate(&self) -> Vec<String> {
        self.generations.promote_and_gc().await
    }

    /// Classify and serve an intercepted request.
    pub async fn handle_fetch(&self, request: &RequestDescriptor) -> Result<ResponseSnapshot, Error> {
        let strategy = self.policy.classify(request);
        tracing::debug!(url = %request.url, ?strategy, generation = %self.generation(), "handling fetch");

        let executor =
            Executor { generations: &self.generations, fetcher: self.fetcher.as_ref(), bust_param: &self.bust_param };
        executor.run(strategy, request).await
    }
}
