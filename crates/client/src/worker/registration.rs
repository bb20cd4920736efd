//! Worker registration: install, activation and the control channel.
//!
//! A registration holds at most one active worker (the one serving fetches)
//! and at most one waiting worker. Activation first moves the new worker into
//! the active slot and retires the old one, then removes every other cache
//! generation. A retired worker may still be finishing a fetch, but it no
//! longer writes, so collected generations stay gone.
//!
//! [`Registration::start`] rebuilds the registration of a previous run from
//! what storage holds, so gated activation carries across restarts.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use shellcache_core::{
    ActivationMode, CacheDb, ControlCommand, Error, RequestDescriptor, ResponseSnapshot, WorkerConfig, WorkerState,
    cache::GenerationInfo,
};
use tokio::sync::RwLock;

use super::Worker;
use crate::fetch::{FetchRequest, Fetcher};
use crate::generation::SeedReport;

/// What happened to a newly registered worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallOutcome {
    pub generation: String,
    pub state: WorkerState,
    pub seeds: SeedReport,
}

/// Snapshot of the registration for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationStatus {
    pub mode: ActivationMode,
    pub active: Option<String>,
    pub waiting: Option<String>,
    pub stored: Vec<GenerationInfo>,
}

/// Lifecycle owner for the workers of one scope.
pub struct Registration {
    mode: ActivationMode,
    active: RwLock<Option<Arc<Worker>>>,
    waiting: RwLock<Option<Arc<Worker>>>,
    network: Arc<dyn Fetcher>,
}

impl Registration {
    /// `network` serves requests while no worker is active.
    pub fn new(mode: ActivationMode, network: Arc<dyn Fetcher>) -> Self {
        Self { mode, active: RwLock::new(None), waiting: RwLock::new(None), network }
    }

    /// Build the registration for `config` over an existing store.
    ///
    /// The newest stored generation other than `config.cache_name`, if any,
    /// belonged to the worker that was active in the previous run; it is
    /// restored as active before the configured worker is registered. In
    /// user-gated mode the configured worker then waits for
    /// [`ControlCommand::ActivateNow`].
    pub async fn start(
        config: &WorkerConfig, db: CacheDb, network: Arc<dyn Fetcher>,
    ) -> Result<(Self, InstallOutcome), Error> {
        let registration = Self::new(config.activation, Arc::clone(&network));

        let previous = db
            .list_generations()
            .await?
            .into_iter()
            .rev()
            .find(|g| g.name != config.cache_name);
        if let Some(previous) = previous {
            let prior_config = WorkerConfig { cache_name: previous.name, ..config.clone() };
            let prior = Worker::new(&prior_config, db.clone(), Arc::clone(&network))?;
            registration.restore(prior).await?;
        }

        let outcome = registration.register(Worker::new(config, db, network)?).await?;
        Ok((registration, outcome))
    }

    /// Reinstate `worker` as active. Its generation is assumed to be stored
    /// already; nothing is seeded or collected.
    async fn restore(&self, worker: Worker) -> Result<(), Error> {
        worker.restore_active().await?;
        let generation = worker.generation().to_string();
        let previous = self.active.write().await.replace(Arc::new(worker));
        if let Some(previous) = previous {
            previous.retire().await?;
        }
        tracing::info!(%generation, "restored active worker from storage");
        Ok(())
    }

    /// Install `worker`, then activate it or park it as waiting.
    ///
    /// A worker installed while nothing is active activates immediately in
    /// either mode; with an active worker present, user-gated mode waits for
    /// [`ControlCommand::ActivateNow`].
    pub async fn register(&self, worker: Worker) -> Result<InstallOutcome, Error> {
        let worker = Arc::new(worker);
        let seeds = worker.install().await;

        let has_active = self.active.read().await.is_some();
        if self.mode == ActivationMode::Auto || !has_active {
            self.activate_worker(Arc::clone(&worker)).await?;
        } else {
            worker.transition(WorkerState::Waiting).await?;
            let previous = self.waiting.write().await.replace(Arc::clone(&worker));
            if let Some(previous) = previous {
                previous.retire().await?;
            }
        }

        Ok(InstallOutcome { generation: worker.generation().to_string(), state: worker.state().await, seeds })
    }

    /// Promote the waiting worker, if any.
    ///
    /// Returns the activated generation.
    pub async fn skip_waiting(&self) -> Result<Option<String>, Error> {
        let Some(worker) = self.waiting.write().await.take() else {
            tracing::debug!("skip waiting requested with no waiting worker");
            return Ok(None);
        };
        let generation = worker.generation().to_string();
        self.activate_worker(worker).await?;
        Ok(Some(generation))
    }

    async fn activate_worker(&self, worker: Arc<Worker>) -> Result<(), Error> {
        worker.transition(WorkerState::Activating).await?;

        let previous = self.active.write().await.replace(Arc::clone(&worker));
        if let Some(previous) = previous
            && !Arc::ptr_eq(&previous, &worker)
        {
            previous.retire().await?;
        }

        worker.activate().await;
        worker.transition(WorkerState::Active).await?;
        tracing::info!(generation = %worker.generation(), "worker activated and claimed clients");
        Ok(())
    }

    /// Serve an intercepted request through the active worker.
    ///
    /// Without an active worker the request goes straight to the network.
    pub async fn fetch(&self, request: &RequestDescriptor) -> Result<ResponseSnapshot, Error> {
        let active = self.active.read().await.clone();
        if let Some(worker) = active {
            if worker.state().await.can_intercept_fetch() {
                return worker.handle_fetch(request).await;
            }
            tracing::debug!(generation = %worker.generation(), "active slot worker not intercepting");
        }
        self.network.fetch(&FetchRequest::from_descriptor(request)).await
    }

    /// Handle a page message. Unrecognised messages are ignored.
    ///
    /// Returns the command that was acted upon.
    pub async fn handle_message(&self, message: &Value) -> Option<ControlCommand> {
        let Some(command) = ControlCommand::from_message(message) else {
            tracing::debug!(%message, "ignoring unrecognised message");
            return None;
        };

        match command {
            ControlCommand::ActivateNow => {
                if let Err(e) = self.skip_waiting().await {
                    tracing::warn!(error = %e, "skip waiting failed");
                }
            }
            ControlCommand::PurgeAll => {
                self.purge_all().await;
            }
        }
        Some(command)
    }

    /// Delete every cache generation. Returns the number removed.
    pub async fn purge_all(&self) -> u64 {
        let worker = match self.active.read().await.clone() {
            Some(worker) => Some(worker),
            None => self.waiting.read().await.clone(),
        };
        match worker {
            Some(worker) => worker.generations().purge_all().await,
            None => {
                tracing::debug!("purge requested with no registered worker");
                0
            }
        }
    }

    pub async fn active_generation(&self) -> Option<String> {
        self.active.read().await.as_ref().map(|w| w.generation().to_string())
    }

    pub async fn waiting_generation(&self) -> Option<String> {
        self.waiting.read().await.as_ref().map(|w| w.generation().to_string())
    }

    /// Active and waiting generations plus what storage holds.
    pub async fn status(&self) -> RegistrationStatus {
        let active = self.active.read().await.clone();
        let waiting = self.waiting.read().await.clone();
        let stored = match active.as_ref().or(waiting.as_ref()) {
            Some(worker) => worker.generations().db().list_generations().await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to list generations");
                Vec::new()
            }),
            None => Vec::new(),
        };

        RegistrationStatus {
            mode: self.mode,
            active: active.map(|w| w.generation().to_string()),
            waiting: waiting.map(|w| w.generation().to_string()),
            stored,
        }
    }
}
