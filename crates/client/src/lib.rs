//! Client code for shellcache.
//!
//! This crate provides the network side of the worker (the `Fetcher` seam and
//! its reqwest implementation), the cache generation manager, the strategy
//! executors, and the registration that runs the worker lifecycle.

pub mod fetch;
pub mod generation;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use fetch::{CacheMode, FetchClient, FetchConfig, FetchRequest, Fetcher};
pub use generation::{GenerationManager, SeedReport};
pub use worker::{InstallOutcome, Registration, RegistrationStatus, Worker};
