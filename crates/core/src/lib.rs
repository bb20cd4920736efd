//! Core types and shared functionality for shellcache.
//!
//! This crate provides:
//! - Generation-scoped response cache with SQLite backend
//! - Request classification (fetch policy)
//! - Worker lifecycle states and control messages
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod control;
pub mod error;
pub mod lifecycle;
pub mod policy;
pub mod response;

pub use cache::{CacheDb, RequestKey};
pub use config::{ActivationMode, ConfigError, WorkerConfig};
pub use control::ControlCommand;
pub use error::Error;
pub use lifecycle::WorkerState;
pub use policy::{Destination, FetchPolicy, RequestDescriptor, RequestMode, Strategy};
pub use response::{ResponseSnapshot, ResponseSource};
