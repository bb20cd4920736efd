//! SQLite-backed store for cache generations.
//!
//! Each generation is a named, versioned store of request/response entries.
//! Access is async via tokio-rusqlite. It supports:
//!
//! - Request identity keys (method + normalized URL) hashed with SHA-256
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Whole-generation deletion (entries cascade)

pub mod connection;
pub mod entries;
pub mod generations;
pub mod hash;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use generations::GenerationInfo;
pub use hash::RequestKey;
