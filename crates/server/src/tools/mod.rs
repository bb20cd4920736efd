//! MCP tool implementations.

pub mod fetch;
pub mod message;
pub mod status;

#[cfg(test)]
pub(crate) mod testing;

pub use fetch::{FetchParams, fetch_impl};
pub use message::{MessageParams, message_impl};
pub use status::status_impl;
