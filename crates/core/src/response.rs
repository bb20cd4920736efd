//! Response snapshots.
//!
//! A snapshot is a fully buffered response: what the network returned, what
//! the cache stored, or what the worker synthesized as a fallback.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Body served for the dynamic config when neither network nor cache can answer.
pub const EMPTY_CONFIG_BODY: &str = r#"{"added":{},"removed":{}}"#;

/// Body served for a navigation when neither network nor cache can answer.
pub const OFFLINE_BODY: &str = "Offline";

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    #[default]
    Network,
    Cache,
    Synthesized,
}

/// A buffered HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    /// URL the response was produced for.
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    #[serde(default)]
    pub source: ResponseSource,
}

impl ResponseSnapshot {
    pub fn new(url: impl Into<String>, status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        Self { url: url.into(), status, headers, body, source: ResponseSource::Network }
    }

    /// `{"added": {}, "removed": {}}` with a JSON content type.
    pub fn empty_config(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: 200,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: EMPTY_CONFIG_BODY.as_bytes().to_vec(),
            source: ResponseSource::Synthesized,
        }
    }

    /// Plain-text 503 `Offline`.
    pub fn offline(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: 503,
            headers: vec![("content-type".to_string(), "text/plain".to_string())],
            body: OFFLINE_BODY.as_bytes().to_vec(),
            source: ResponseSource::Synthesized,
        }
    }

    pub fn with_source(mut self, source: ResponseSource) -> Self {
        self.source = source;
        self
    }

    /// Status in the 200-299 range.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
