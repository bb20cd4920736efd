//! sw_fetch tool implementation.
//!
//! Builds an intercepted request from the tool input and hands it to the
//! registration, which routes it through the active worker.

use std::collections::BTreeMap;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::{Registration, fetch::canonicalize};
use shellcache_core::{Destination, Error, RequestDescriptor, RequestMode, ResponseSource};

/// Input parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchParams {
    /// Absolute http(s) URL to request.
    pub url: String,

    /// HTTP method (default: GET). Only GET responses are cached.
    #[serde(default = "default_method")]
    pub method: String,

    /// Request destination, e.g. "document", "script", "image" (default: empty).
    #[serde(default)]
    pub destination: String,

    /// Request mode: "navigate", "same-origin", "no-cors" (default) or "cors".
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Extra request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_method() -> String {
    "GET".into()
}

fn default_mode() -> String {
    "no-cors".into()
}

/// Output structure for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchOutput {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
    /// `network`, `cache` or `synthesized`.
    pub source: ResponseSource,
}

impl FetchParams {
    fn into_request(self) -> Result<RequestDescriptor, Error> {
        if self.url.trim().is_empty() {
            return Err(Error::InvalidInput("url cannot be empty".into()));
        }
        if self.method.trim().is_empty() {
            return Err(Error::InvalidInput("method cannot be empty".into()));
        }

        let url = canonicalize(&self.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let mode: RequestMode = self.mode.parse().map_err(Error::InvalidInput)?;
        let Ok(destination) = self.destination.parse::<Destination>();

        let mut request = RequestDescriptor::get(url)
            .with_method(self.method)
            .with_destination(destination)
            .with_mode(mode);
        for (name, value) in self.headers {
            request = request.with_header(name, value);
        }
        Ok(request)
    }
}

/// Implementation of the sw_fetch tool.
///
/// Fallback responses (offline document, empty config) are successful tool
/// results. A cache-first miss that cannot reach the network is a tool error.
pub async fn fetch_impl(registration: &Registration, params: FetchParams) -> Result<CallToolResult, McpError> {
    let request = params.into_request()?;
    let response = registration.fetch(&request).await?;

    let output = FetchOutput {
        content_type: response.content_type().map(str::to_string),
        body: response.body_text(),
        url: response.url,
        status: response.status,
        headers: response.headers,
        source: response.source,
    };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
