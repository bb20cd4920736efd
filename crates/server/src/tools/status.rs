//! sw_status tool implementation.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::Registration;
use shellcache_core::{ActivationMode, Error, cache::GenerationInfo};

/// Output structure for the sw_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StatusOutput {
    pub activation: ActivationMode,
    pub active: Option<String>,
    pub waiting: Option<String>,
    /// Every generation in storage, with its entry count.
    pub generations: Vec<GenerationInfo>,
}

pub async fn status_impl(registration: &Registration) -> Result<CallToolResult, McpError> {
    let status = registration.status().await;
    let output =
        StatusOutput { activation: status.mode, active: status.active, waiting: status.waiting, generations: status.stored };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
