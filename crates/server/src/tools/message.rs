//! sw_message tool implementation.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::Registration;
use shellcache_core::Error;

/// Input parameters for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MessageParams {
    /// Message posted by the page, e.g. `{"type": "SKIP_WAITING"}`.
    pub message: serde_json::Value,
}

/// Output structure for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MessageOutput {
    /// Command that was acted upon, or null if the message was ignored.
    pub command: Option<String>,
    /// Active generation after handling the message.
    pub active: Option<String>,
    /// Waiting generation after handling the message.
    pub waiting: Option<String>,
}

/// Implementation of the sw_message tool. Unknown messages are not an error.
pub async fn message_impl(registration: &Registration, params: MessageParams) -> Result<CallToolResult, McpError> {
    let command = registration.handle_message(&params.message).await;

    let output = MessageOutput {
        command: command.map(|c| c.as_str().to_string()),
        active: registration.active_generation().await,
        waiting: registration.waiting_generation().await,
    };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
