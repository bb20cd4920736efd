//! MCP server handler.
//!
//! Routes tool calls to the worker registration.
use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use shellcache_client::Registration;

use crate::tools::{FetchParams, MessageParams, fetch_impl, message_impl, status_impl};

/// MCP handler hosting one worker registration.
#[derive(Clone)]
pub struct ShellcacheServer {
    registration: Arc<Registration>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl ShellcacheServer {
    pub fn new(registration: Arc<Registration>) -> Self {
        Self { registration, tool_router: Self::tool_router() }
    }

    /// Intercept a request as the page would issue it.
    #[tool(
        description = "Fetch a URL through the active worker. Returns status, headers, body and whether the response came from the network, the cache, or a fallback."
    )]
    async fn sw_fetch(&self, params: Parameters<FetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.registration, params.0).await
    }

    /// Post a control message to the worker.
    #[tool(
        description = "Send a control message to the worker. {\"type\":\"SKIP_WAITING\"} activates the waiting worker; {\"type\":\"BUST_CACHE\"} deletes every cache generation. Other messages are ignored."
    )]
    async fn sw_message(&self, params: Parameters<MessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.registration, params.0).await
    }

    #[tool(description = "Report the active and waiting worker generations and the generations held in storage.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.registration).await
    }
}

impl ServerHandler for ShellcacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "shellcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::offline_registration;

    #[tokio::test]
    async fn test_tools_are_listed() {
        let server = ShellcacheServer::new(offline_registration().await);
        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["sw_fetch", "sw_message", "sw_status"]);
    }

    #[tokio::test]
    async fn test_server_info_names_binary() {
        let info = ShellcacheServer::new(offline_registration().await).get_info();
        assert_eq!(info.server_info.name, "shellcache");
        assert!(info.capabilities.tools.is_some());
    }
}
