//! MCP `ServerHandler` over [`DrugService`].
//!
//! Tool failures are returned as `isError` results carrying the error
//! message, so one bad call never tears down the session.

use std::sync::Arc;

use rmcp::{
    model::{
        CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
    ErrorData, RoleServer, ServerHandler,
};
use tracing::{info, warn};

use crate::{
    config::ServerConfig,
    server::tools::{call_tool, Arguments, ToolKind},
    service::DrugService,
};

#[derive(Clone)]
pub struct DrugToolServer {
    service: DrugService,
    name: Arc<str>,
    version: Arc<str>,
}

impl DrugToolServer {
    pub fn new(service: DrugService, config: &ServerConfig) -> Self {
        Self {
            service,
            name: Arc::from(config.name.as_str()),
            version: Arc::from(config.version.as_str()),
        }
    }

    pub fn tools() -> Vec<Tool> {
        ToolKind::ALL
            .into_iter()
            .map(|tool| Tool::new(tool.name(), tool.description(), Arc::new(tool.input_schema())))
            .collect()
    }

    /// Run a named tool and wrap the outcome as MCP content
    pub async fn dispatch(&self, name: &str, args: &Arguments) -> Result<CallToolResult, ErrorData> {
        let tool = ToolKind::from_name(name)
            .ok_or_else(|| ErrorData::invalid_params(format!("Unknown tool: {}", name), None))?;

        info!("Tool call: {}", name);
        let result = match call_tool(&self.service, tool, args).await {
            Ok(output) => match output.to_pretty_json() {
                Ok(text) => CallToolResult::success(vec![Content::text(text)]),
                Err(e) => CallToolResult::error(vec![Content::text(e.to_string())]),
            },
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                CallToolResult::error(vec![Content::text(e.to_string())])
            }
        };
        Ok(result)
    }
}

impl ServerHandler for DrugToolServer {
    fn get_info(&self) -> ServerInfo {
        let mut server_info = Implementation::from_build_env();
        server_info.name = self.name.to_string();
        server_info.version = self.version.to_string();

        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info,
            instructions: Some(
                "NDC lookups, RxNorm details, approximate drug name matching and 340B eligibility checks"
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(Self::tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let args = request.arguments.unwrap_or_default();
        self.dispatch(&request.name, &args).await
    }
}
