//! Dispatch loop (grounded on the teacher's `server.rs`), wired to the
//! registry/`AppContext` pair instead of the teacher's comparison manager.

use crate::protocol::{
    CallToolRequest, ErrorCode, InitializeParams, InitializeResult, JsonRpcError, JsonRpcMessage,
    JsonRpcRequest, JsonRpcResponse, ListResourcesResult, ListToolsResult, ReadResourceRequest,
    ResourcesCapability, ServerCapabilities, ServerInfo, ToolsCapability,
};
use crate::registry::Registry;
use crate::resources::ResourceHandler;
use crate::runtime::AppContext;
use crate::transport::StdioTransport;
use serde_json::Value;
use tracing::{debug, error, info, warn};

pub struct McpServer {
    ctx: AppContext,
    registry: Registry,
}

impl McpServer {
    pub fn new(ctx: AppContext, registry: Registry) -> Self {
        Self { ctx, registry }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        info!("MCP server starting with stdio transport");
        let (mut transport, tx) = StdioTransport::new();
        info!("MCP server ready, waiting for messages");

        while let Some(message) = transport.recv().await {
            match message {
                JsonRpcMessage::Request(request) => {
                    let response = self.handle_request(request).await;
                    if tx.send(JsonRpcMessage::Response(response)).is_err() {
                        error!("failed to send response, receiver gone");
                        break;
                    }
                }
                JsonRpcMessage::Notification(notification) => {
                    debug!(method = %notification.method, "received notification");
                }
                JsonRpcMessage::Response(response) => {
                    warn!(?response, "received unexpected response");
                }
            }
        }

        info!("MCP server shutting down");
        Ok(())
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        info!(method = %request.method, "handling request");

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => self.handle_list_tools(),
            "tools/call" => self.handle_call_tool(request.params).await,
            "resources/list" => self.handle_list_resources(),
            "resources/templates/list" => self.handle_list_resource_templates(),
            "resources/read" => self.handle_read_resource(request.params),
            other => Err(JsonRpcError::new(
                ErrorCode::MethodNotFound,
                format!("method not found: {other}"),
            )),
        };

        match result {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(error) => JsonRpcResponse::error(request.id, error),
        }
    }

    fn handle_initialize(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let init_params: InitializeParams = match params {
            Some(p) => serde_json::from_value(p)
                .map_err(|e| JsonRpcError::new(ErrorCode::InvalidParams, format!("invalid params: {e}")))?,
            None => {
                return Err(JsonRpcError::new(
                    ErrorCode::InvalidParams,
                    "missing initialization parameters",
                ))
            }
        };

        let result = InitializeResult {
            protocol_version: init_params.protocol_version,
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: Some(false) }),
                resources: Some(ResourcesCapability {
                    subscribe: Some(false),
                    list_changed: Some(false),
                }),
                prompts: None,
            },
            server_info: ServerInfo {
                name: "sg-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        serde_json::to_value(result)
            .map_err(|e| JsonRpcError::new(ErrorCode::InternalError, format!("failed to serialize result: {e}")))
    }

    fn handle_list_tools(&self) -> Result<Value, JsonRpcError> {
        let result = ListToolsResult { tools: self.registry.list() };
        serde_json::to_value(result)
            .map_err(|e| JsonRpcError::new(ErrorCode::InternalError, format!("failed to serialize result: {e}")))
    }

    async fn handle_call_tool(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let call_request: CallToolRequest = match params {
            Some(p) => serde_json::from_value(p)
                .map_err(|e| JsonRpcError::new(ErrorCode::InvalidParams, format!("invalid params: {e}")))?,
            None => {
                return Err(JsonRpcError::new(ErrorCode::InvalidParams, "missing tool call parameters"))
            }
        };

        let result = self
            .registry
            .call(&self.ctx, &call_request.name, call_request.arguments)
            .await
            .map_err(|e| JsonRpcError::from(&e))?;

        let call_result = crate::protocol::CallToolResult::json(&result);
        serde_json::to_value(call_result)
            .map_err(|e| JsonRpcError::new(ErrorCode::InternalError, format!("failed to serialize result: {e}")))
    }

    fn handle_list_resources(&self) -> Result<Value, JsonRpcError> {
        let handler = ResourceHandler::new(&self.ctx);
        let result = ListResourcesResult { resources: handler.list_resources(), next_cursor: None };
        serde_json::to_value(result)
            .map_err(|e| JsonRpcError::new(ErrorCode::InternalError, format!("failed to serialize result: {e}")))
    }

    fn handle_list_resource_templates(&self) -> Result<Value, JsonRpcError> {
        let handler = ResourceHandler::new(&self.ctx);
        Ok(serde_json::json!({ "resourceTemplates": handler.list_templates() }))
    }

    fn handle_read_resource(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let read_request: ReadResourceRequest = match params {
            Some(p) => serde_json::from_value(p)
                .map_err(|e| JsonRpcError::new(ErrorCode::InvalidParams, format!("invalid params: {e}")))?,
            None => return Err(JsonRpcError::new(ErrorCode::InvalidParams, "missing resource URI")),
        };

        let handler = ResourceHandler::new(&self.ctx);
        let result = handler
            .read_resource(&read_request.uri)
            .map_err(|e| JsonRpcError::from(&e))?;

        serde_json::to_value(result)
            .map_err(|e| JsonRpcError::new(ErrorCode::InternalError, format!("failed to serialize result: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RequestId;
    use crate::tools::build_registry;
    use sg_core::{Config, Runtime};

    fn test_server(base: &std::path::Path) -> McpServer {
        let mut config = Config::default();
        config.backup_root = base.join("backups");
        let ctx = AppContext::new(Runtime::new(config));
        McpServer::new(ctx, build_registry())
    }

    #[tokio::test]
    async fn ping_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let server = test_server(dir.path());
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: RequestId::Number(1),
            method: "ping".to_string(),
            params: None,
        };
        let response = server.handle_request(request).await;
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let server = test_server(dir.path());
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: RequestId::Number(1),
            method: "not/a/method".to_string(),
            params: None,
        };
        let response = server.handle_request(request).await;
        assert_eq!(response.error.unwrap().code, ErrorCode::MethodNotFound as i32);
    }

    #[tokio::test]
    async fn tools_list_reports_every_registered_tool() {
        let dir = tempfile::tempdir().unwrap();
        let server = test_server(dir.path());
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: RequestId::Number(1),
            method: "tools/list".to_string(),
            params: None,
        };
        let response = server.handle_request(request).await;
        let tools = response.result.unwrap()["tools"].as_array().unwrap().len();
        assert_eq!(tools, build_registry().list().len());
    }
}
