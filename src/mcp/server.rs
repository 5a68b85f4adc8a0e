//! MCP request dispatcher shared by the stdio and SSE transports

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, error, info};

use super::types::*;
use crate::resources::{self, JSON_MIME_TYPE, RESOURCES};
use crate::tools::ArrTools;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "radarr-sonarr-mcp";

/// Transport-independent MCP dispatcher over the Radarr/Sonarr tools
#[derive(Clone)]
pub struct McpServer {
    tools: Arc<ArrTools>,
}

impl McpServer {
    pub fn new(tools: Arc<ArrTools>) -> Self {
        Self { tools }
    }

    pub fn tools(&self) -> &ArrTools {
        &self.tools
    }

    /// Handle one raw JSON-RPC message; notifications produce no reply
    pub async fn handle_message(&self, message: &str) -> Option<String> {
        debug!("Received: {}", message);

        let response = match serde_json::from_str::<Value>(message) {
            Err(e) => {
                error!("Failed to parse request: {}", e);
                Some(JsonRpcResponse::error(
                    None,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                ))
            }
            Ok(value) => {
                let id = value.get("id").cloned().filter(|id| !id.is_null());
                match serde_json::from_value::<JsonRpcRequest>(value) {
                    Ok(request) if request.jsonrpc == JSONRPC_VERSION => {
                        self.handle_request(request).await
                    }
                    Ok(request) => Some(JsonRpcResponse::error(
                        request.id,
                        INVALID_REQUEST,
                        format!("Unsupported jsonrpc version: {}", request.jsonrpc),
                    )),
                    Err(e) => Some(JsonRpcResponse::error(
                        id,
                        INVALID_REQUEST,
                        format!("Invalid Request: {}", e),
                    )),
                }
            }
        };

        let response = response?;
        match serde_json::to_string(&response) {
            Ok(json) => {
                debug!("Sending: {}", json);
                Some(json)
            }
            Err(e) => {
                error!("Failed to serialize response: {}", e);
                None
            }
        }
    }

    /// Dispatch one decoded request; notifications get no reply
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        // Requests without an id are notifications and must not receive a response
        if request.id.is_none() {
            match request.method.as_str() {
                "initialized" | "notifications/initialized" => {
                    info!("Client initialization complete");
                }
                _ => debug!("Received notification: {}", request.method),
            }
            return None;
        }

        let id = request.id;
        Some(match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.handle_list_tools(id),
            "tools/call" => self.handle_call_tool(id, request.params).await,
            "resources/list" => self.handle_list_resources(id),
            "resources/read" => self.handle_read_resource(id, request.params).await,
            _ => JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        })
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        let read_only = self.tools.config().read_only;
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
                resources: Some(ResourcesCapability::default()),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(if read_only {
                "Query Radarr (movies) and Sonarr (TV series). Read-only mode: library changes are disabled.".to_string()
            } else {
                "Query and manage Radarr (movies) and Sonarr (TV series).".to_string()
            }),
        };
        to_response(id, result)
    }

    fn handle_list_tools(&self, id: Option<Value>) -> JsonRpcResponse {
        let tools = self
            .tools
            .list()
            .into_iter()
            .map(|def| Tool {
                name: def.name.to_string(),
                description: def.description.to_string(),
                input_schema: (def.input_schema)(),
            })
            .collect();
        to_response(id, ListToolsResult { tools })
    }

    async fn handle_call_tool(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params = match params {
            Some(p) => p,
            None => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params".to_string());
            }
        };

        let call_params: CallToolParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {}", e));
            }
        };

        let result = self.tools.call(&call_params.name, call_params.arguments).await;
        to_response(
            id,
            CallToolResult {
                content: vec![TextContent::new(result.text)],
                is_error: result.is_error,
            },
        )
    }

    fn handle_list_resources(&self, id: Option<Value>) -> JsonRpcResponse {
        let resources = RESOURCES
            .iter()
            .map(|r| Resource {
                uri: r.uri.to_string(),
                name: r.name.to_string(),
                description: r.description.to_string(),
                mime_type: JSON_MIME_TYPE.to_string(),
            })
            .collect();
        to_response(id, ListResourcesResult { resources })
    }

    async fn handle_read_resource(
        &self,
        id: Option<Value>,
        params: Option<Value>,
    ) -> JsonRpcResponse {
        let params: ReadResourceParams = match params.map(serde_json::from_value) {
            Some(Ok(p)) => p,
            Some(Err(e)) => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {}", e));
            }
            None => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params".to_string());
            }
        };

        if resources::find_resource(&params.uri).is_none() {
            return JsonRpcResponse::error(
                id,
                INVALID_PARAMS,
                format!("Unknown resource: {}", params.uri),
            );
        }

        match resources::read_resource(&self.tools, &params.uri).await {
            Ok(text) => to_response(
                id,
                ReadResourceResult {
                    contents: vec![ResourceContents {
                        uri: params.uri,
                        mime_type: JSON_MIME_TYPE.to_string(),
                        text,
                    }],
                },
            ),
            Err(e) => {
                error!("Failed to read resource {}: {}", params.uri, e);
                JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string())
            }
        }
    }
}

fn to_response<T: serde::Serialize>(id: Option<Value>, result: T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, format!("Internal error: {}", e)),
    }
}
