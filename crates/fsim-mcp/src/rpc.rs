use serde_json::{Value, json};

use crate::prompts::PromptRegistry;
use crate::server::McpServer;

pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

#[derive(Debug, serde::Deserialize)]
pub struct JsonRpcRequest {
    #[allow(dead_code)]
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    pub params: Option<Value>,
}

#[derive(Debug, serde::Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl JsonRpcResponse {
    pub fn result(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(json!({
                "code": code,
                "message": message.into()
            })),
        }
    }
}

/// Handles one JSON-RPC request against the tool and prompt registries.
/// Returns `None` for notifications, which expect no response.
pub async fn dispatch(
    server: &McpServer,
    prompts: &PromptRegistry,
    request: JsonRpcRequest,
) -> Option<JsonRpcResponse> {
    if request.method.starts_with("notifications/") {
        return None;
    }

    let response = match request.method.as_str() {
        "initialize" => JsonRpcResponse::result(
            request.id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {},
                    "prompts": {}
                },
                "serverInfo": {
                    "name": "fsim-mcp",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        ),

        "tools/list" => JsonRpcResponse::result(
            request.id,
            json!({
                "tools": server.tool_schemas().iter().map(|s| json!({
                    "name": s.name,
                    "description": s.description,
                    "inputSchema": s.parameters
                })).collect::<Vec<_>>()
            }),
        ),

        "tools/call" => {
            let params = request.params.unwrap_or(Value::Null);
            match params.get("name").and_then(|v| v.as_str()) {
                Some(name) => {
                    let arguments = params
                        .get("arguments")
                        .cloned()
                        .unwrap_or_else(|| json!({}));
                    let response = server.call_tool(name, arguments).await;
                    match serde_json::to_value(&response) {
                        Ok(result) => JsonRpcResponse::result(request.id, result),
                        Err(e) => JsonRpcResponse::error(
                            request.id,
                            INVALID_PARAMS,
                            format!("unserializable tool response: {e}"),
                        ),
                    }
                }
                None => JsonRpcResponse::error(
                    request.id,
                    INVALID_PARAMS,
                    "Invalid params: missing 'name'",
                ),
            }
        }

        "prompts/list" => JsonRpcResponse::result(request.id, prompts.list()),

        "prompts/get" => {
            let params = request.params.unwrap_or(Value::Null);
            match params.get("name").and_then(|v| v.as_str()) {
                Some(name) => {
                    let arguments = params
                        .get("arguments")
                        .cloned()
                        .unwrap_or_else(|| json!({}));
                    match prompts.get(name, &arguments) {
                        Ok(result) => JsonRpcResponse::result(request.id, result),
                        Err(e) => {
                            JsonRpcResponse::error(request.id, INVALID_PARAMS, e.to_string())
                        }
                    }
                }
                None => JsonRpcResponse::error(
                    request.id,
                    INVALID_PARAMS,
                    "Invalid params: missing 'name'",
                ),
            }
        }

        other => JsonRpcResponse::error(
            request.id,
            METHOD_NOT_FOUND,
            format!("Method not found: {other}"),
        ),
    };

    Some(response)
}
