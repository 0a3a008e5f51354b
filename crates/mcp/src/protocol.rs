// MCP protocol types and definitions (JSON-RPC 2.0)

use serde::{Deserialize, Serialize};

/// MCP protocol revision announced by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Id used when an inbound request carries none.
pub const DEFAULT_REQUEST_ID: &str = "1";

/// Implementation-defined server error (handler failure).
pub const SERVER_ERROR: i32 = -32000;

/// JSON-RPC 2.0 Request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default = "default_jsonrpc")]
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

fn default_jsonrpc() -> String {
    "2.0".to_string()
}

impl JsonRpcRequest {
    pub fn new(
        id: impl Into<serde_json::Value>,
        method: impl Into<String>,
        params: Option<serde_json::Value>,
    ) -> Self {
        Self {
            jsonrpc: default_jsonrpc(),
            id: Some(id.into()),
            method: method.into(),
            params,
        }
    }

    /// The request id, or the default id when absent or null.
    pub fn response_id(&self) -> serde_json::Value {
        response_id(self.id.as_ref())
    }
}

/// Resolve the id to echo back for a possibly missing inbound id.
pub fn response_id(id: Option<&serde_json::Value>) -> serde_json::Value {
    match id {
        Some(id) if !id.is_null() => id.clone(),
        _ => serde_json::Value::String(DEFAULT_REQUEST_ID.to_string()),
    }
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: serde_json::Value,
    #[serde(flatten)]
    pub outcome: JsonRpcOutcome,
}

/// Exactly one of `result` or `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonRpcOutcome {
    Result(serde_json::Value),
    Error(JsonRpcError),
}

impl JsonRpcResponse {
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            outcome: JsonRpcOutcome::Result(result),
        }
    }

    pub fn error(id: serde_json::Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            outcome: JsonRpcOutcome::Error(error),
        }
    }

    pub fn result(&self) -> Option<&serde_json::Value> {
        match &self.outcome {
            JsonRpcOutcome::Result(value) => Some(value),
            JsonRpcOutcome::Error(_) => None,
        }
    }

    pub fn error_object(&self) -> Option<&JsonRpcError> {
        match &self.outcome {
            JsonRpcOutcome::Error(error) => Some(error),
            JsonRpcOutcome::Result(_) => None,
        }
    }
}

/// JSON-RPC 2.0 Error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    pub fn parse_error(detail: impl std::fmt::Display) -> Self {
        Self {
            code: -32700,
            message: format!("Parse error: {}", detail),
            data: None,
        }
    }

    pub fn invalid_request(detail: impl std::fmt::Display) -> Self {
        Self {
            code: -32600,
            message: format!("Invalid Request: {}", detail),
            data: None,
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: format!("Metodo non trovato: {}", method),
            data: None,
        }
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self {
            code: SERVER_ERROR,
            message: message.into(),
            data: None,
        }
    }
}

// MCP-specific protocol messages

/// Tool definition for MCP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

impl ToolSchema {
    /// Parameter names listed under `inputSchema.required`.
    pub fn required_params(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(|r| r.as_array())
            .map(|names| names.iter().filter_map(|n| n.as_str()).collect())
            .unwrap_or_default()
    }
}

/// List tools response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListToolsResult {
    pub tools: Vec<ToolSchema>,
}

/// Call tool request params
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    /// Absent and `null` both mean no arguments.
    #[serde(default, deserialize_with = "null_as_empty_map")]
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

fn null_as_empty_map<'de, D>(
    deserializer: D,
) -> Result<serde_json::Map<String, serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let map: Option<serde_json::Map<String, serde_json::Value>> =
        Deserialize::deserialize(deserializer)?;
    Ok(map.unwrap_or_default())
}

/// Call tool response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolResult {
    pub content: Vec<ToolContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
}

impl ToolContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// Initialize response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

impl InitializeResult {
    pub fn new(server_info: ServerInfo) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsCapability {
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: "gsc-mcp-server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
