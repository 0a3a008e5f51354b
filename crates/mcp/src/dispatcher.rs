// JSON-RPC method routing for MCP

use crate::executor::ToolExecutor;
use crate::protocol::{
    response_id, CallToolParams, CallToolResult, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, ServerInfo, ToolContent,
};
use serde_json::Value;
use std::sync::Arc;

/// Why a method produced an error object instead of a result.
#[derive(Debug, thiserror::Error)]
enum DispatchError {
    #[error("Metodo non trovato: {0}")]
    MethodNotFound(String),

    #[error("{0}")]
    Handler(String),
}

impl From<serde_json::Error> for DispatchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Handler(err.to_string())
    }
}

impl From<DispatchError> for JsonRpcError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::MethodNotFound(method) => JsonRpcError::method_not_found(&method),
            DispatchError::Handler(message) => JsonRpcError::server_error(message),
        }
    }
}

/// Routes `initialize`, `tools/list` and `tools/call`.
///
/// Stateless between calls: the only shared pieces are the immutable
/// catalogue and executor.
#[derive(Clone)]
pub struct McpDispatcher {
    executor: Arc<ToolExecutor>,
    server_info: ServerInfo,
}

impl McpDispatcher {
    pub fn new(executor: Arc<ToolExecutor>) -> Self {
        Self {
            executor,
            server_info: ServerInfo::default(),
        }
    }

    pub fn with_server_info(mut self, server_info: ServerInfo) -> Self {
        self.server_info = server_info;
        self
    }

    pub fn executor(&self) -> &Arc<ToolExecutor> {
        &self.executor
    }

    /// The `initialize` result, also pushed on SSE connect.
    pub fn initialize_result(&self) -> InitializeResult {
        InitializeResult::new(self.server_info.clone())
    }

    /// The `tools/list` result.
    pub fn list_tools(&self) -> ListToolsResult {
        ListToolsResult {
            tools: self.executor.registry().list_schemas(),
        }
    }

    /// Handle a raw message body. Always yields exactly one response.
    pub async fn dispatch_bytes(&self, body: &[u8]) -> JsonRpcResponse {
        match serde_json::from_slice::<Value>(body) {
            Ok(message) => self.dispatch_value(message).await,
            Err(e) => {
                tracing::warn!("Unparseable JSON-RPC body: {}", e);
                JsonRpcResponse::error(response_id(None), JsonRpcError::parse_error(e))
            }
        }
    }

    /// Handle an already-parsed JSON message.
    pub async fn dispatch_value(&self, message: Value) -> JsonRpcResponse {
        let id = response_id(message.get("id"));
        match serde_json::from_value::<JsonRpcRequest>(message) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => JsonRpcResponse::error(id, JsonRpcError::invalid_request(e)),
        }
    }

    /// Handle a request, echoing its id (or the default id).
    pub async fn dispatch(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.response_id();
        tracing::info!(method = %request.method, "Received MCP request");

        match self.handle(&request.method, request.params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => {
                tracing::warn!(method = %request.method, "MCP request failed: {}", e);
                JsonRpcResponse::error(id, e.into())
            }
        }
    }

    async fn handle(&self, method: &str, params: Option<Value>) -> Result<Value, DispatchError> {
        match method {
            "initialize" => Ok(serde_json::to_value(self.initialize_result())?),
            "tools/list" => Ok(serde_json::to_value(self.list_tools())?),
            "tools/call" => self.call_tool(params).await,
            other => Err(DispatchError::MethodNotFound(other.to_string())),
        }
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, DispatchError> {
        let params: CallToolParams = serde_json::from_value(params.unwrap_or(Value::Null))?;

        let result = self.executor.execute(&params.name, &params.arguments).await;

        // MCP carries tool output as a serialized text block.
        let text = serde_json::to_string(&result)?;
        Ok(serde_json::to_value(CallToolResult {
            content: vec![ToolContent::text(text)],
        })?)
    }
}
