// Flat `{method, params}` protocol kept for older clients

use crate::executor::{ToolExecutor, ToolResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Legacy request: the tool name is the method, no JSON-RPC envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyRequest {
    pub method: String,
    #[serde(default)]
    pub params: Option<Map<String, Value>>,
}

impl LegacyRequest {
    /// Parse a raw request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, LegacyError> {
        serde_json::from_slice(body).map_err(LegacyError::InvalidRequest)
    }
}

/// Legacy response: either `result` or `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ToolResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<ToolResult> for LegacyResponse {
    fn from(result: ToolResult) -> Self {
        if result.success {
            Self {
                result: Some(result),
                error: None,
            }
        } else {
            Self {
                result: None,
                error: Some(result.error.unwrap_or_default()),
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LegacyError {
    /// Reported to HTTP clients as 400.
    #[error("Metodo non implementato: {0}")]
    UnknownMethod(String),

    /// Body is not JSON or lacks `method`. Also a 400.
    #[error("Richiesta non valida")]
    InvalidRequest(#[source] serde_json::Error),
}

/// Run a legacy request. Known methods are exactly the catalogue tool names.
pub async fn handle_legacy(
    executor: &ToolExecutor,
    request: LegacyRequest,
) -> Result<LegacyResponse, LegacyError> {
    if !executor.registry().contains(&request.method) {
        return Err(LegacyError::UnknownMethod(request.method));
    }

    tracing::info!(method = %request.method, "Received legacy MCP request");
    let arguments = request.params.unwrap_or_default();
    let result = executor.execute(&request.method, &arguments).await;
    Ok(result.into())
}
