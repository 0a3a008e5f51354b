use super::ApiResult;
use crate::config::AppState;
use axum::{body::Bytes, extract::State, Json};
use gsc_mcp::protocol::{JsonRpcResponse, ToolSchema};
use gsc_mcp::tools::LIST_PROPERTIES;
use gsc_mcp::{handle_legacy, LegacyRequest, LegacyResponse};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;

const SERVICE_NAME: &str = "gsc-mcp-server";

fn health_status(state: &AppState) -> &'static str {
    if state.gsc_connected() {
        "healthy"
    } else {
        "degraded"
    }
}

/// Liveness plus connection status
pub async fn root(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "message": "GSC MCP Server is running",
        "status": health_status(&state),
        "gsc_connected": state.gsc_connected(),
        "endpoints": {
            "health": "/health",
            "test_credentials": "/test-credentials",
            "tools": "/tools",
            "sse": "/sse",
            "mcp": "/mcp"
        },
        "tools_available": state.executor.registry().names(),
    }))
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let mut body = json!({
        "status": health_status(&state),
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "gsc_connected": state.gsc_connected(),
        "active_sessions": state.sessions.len(),
    });
    if let Err(reason) = state.executor.console().api() {
        body["gsc_error"] = json!(reason);
    }
    Json(body)
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CredentialCheck {
    Success { properties: Value, count: Value },
    Error { message: String },
}

/// Diagnostic: list properties through the configured credential
pub async fn test_credentials(State(state): State<Arc<AppState>>) -> Json<CredentialCheck> {
    let result = state.executor.execute(LIST_PROPERTIES, &Map::new()).await;

    let check = if result.success {
        CredentialCheck::Success {
            properties: result.get("properties").cloned().unwrap_or_else(|| json!([])),
            count: result.get("count").cloned().unwrap_or_else(|| json!(0)),
        }
    } else {
        CredentialCheck::Error {
            message: result.error.unwrap_or_default(),
        }
    };
    Json(check)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListToolsResponse {
    pub tools: Vec<ToolSchema>,
}

/// Tool catalogue
pub async fn list_tools(State(state): State<Arc<AppState>>) -> Json<ListToolsResponse> {
    Json(ListToolsResponse {
        tools: state.executor.registry().list_schemas(),
    })
}

/// POST /sse: one JSON-RPC message in, one response out.
///
/// Independent of any open SSE stream on the same path.
pub async fn sse_message(State(state): State<Arc<AppState>>, body: Bytes) -> Json<JsonRpcResponse> {
    tracing::debug!("JSON-RPC message: {}", String::from_utf8_lossy(&body));
    Json(state.dispatcher.dispatch_bytes(&body).await)
}

/// POST /mcp: legacy flat protocol
pub async fn legacy_mcp(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Json<LegacyResponse>> {
    let req = LegacyRequest::from_slice(&body)?;
    let response = handle_legacy(&state.executor, req).await?;
    Ok(Json(response))
}
