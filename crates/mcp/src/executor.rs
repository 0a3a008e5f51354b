// Tool execution: every call ends in a ToolResult envelope

use crate::error::ToolError;
use crate::tools::{Tool, ToolOutput, ToolRegistry};
use gsc_core::ConsoleHandle;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Default upper bound on a single tool call.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(60);

/// Uniform result of a tool call.
///
/// On success the tool-specific fields sit next to `success: true`; on
/// failure only `error` and `tool` accompany `success: false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    #[serde(flatten)]
    pub data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
}

impl ToolResult {
    pub fn ok(data: ToolOutput) -> Self {
        Self {
            success: true,
            data,
            error: None,
            tool: None,
        }
    }

    pub fn failure(tool: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Map::new(),
            error: Some(error.into()),
            tool: Some(tool.to_string()),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }
}

/// Runs catalogue tools against the Search Console handle fixed at startup.
pub struct ToolExecutor {
    registry: ToolRegistry,
    console: ConsoleHandle,
    call_timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry, console: ConsoleHandle) -> Self {
        Self {
            registry,
            console,
            call_timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn console(&self) -> &ConsoleHandle {
        &self.console
    }

    /// Execute a tool by name. Never fails: errors become `success: false`.
    pub async fn execute(&self, tool_name: &str, arguments: &Map<String, Value>) -> ToolResult {
        tracing::info!(tool = tool_name, "Executing tool");

        match self.run(tool_name, arguments).await {
            Ok(data) => ToolResult::ok(data),
            Err(e) => {
                tracing::warn!(tool = tool_name, "Tool failed: {}", e);
                ToolResult::failure(tool_name, e.to_string())
            }
        }
    }

    async fn run(
        &self,
        tool_name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<ToolOutput, ToolError> {
        let (schema, tool) = self
            .registry
            .get(tool_name)
            .ok_or_else(|| ToolError::UnknownTool(tool_name.to_string()))?;

        let api = self
            .console
            .api()
            .map_err(|reason| ToolError::Unavailable(reason.to_string()))?;

        for field in schema.required_params() {
            if !is_present(arguments.get(field)) {
                return Err(ToolError::missing(tool_name, field));
            }
        }

        self.run_with_timeout(tool.as_ref(), api.as_ref(), arguments).await
    }

    async fn run_with_timeout(
        &self,
        tool: &dyn Tool,
        api: &dyn gsc_core::SearchConsoleApi,
        arguments: &Map<String, Value>,
    ) -> Result<ToolOutput, ToolError> {
        tokio::time::timeout(self.call_timeout, tool.execute(api, arguments))
            .await
            .map_err(|_| ToolError::Timeout(self.call_timeout.as_secs()))?
    }
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}
