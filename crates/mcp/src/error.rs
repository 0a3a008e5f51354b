// Tool execution failures

use gsc_core::GscError;

/// Every way a tool call can fail. The `Display` text becomes the `error`
/// field of the failed [`ToolResult`](crate::executor::ToolResult).
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Startup authentication failed; the stored reason is reported.
    #[error("Google Search Console service non disponibile: {0}")]
    Unavailable(String),

    #[error("{field} è richiesto per {tool}")]
    MissingArgument { tool: String, field: String },

    #[error("{field} non valido: {message}")]
    InvalidArgument { field: String, message: String },

    /// Upstream failure, message passed through verbatim.
    #[error(transparent)]
    Upstream(#[from] GscError),

    #[error("Timeout dopo {0} secondi")]
    Timeout(u64),

    #[error("Tool sconosciuto: {0}")]
    UnknownTool(String),
}

impl ToolError {
    pub fn missing(tool: &str, field: &str) -> Self {
        Self::MissingArgument {
            tool: tool.to_string(),
            field: field.to_string(),
        }
    }

    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
