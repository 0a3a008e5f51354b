// MCP (Model Context Protocol) layer for the Search Console gateway:
// protocol types, tool catalogue, executor and method dispatch.

pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod legacy;
pub mod protocol;
pub mod tools;

#[cfg(test)]
mod test_support;

pub use dispatcher::McpDispatcher;
pub use error::ToolError;
pub use executor::{ToolExecutor, ToolResult};
pub use legacy::{handle_legacy, LegacyError, LegacyRequest, LegacyResponse};
