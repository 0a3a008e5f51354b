// Tool catalogue: each entry ties a descriptor to its handler

use crate::error::ToolError;
use crate::protocol::ToolSchema;
use gsc_core::SearchConsoleApi;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Tool-specific fields of a successful result.
pub type ToolOutput = Map<String, Value>;

/// A callable tool. The schema and the handler live on the same type, so a
/// descriptor cannot exist without its implementation.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool schema for MCP
    fn schema(&self) -> ToolSchema;

    /// Execute the tool. Required arguments have already been checked
    /// against the schema.
    async fn execute(
        &self,
        api: &dyn SearchConsoleApi,
        arguments: &Map<String, Value>,
    ) -> Result<ToolOutput, ToolError>;
}

struct Entry {
    schema: ToolSchema,
    tool: Arc<dyn Tool>,
}

/// Immutable-after-startup registry of tools, in registration order.
pub struct ToolRegistry {
    entries: Vec<Entry>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a tool, replacing any previous tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let schema = tool.schema();
        match self.entries.iter_mut().find(|e| e.schema.name == schema.name) {
            Some(entry) => *entry = Entry { schema, tool },
            None => self.entries.push(Entry { schema, tool }),
        }
    }

    /// Get a tool and its schema by name
    pub fn get(&self, name: &str) -> Option<(&ToolSchema, Arc<dyn Tool>)> {
        self.entries
            .iter()
            .find(|e| e.schema.name == name)
            .map(|e| (&e.schema, e.tool.clone()))
    }

    /// List all tool schemas
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.entries.iter().map(|e| e.schema.clone()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.schema.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.schema.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A string argument, treating absent, null, non-string and empty alike.
pub fn string_arg<'a>(arguments: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    arguments
        .get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// A required string argument.
pub fn required_string<'a>(
    arguments: &'a Map<String, Value>,
    tool: &str,
    name: &str,
) -> Result<&'a str, ToolError> {
    string_arg(arguments, name).ok_or_else(|| ToolError::missing(tool, name))
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: Value, required: Vec<&str>) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_string(description: &str) -> Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct NamedTool(&'static str, &'static str);

    #[async_trait::async_trait]
    impl Tool for NamedTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: self.0.to_string(),
                description: self.1.to_string(),
                input_schema: json_schema_object(json!({}), vec![]),
            }
        }

        async fn execute(
            &self,
            _api: &dyn SearchConsoleApi,
            _arguments: &Map<String, Value>,
        ) -> Result<ToolOutput, ToolError> {
            Ok(Map::new())
        }
    }

    #[test]
    fn test_registration_order_is_preserved() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(NamedTool("b", "")));
        registry.register(Arc::new(NamedTool("a", "")));
        registry.register(Arc::new(NamedTool("c", "")));

        assert_eq!(registry.names(), vec!["b", "a", "c"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(NamedTool("a", "first")));
        registry.register(Arc::new(NamedTool("a", "second")));

        assert_eq!(registry.len(), 1);
        let (schema, _) = registry.get("a").unwrap();
        assert_eq!(schema.description, "second");
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_string_arg() {
        let args = json!({"a": "x", "b": "  ", "c": 3, "d": null})
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(string_arg(&args, "a"), Some("x"));
        assert_eq!(string_arg(&args, "b"), None);
        assert_eq!(string_arg(&args, "c"), None);
        assert_eq!(string_arg(&args, "d"), None);
        assert_eq!(string_arg(&args, "e"), None);

        let err = required_string(&args, "tool_x", "e").unwrap_err();
        assert_eq!(err.to_string(), "e è richiesto per tool_x");
    }
}
