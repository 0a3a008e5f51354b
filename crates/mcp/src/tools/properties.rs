// list_properties: every property visible to the service account

use crate::error::ToolError;
use crate::protocol::ToolSchema;
use crate::tools::{json_schema_object, Tool, ToolOutput};
use gsc_core::SearchConsoleApi;
use serde_json::{json, Map, Value};

pub const LIST_PROPERTIES: &str = "list_properties";

pub struct ListPropertiesTool;

#[async_trait::async_trait]
impl Tool for ListPropertiesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: LIST_PROPERTIES.to_string(),
            description: "Lista tutte le proprietà Google Search Console accessibili".to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
        }
    }

    async fn execute(
        &self,
        api: &dyn SearchConsoleApi,
        _arguments: &Map<String, Value>,
    ) -> Result<ToolOutput, ToolError> {
        let properties = api.list_sites().await?;

        let mut output = Map::new();
        output.insert("count".to_string(), json!(properties.len()));
        output.insert("properties".to_string(), json!(properties));
        Ok(output)
    }
}
