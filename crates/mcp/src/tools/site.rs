// get_site_details: permission and verification state of one property

use crate::error::ToolError;
use crate::protocol::ToolSchema;
use crate::tools::{json_schema_object, json_schema_string, required_string, Tool, ToolOutput};
use gsc_core::SearchConsoleApi;
use serde_json::{json, Map, Value};

pub const GET_SITE_DETAILS: &str = "get_site_details";

pub struct SiteDetailsTool;

#[async_trait::async_trait]
impl Tool for SiteDetailsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: GET_SITE_DETAILS.to_string(),
            description: "Ottiene i dettagli di verifica e il livello di permesso di un sito"
                .to_string(),
            input_schema: json_schema_object(
                json!({
                    "site_url": json_schema_string("URL della proprietà (es. https://example.com/ o sc-domain:example.com)")
                }),
                vec!["site_url"],
            ),
        }
    }

    async fn execute(
        &self,
        api: &dyn SearchConsoleApi,
        arguments: &Map<String, Value>,
    ) -> Result<ToolOutput, ToolError> {
        let site_url = required_string(arguments, GET_SITE_DETAILS, "site_url")?;
        let site = api.get_site(site_url).await?;

        let mut output = Map::new();
        output.insert("site_url".to_string(), json!(site.site_url));
        output.insert("verification_method".to_string(), json!(site.verification_method));
        output.insert("permission_level".to_string(), json!(site.permission_level));
        output.insert("verified".to_string(), json!(site.verified.unwrap_or(false)));
        Ok(output)
    }
}
