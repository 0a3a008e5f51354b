pub mod analytics;
pub mod properties;
pub mod site;
mod registry;

pub use analytics::{AnalyticsSettings, SearchAnalyticsTool, GET_SEARCH_ANALYTICS};
pub use properties::{ListPropertiesTool, LIST_PROPERTIES};
pub use registry::{
    json_schema_object, json_schema_string, required_string, string_arg, Tool, ToolOutput,
    ToolRegistry,
};
pub use site::{SiteDetailsTool, GET_SITE_DETAILS};

use std::sync::Arc;

/// The fixed catalogue: `list_properties`, `get_search_analytics`,
/// `get_site_details`, in that order.
pub fn default_registry(analytics: AnalyticsSettings) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(ListPropertiesTool));
    registry.register(Arc::new(SearchAnalyticsTool::new(analytics)));
    registry.register(Arc::new(SiteDetailsTool));
    registry
}
