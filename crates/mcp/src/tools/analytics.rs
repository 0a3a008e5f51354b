// get_search_analytics: top queries and click/impression totals for a property

use crate::error::ToolError;
use crate::protocol::ToolSchema;
use crate::tools::{json_schema_object, json_schema_string, required_string, string_arg, Tool, ToolOutput};
use chrono::NaiveDate;
use gsc_core::{AnalyticsQuery, AnalyticsRow, DateRange, SearchConsoleApi, DATE_FORMAT};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const GET_SEARCH_ANALYTICS: &str = "get_search_analytics";

/// Query shape and defaults for analytics requests.
///
/// The default window is a fixed historical range, not a rolling one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSettings {
    #[serde(default = "default_start_date")]
    pub default_start_date: String,
    #[serde(default = "default_end_date")]
    pub default_end_date: String,
    /// Rows requested from the API; totals are summed over all of them.
    #[serde(default = "default_row_limit")]
    pub row_limit: u32,
    /// Rows echoed back under `top_queries`.
    #[serde(default = "default_top_queries")]
    pub top_queries: usize,
}

fn default_start_date() -> String {
    "2024-05-01".to_string()
}

fn default_end_date() -> String {
    "2024-06-09".to_string()
}

fn default_row_limit() -> u32 {
    25
}

fn default_top_queries() -> usize {
    10
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            default_start_date: default_start_date(),
            default_end_date: default_end_date(),
            row_limit: default_row_limit(),
            top_queries: default_top_queries(),
        }
    }
}

/// Parse a `YYYY-MM-DD` date, naming the offending field on failure.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ToolError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| ToolError::invalid(field, format!("'{}' ({}), formato atteso YYYY-MM-DD", value, e)))
}

/// One entry of `top_queries`.
#[derive(Debug, Serialize)]
struct QueryRow<'a> {
    query: &'a str,
    clicks: f64,
    impressions: f64,
    ctr: f64,
    position: f64,
}

impl<'a> From<&'a AnalyticsRow> for QueryRow<'a> {
    fn from(row: &'a AnalyticsRow) -> Self {
        Self {
            query: row.primary_key(),
            clicks: row.clicks,
            impressions: row.impressions,
            ctr: row.ctr,
            position: row.position,
        }
    }
}

pub struct SearchAnalyticsTool {
    settings: AnalyticsSettings,
}

impl SearchAnalyticsTool {
    pub fn new(settings: AnalyticsSettings) -> Self {
        Self { settings }
    }

    fn date_range(&self, arguments: &Map<String, Value>) -> Result<DateRange, ToolError> {
        let start = string_arg(arguments, "start_date")
            .unwrap_or(self.settings.default_start_date.as_str());
        let end =
            string_arg(arguments, "end_date").unwrap_or(self.settings.default_end_date.as_str());

        let start_date = parse_date("start_date", start)?;
        let end_date = parse_date("end_date", end)?;

        DateRange::new(start_date, end_date).ok_or_else(|| {
            ToolError::invalid(
                "start_date",
                format!("{} è successiva a end_date {}", start, end),
            )
        })
    }
}

impl Default for SearchAnalyticsTool {
    fn default() -> Self {
        Self::new(AnalyticsSettings::default())
    }
}

#[async_trait::async_trait]
impl Tool for SearchAnalyticsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: GET_SEARCH_ANALYTICS.to_string(),
            description: format!(
                "Ottiene le query principali, i click e le impressioni di un sito. \
                 Periodo predefinito: {} - {}",
                self.settings.default_start_date, self.settings.default_end_date
            ),
            input_schema: json_schema_object(
                json!({
                    "site_url": json_schema_string("URL della proprietà (es. https://example.com/ o sc-domain:example.com)"),
                    "start_date": json_schema_string(&format!(
                        "Data di inizio YYYY-MM-DD (predefinita: {})",
                        self.settings.default_start_date
                    )),
                    "end_date": json_schema_string(&format!(
                        "Data di fine YYYY-MM-DD (predefinita: {})",
                        self.settings.default_end_date
                    ))
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
        let site_url = required_string(arguments, GET_SEARCH_ANALYTICS, "site_url")?;
        let range = self.date_range(arguments)?;

        let query = AnalyticsQuery {
            range,
            dimensions: vec!["query".to_string()],
            row_limit: self.settings.row_limit,
        };
        let rows = api.query_analytics(site_url, &query).await?;

        // Totals cover every returned row, not just the ones echoed back.
        let total_clicks: f64 = rows.iter().map(|r| r.clicks).sum();
        let total_impressions: f64 = rows.iter().map(|r| r.impressions).sum();
        let top: Vec<QueryRow> = rows
            .iter()
            .take(self.settings.top_queries)
            .map(QueryRow::from)
            .collect();

        let mut output = Map::new();
        output.insert("site_url".to_string(), json!(site_url));
        output.insert("start_date".to_string(), json!(range.start_str()));
        output.insert("end_date".to_string(), json!(range.end_str()));
        output.insert("total_queries".to_string(), json!(rows.len()));
        output.insert("total_clicks".to_string(), json!(total_clicks.round() as u64));
        output.insert("total_impressions".to_string(), json!(total_impressions.round() as u64));
        output.insert("top_queries".to_string(), json!(top));
        Ok(output)
    }
}
