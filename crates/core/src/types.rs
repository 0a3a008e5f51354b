// Search Console data types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format accepted by the Search Analytics API.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Details of a single verified property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteInfo {
    pub site_url: String,
    #[serde(default)]
    pub permission_level: Option<String>,
    #[serde(default)]
    pub verification_method: Option<String>,
    #[serde(default)]
    pub verified: Option<bool>,
}

/// One row of a search analytics response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsRow {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub clicks: f64,
    #[serde(default)]
    pub impressions: f64,
    #[serde(default)]
    pub ctr: f64,
    #[serde(default)]
    pub position: f64,
}

impl AnalyticsRow {
    /// First dimension value (the query text when grouped by `query`).
    pub fn primary_key(&self) -> &str {
        self.keys.first().map(String::as_str).unwrap_or_default()
    }
}

/// Inclusive date range for an analytics query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn start_str(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

/// Parameters of a search analytics query
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsQuery {
    pub range: DateRange,
    pub dimensions: Vec<String>,
    pub row_limit: u32,
}

/// Request body sent to `searchAnalytics/query`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchAnalyticsRequest<'a> {
    pub start_date: String,
    pub end_date: String,
    pub dimensions: &'a [String],
    pub row_limit: u32,
}

impl<'a> From<&'a AnalyticsQuery> for SearchAnalyticsRequest<'a> {
    fn from(query: &'a AnalyticsQuery) -> Self {
        Self {
            start_date: query.range.start_str(),
            end_date: query.range.end_str(),
            dimensions: &query.dimensions,
            row_limit: query.row_limit,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SitesListResponse {
    #[serde(default)]
    pub site_entry: Vec<SiteInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchAnalyticsResponse {
    #[serde(default)]
    pub rows: Vec<AnalyticsRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_range_rejects_inverted_bounds() {
        let a = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 6, 9).unwrap();
        assert!(DateRange::new(a, b).is_some());
        assert!(DateRange::new(a, a).is_some());
        assert!(DateRange::new(b, a).is_none());
    }

    #[test]
    fn test_request_body_shape() {
        let query = AnalyticsQuery {
            range: DateRange::new(
                NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 6, 9).unwrap(),
            )
            .unwrap(),
            dimensions: vec!["query".to_string()],
            row_limit: 25,
        };

        let body = serde_json::to_value(SearchAnalyticsRequest::from(&query)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "startDate": "2024-05-01",
                "endDate": "2024-06-09",
                "dimensions": ["query"],
                "rowLimit": 25
            })
        );
    }

    #[test]
    fn test_site_info_defaults() {
        let site: SiteInfo =
            serde_json::from_str(r#"{"siteUrl":"sc-domain:example.com","permissionLevel":"siteOwner"}"#)
                .unwrap();
        assert_eq!(site.site_url, "sc-domain:example.com");
        assert_eq!(site.permission_level.as_deref(), Some("siteOwner"));
        assert_eq!(site.verified, None);
        assert_eq!(site.verification_method, None);
    }
}
