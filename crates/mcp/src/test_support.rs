// In-memory Search Console stand-in for unit tests

use gsc_core::{AnalyticsQuery, AnalyticsRow, GscError, GscResult, SearchConsoleApi, SiteInfo};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub struct StubConsole {
    pub sites: Vec<String>,
    pub rows: Vec<AnalyticsRow>,
    pub site: Option<SiteInfo>,
    pub fail_with: Option<String>,
    pub calls: AtomicUsize,
    pub last_query: Mutex<Option<(String, AnalyticsQuery)>>,
}

impl StubConsole {
    pub fn new() -> Self {
        Self {
            sites: vec![
                "https://example.com/".to_string(),
                "sc-domain:example.org".to_string(),
            ],
            rows: Vec::new(),
            site: None,
            fail_with: None,
            calls: AtomicUsize::new(0),
            last_query: Mutex::new(None),
        }
    }

    pub fn with_rows(rows: Vec<AnalyticsRow>) -> Self {
        Self {
            rows,
            ..Self::new()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) -> GscResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(message) => Err(GscError::Api {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

pub fn row(query: &str, clicks: f64, impressions: f64) -> AnalyticsRow {
    AnalyticsRow {
        keys: vec![query.to_string()],
        clicks,
        impressions,
        ctr: if impressions > 0.0 { clicks / impressions } else { 0.0 },
        position: 1.0,
    }
}

#[async_trait::async_trait]
impl SearchConsoleApi for StubConsole {
    async fn list_sites(&self) -> GscResult<Vec<String>> {
        self.record()?;
        Ok(self.sites.clone())
    }

    async fn get_site(&self, site_url: &str) -> GscResult<SiteInfo> {
        self.record()?;
        Ok(self.site.clone().unwrap_or_else(|| SiteInfo {
            site_url: site_url.to_string(),
            permission_level: Some("siteOwner".to_string()),
            verification_method: None,
            verified: None,
        }))
    }

    async fn query_analytics(
        &self,
        site_url: &str,
        query: &AnalyticsQuery,
    ) -> GscResult<Vec<AnalyticsRow>> {
        self.record()?;
        *self.last_query.lock().unwrap() = Some((site_url.to_string(), query.clone()));
        Ok(self.rows.clone())
    }
}
