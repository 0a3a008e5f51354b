// Search Console API client

use crate::credentials::{ServiceAccountAuth, ServiceAccountKey, TokenSource};
use crate::error::{GscError, GscResult};
use crate::types::{
    AnalyticsQuery, AnalyticsRow, SearchAnalyticsRequest, SearchAnalyticsResponse, SiteInfo,
    SitesListResponse,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default base URL of the Search Console API.
pub const DEFAULT_API_BASE_URL: &str = "https://searchconsole.googleapis.com/";

/// The three read operations the gateway needs from Search Console.
#[async_trait::async_trait]
pub trait SearchConsoleApi: Send + Sync {
    /// URLs of every property the credential can see.
    async fn list_sites(&self) -> GscResult<Vec<String>>;

    /// Details of one property.
    async fn get_site(&self, site_url: &str) -> GscResult<SiteInfo>;

    /// Search analytics rows, in the order the API returns them.
    async fn query_analytics(
        &self,
        site_url: &str,
        query: &AnalyticsQuery,
    ) -> GscResult<Vec<AnalyticsRow>>;
}

/// HTTP implementation of [`SearchConsoleApi`].
pub struct SearchConsoleClient {
    http: Client,
    base_url: Url,
    tokens: Arc<dyn TokenSource>,
}

impl SearchConsoleClient {
    pub fn new(base_url: Url, tokens: Arc<dyn TokenSource>, timeout: Duration) -> GscResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("gsc-mcp/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    /// Build `webmasters/v3/sites[/{site_url}[/tail...]]`, encoding the site
    /// URL as a single path segment.
    fn sites_url(&self, site_url: Option<&str>, tail: &[&str]) -> GscResult<Url> {
        let mut url = self.base_url.join("webmasters/v3/sites")?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| GscError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?;
            if let Some(site) = site_url {
                segments.push(site);
            }
            segments.extend(tail);
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> GscResult<T> {
        let token = self.tokens.access_token().await?;

        let response = request.bearer_auth(token).send().await.map_err(|e| {
            if e.is_timeout() {
                GscError::Timeout
            } else {
                GscError::Http(e)
            }
        })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Search Console request failed");
            return Err(GscError::from_response(status.as_u16(), &body));
        }

        if body.trim().is_empty() {
            return Ok(serde_json::from_str("{}")?);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait::async_trait]
impl SearchConsoleApi for SearchConsoleClient {
    async fn list_sites(&self) -> GscResult<Vec<String>> {
        let url = self.sites_url(None, &[])?;
        tracing::debug!("GET {}", url);

        let response: SitesListResponse = self.send(self.http.get(url)).await?;
        Ok(response.site_entry.into_iter().map(|s| s.site_url).collect())
    }

    async fn get_site(&self, site_url: &str) -> GscResult<SiteInfo> {
        let url = self.sites_url(Some(site_url), &[])?;
        tracing::debug!("GET {}", url);

        self.send(self.http.get(url)).await
    }

    async fn query_analytics(
        &self,
        site_url: &str,
        query: &AnalyticsQuery,
    ) -> GscResult<Vec<AnalyticsRow>> {
        let url = self.sites_url(Some(site_url), &["searchAnalytics", "query"])?;
        tracing::debug!("POST {}", url);

        let body = SearchAnalyticsRequest::from(query);
        let response: SearchAnalyticsResponse = self.send(self.http.post(url).json(&body)).await?;
        Ok(response.rows)
    }
}

/// Outcome of the startup authentication phase.
///
/// Built once and shared read-only afterwards. `Unavailable` keeps the reason
/// so every later tool call can report it.
#[derive(Clone)]
pub enum ConsoleHandle {
    Connected(Arc<dyn SearchConsoleApi>),
    Unavailable(String),
}

impl ConsoleHandle {
    /// Authenticate from a base64 service-account key held in `env_var`.
    ///
    /// Never fails: any problem yields [`ConsoleHandle::Unavailable`].
    pub fn connect_from_env(env_var: &str, base_url: &str, timeout: Duration) -> Self {
        match Self::try_connect(env_var, base_url, timeout) {
            Ok(handle) => {
                tracing::info!("Google Search Console service initialised");
                handle
            }
            Err(e) => {
                tracing::warn!("Google Search Console service unavailable: {}", e);
                Self::Unavailable(e.to_string())
            }
        }
    }

    fn try_connect(env_var: &str, base_url: &str, timeout: Duration) -> GscResult<Self> {
        let key = ServiceAccountKey::from_env(env_var)?;
        let auth = ServiceAccountAuth::new(&key, timeout)?;
        tracing::info!("Loaded service account {}", auth.client_email());

        let client = SearchConsoleClient::new(Url::parse(base_url)?, Arc::new(auth), timeout)?;
        Ok(Self::Connected(Arc::new(client)))
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }

    /// The API handle, or the stored startup failure.
    pub fn api(&self) -> Result<&Arc<dyn SearchConsoleApi>, &str> {
        match self {
            Self::Connected(api) => Ok(api),
            Self::Unavailable(reason) => Err(reason),
        }
    }
}

impl std::fmt::Debug for ConsoleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connected(_) => f.write_str("Connected"),
            Self::Unavailable(reason) => f.debug_tuple("Unavailable").field(reason).finish(),
        }
    }
}
