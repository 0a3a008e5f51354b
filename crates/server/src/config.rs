use crate::sse::SessionRegistry;
use anyhow::{bail, Context, Result};
use gsc_core::{ConsoleHandle, DEFAULT_API_BASE_URL};
use gsc_mcp::tools::analytics::parse_date;
use gsc_mcp::tools::{default_registry, AnalyticsSettings};
use gsc_mcp::{McpDispatcher, ToolExecutor};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub search_console: SearchConsoleConfig,

    #[serde(default)]
    pub analytics: AnalyticsSettings,

    #[serde(default)]
    pub sse: SseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConsoleConfig {
    /// Must end with `/`; API paths are joined onto it.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Environment variable holding the base64 service-account key.
    #[serde(default = "default_credentials_env")]
    pub credentials_env: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_credentials_env() -> String {
    "GOOGLE_SERVICE_ACCOUNT_KEY".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_tool_timeout_secs() -> u64 {
    60
}

impl Default for SearchConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            credentials_env: default_credentials_env(),
            request_timeout_secs: default_request_timeout_secs(),
            tool_timeout_secs: default_tool_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SseConfig {
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
}

fn default_heartbeat_interval_secs() -> u64 {
    30
}

impl Default for SseConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
        }
    }
}

impl ServerConfig {
    pub fn load(config_path: &Path) -> Result<Self> {
        // Load config file if it exists, otherwise use defaults
        let config: Self = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .context("Failed to read configuration file")?;
            toml::from_str(&content).context("Failed to parse configuration file")?
        } else {
            tracing::info!("Configuration file not found, using defaults");
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.search_console.api_base_url)
            .context("Invalid search_console.api_base_url")?;
        if !base.path().ends_with('/') {
            bail!(
                "search_console.api_base_url must end with '/': {}",
                self.search_console.api_base_url
            );
        }

        let start = parse_date("default_start_date", &self.analytics.default_start_date)?;
        let end = parse_date("default_end_date", &self.analytics.default_end_date)?;
        if start > end {
            bail!("analytics.default_start_date is after analytics.default_end_date");
        }
        if self.analytics.row_limit == 0 {
            bail!("analytics.row_limit must be positive");
        }
        if self.sse.heartbeat_interval_secs == 0 {
            bail!("sse.heartbeat_interval_secs must be positive");
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.search_console.request_timeout_secs)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.search_console.tool_timeout_secs)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.sse.heartbeat_interval_secs)
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<ToolExecutor>,
    pub dispatcher: McpDispatcher,
    pub sessions: SessionRegistry,
    pub heartbeat_interval: Duration,
    /// Cancelled on graceful shutdown; parent of every SSE session token.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Startup phase: authenticate once and freeze the result.
    pub fn new(config: &ServerConfig) -> Self {
        let console = ConsoleHandle::connect_from_env(
            &config.search_console.credentials_env,
            &config.search_console.api_base_url,
            config.request_timeout(),
        );
        Self::with_console(config, console)
    }

    pub fn with_console(config: &ServerConfig, console: ConsoleHandle) -> Self {
        let executor = Arc::new(
            ToolExecutor::new(default_registry(config.analytics.clone()), console)
                .with_timeout(config.tool_timeout()),
        );
        let dispatcher = McpDispatcher::new(executor.clone());

        Self {
            executor,
            dispatcher,
            sessions: SessionRegistry::new(),
            heartbeat_interval: config.heartbeat_interval(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn gsc_connected(&self) -> bool {
        self.executor.console().is_connected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::load(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.search_console.credentials_env, "GOOGLE_SERVICE_ACCOUNT_KEY");
        assert_eq!(config.analytics.default_start_date, "2024-05-01");
        assert_eq!(config.analytics.default_end_date, "2024-06-09");
        assert_eq!(config.analytics.row_limit, 25);
        assert_eq!(config.analytics.top_queries, 10);
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_file_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[analytics]
default_start_date = "2024-01-01"
default_end_date = "2024-12-31"

[sse]
heartbeat_interval_secs = 5
"#
        )
        .unwrap();

        let config = ServerConfig::load(file.path()).unwrap();
        assert_eq!(config.analytics.default_start_date, "2024-01-01");
        assert_eq!(config.analytics.row_limit, 25);
        assert_eq!(config.sse.heartbeat_interval_secs, 5);
        assert_eq!(config.search_console.tool_timeout_secs, 60);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = ServerConfig::default();
        config.analytics.default_start_date = "2024-13-01".to_string();
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.analytics.default_start_date = "2024-07-01".to_string();
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.sse.heartbeat_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_base_url_needs_trailing_slash() {
        let mut config = ServerConfig::default();
        config.search_console.api_base_url = "https://proxy.internal/api".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must end with '/'"));

        config.search_console.api_base_url = "https://proxy.internal/api/".to_string();
        assert!(config.validate().is_ok());

        config.search_console.api_base_url = "https://proxy.internal".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_app_state_without_credentials_is_degraded() {
        let mut config = ServerConfig::default();
        config.search_console.credentials_env = "GSC_TEST_SURELY_UNSET_VARIABLE".to_string();

        let state = AppState::new(&config);
        assert!(!state.gsc_connected());
        assert_eq!(state.executor.registry().len(), 3);
    }
}
