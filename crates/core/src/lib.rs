// Google Search Console access for the MCP gateway

pub mod client;
pub mod credentials;
pub mod error;
pub mod types;

pub use client::{ConsoleHandle, SearchConsoleApi, SearchConsoleClient, DEFAULT_API_BASE_URL};
pub use credentials::{ServiceAccountAuth, ServiceAccountKey, StaticToken, TokenSource};
pub use error::{GscError, GscResult};
pub use types::*;
