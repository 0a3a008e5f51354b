use crate::config::AppState;
use crate::sse;
use anyhow::Result;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use gsc_mcp::LegacyError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

mod handlers;

/// Start the API server
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let shutdown = state.shutdown.clone();
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/test-credentials", get(handlers::test_credentials))
        .route("/tools", get(handlers::list_tools))
        // MCP over SSE: GET opens the stream, POST carries JSON-RPC messages
        .route("/sse", get(sse::sse_handler).post(handlers::sse_message))
        // Legacy flat protocol
        .route("/mcp", post(handlers::legacy_mcp))
        // Middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Resolve on Ctrl-C or SIGTERM, then cancel every SSE session.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
        _ = token.cancelled() => {}
    }

    tracing::info!("Shutting down, closing SSE sessions");
    token.cancel();
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Error type for API handlers
pub struct ApiError(LegacyError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse::new(self.0.to_string());
        let (status, body) = match &self.0 {
            LegacyError::UnknownMethod(_) => (StatusCode::BAD_REQUEST, body),
            LegacyError::InvalidRequest(e) => {
                (StatusCode::BAD_REQUEST, body.with_details(e.to_string()))
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<LegacyError> for ApiError {
    fn from(err: LegacyError) -> Self {
        Self(err)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
