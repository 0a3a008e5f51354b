// SSE transport: connection frames, heartbeats and the session registry

use crate::config::AppState;
use async_stream::stream;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use chrono::{DateTime, Utc};
use futures::Stream;
use gsc_mcp::protocol::{ServerCapabilities, ServerInfo, ToolSchema};
use gsc_mcp::McpDispatcher;
use serde::Serialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Frames pushed to SSE clients
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SseFrame {
    Connection {
        status: &'static str,
        session_id: Uuid,
    },
    ServerInfo {
        #[serde(rename = "protocolVersion")]
        protocol_version: String,
        #[serde(rename = "serverInfo")]
        server_info: ServerInfo,
        capabilities: ServerCapabilities,
    },
    Tools {
        tools: Vec<ToolSchema>,
    },
    Heartbeat {
        timestamp: DateTime<Utc>,
        session_id: Uuid,
    },
    Error {
        message: String,
    },
}

impl SseFrame {
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "connect",
            Self::ServerInfo { .. } => "server_info",
            Self::Tools { .. } => "tools",
            Self::Heartbeat { .. } => "heartbeat",
            Self::Error { .. } => "error",
        }
    }

    fn to_event(&self) -> Result<Event, axum::Error> {
        Event::default().event(self.event_name()).json_data(self)
    }

    fn error_event(message: &str) -> Event {
        let frame = Self::Error {
            message: message.to_string(),
        };
        frame
            .to_event()
            .unwrap_or_else(|_| Event::default().event("error").data(r#"{"type":"error"}"#))
    }
}

/// A live SSE connection
#[derive(Debug)]
pub struct SseSession {
    pub id: Uuid,
    pub connected_at: DateTime<Utc>,
}

/// Process-wide table of open SSE sessions.
///
/// Each entry is written only by its own session: inserted on connect,
/// removed when the session's guard drops.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<Uuid, SseSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, SseSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new session whose token is a child of `parent`.
    pub fn open(&self, parent: &CancellationToken) -> SessionGuard {
        let session = SseSession {
            id: Uuid::new_v4(),
            connected_at: Utc::now(),
        };
        let guard = SessionGuard {
            id: session.id,
            cancel: parent.child_token(),
            registry: self.clone(),
        };

        let active = {
            let mut sessions = self.lock();
            sessions.insert(session.id, session);
            sessions.len()
        };
        tracing::info!(session_id = %guard.id, active, "SSE session opened");

        guard
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn remove(&self, id: &Uuid) -> Option<SseSession> {
        self.lock().remove(id)
    }
}

/// Owns a session's registry entry; dropping it tears the session down.
pub struct SessionGuard {
    id: Uuid,
    cancel: CancellationToken,
    registry: SessionRegistry,
}

impl SessionGuard {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(session) = self.registry.remove(&self.id) {
            let duration = Utc::now() - session.connected_at;
            tracing::info!(
                session_id = %self.id,
                duration_secs = duration.num_seconds(),
                "SSE session closed"
            );
        }
    }
}

/// GET /sse
pub async fn sse_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let guard = state.sessions.open(&state.shutdown);
    Sse::new(session_stream(
        guard,
        state.dispatcher.clone(),
        state.heartbeat_interval,
    ))
}

/// Connecting -> Streaming -> Closed.
///
/// The guard moves into the stream, so the stream being dropped (client
/// gone) or ending (cancelled, error) removes the session exactly once.
pub fn session_stream(
    guard: SessionGuard,
    dispatcher: McpDispatcher,
    heartbeat_interval: Duration,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream! {
        let session_id = guard.id();
        let cancel = guard.token();

        let init = dispatcher.initialize_result();
        let opening = [
            SseFrame::Connection { status: "connected", session_id },
            SseFrame::ServerInfo {
                protocol_version: init.protocol_version,
                server_info: init.server_info,
                capabilities: init.capabilities,
            },
            SseFrame::Tools { tools: dispatcher.list_tools().tools },
        ];

        let mut failed = false;
        for frame in opening {
            match frame.to_event() {
                Ok(event) => yield Ok(event),
                Err(e) => {
                    tracing::error!(session_id = %session_id, "Failed to encode SSE frame: {}", e);
                    yield Ok(SseFrame::error_event(&e.to_string()));
                    failed = true;
                    break;
                }
            }
        }

        if !failed {
            let mut ticker = interval_at(Instant::now() + heartbeat_interval, heartbeat_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!(session_id = %session_id, "SSE session cancelled");
                        break;
                    }
                    _ = ticker.tick() => {}
                }

                let heartbeat = SseFrame::Heartbeat { timestamp: Utc::now(), session_id };
                match heartbeat.to_event() {
                    Ok(event) => {
                        tracing::debug!(session_id = %session_id, "SSE heartbeat");
                        yield Ok(event);
                    }
                    Err(e) => {
                        tracing::error!(session_id = %session_id, "Failed to encode heartbeat: {}", e);
                        yield Ok(SseFrame::error_event(&e.to_string()));
                        break;
                    }
                }
            }
        }

        drop(guard);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use gsc_core::ConsoleHandle;
    use gsc_mcp::tools::{default_registry, AnalyticsSettings};
    use gsc_mcp::ToolExecutor;

    fn dispatcher() -> McpDispatcher {
        let executor = ToolExecutor::new(
            default_registry(AnalyticsSettings::default()),
            ConsoleHandle::Unavailable("test".to_string()),
        );
        McpDispatcher::new(Arc::new(executor))
    }

    #[test]
    fn test_frame_shapes() {
        let id = Uuid::nil();
        let connect = serde_json::to_value(SseFrame::Connection {
            status: "connected",
            session_id: id,
        })
        .unwrap();
        assert_eq!(connect["type"], "connection");
        assert_eq!(connect["status"], "connected");

        let error = serde_json::to_value(SseFrame::Error {
            message: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(error, serde_json::json!({"type": "error", "message": "boom"}));

        let heartbeat = SseFrame::Heartbeat {
            timestamp: Utc::now(),
            session_id: id,
        };
        assert_eq!(heartbeat.event_name(), "heartbeat");
        assert_eq!(serde_json::to_value(&heartbeat).unwrap()["type"], "heartbeat");
    }

    #[test]
    fn test_registry_open_and_drop() {
        let registry = SessionRegistry::new();
        let root = CancellationToken::new();

        let first = registry.open(&root);
        let second = registry.open(&root);
        assert_eq!(registry.len(), 2);
        assert_ne!(first.id(), second.id());

        drop(first);
        assert_eq!(registry.len(), 1);

        drop(second);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_shutdown_cancels_sessions() {
        let registry = SessionRegistry::new();
        let root = CancellationToken::new();
        let guard = registry.open(&root);

        root.cancel();
        assert!(guard.token().is_cancelled());
    }

    #[tokio::test]
    async fn test_dropped_stream_removes_session() {
        let registry = SessionRegistry::new();
        let root = CancellationToken::new();
        let before = registry.len();

        let stream = session_stream(registry.open(&root), dispatcher(), Duration::from_secs(30));
        let mut stream = Box::pin(stream);

        // connect, server_info, tools
        for _ in 0..3 {
            assert!(stream.next().await.is_some());
        }
        assert_eq!(registry.len(), before + 1);

        drop(stream);
        assert_eq!(registry.len(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeats_then_cancel_ends_stream() {
        let registry = SessionRegistry::new();
        let root = CancellationToken::new();
        let guard = registry.open(&root);
        let cancel = guard.token();

        let mut stream = Box::pin(session_stream(guard, dispatcher(), Duration::from_secs(30)));
        for _ in 0..3 {
            stream.next().await;
        }

        // Paused clock auto-advances to the next tick.
        assert!(stream.next().await.is_some());
        assert!(stream.next().await.is_some());

        cancel.cancel();
        assert!(stream.next().await.is_none());
        assert_eq!(registry.len(), 0);
    }
}
