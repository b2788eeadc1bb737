//! Streamable HTTP transport: JSON-RPC over POST plus an SSE stream on GET.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    routing::get,
    Router,
};
use futures::StreamExt;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::protocol::{McpMethod, ProtocolHandler};
use crate::session::store::SESSION_HEADER;
use crate::session::{SessionState, SessionStore};
use crate::types::{JsonRpcRequest, McpError, McpResult, RequestId};

/// Route the endpoint is mounted on unless configured otherwise.
pub const DEFAULT_PATH: &str = "/mcp";

/// Shared server state passed to all handlers via axum State.
pub struct ServerState {
    pub handler: Arc<ProtocolHandler>,
    pub sessions: SessionStore,
    pub shutdown: CancellationToken,
}

/// HTTP transport for web-based MCP clients.
pub struct SseTransport {
    state: Arc<ServerState>,
    path: String,
}

impl SseTransport {
    pub fn new(handler: Arc<ProtocolHandler>, shutdown: CancellationToken) -> Self {
        Self {
            state: Arc::new(ServerState {
                handler,
                sessions: SessionStore::new(),
                shutdown,
            }),
            path: DEFAULT_PATH.to_string(),
        }
    }

    /// Cap the number of identified sessions kept at once.
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.state = Arc::new(ServerState {
            handler: Arc::clone(&self.state.handler),
            sessions: SessionStore::with_capacity(max_sessions),
            shutdown: self.state.shutdown.clone(),
        });
        self
    }

    /// Mount the endpoint on `path` instead of `/mcp`.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    /// Build the router. GET and POST are served; any other method on the
    /// route gets 405 from the method router.
    pub fn router(&self) -> Router {
        Router::new()
            .route(&self.path, get(handle_stream).post(handle_post))
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
            .with_state(Arc::clone(&self.state))
    }

    /// Run the HTTP server on the given address until the shutdown token fires.
    pub async fn run(&self, addr: &str) -> McpResult<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(McpError::Io)?;

        let local = listener.local_addr().map_err(McpError::Io)?;
        tracing::info!("HTTP transport listening on http://{local}{}", self.path);

        let shutdown = self.state.shutdown.clone();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| McpError::Transport(e.to_string()))?;

        tracing::info!("HTTP transport stopped");
        Ok(())
    }
}

/// GET: open an event stream for server-initiated messages.
///
/// Nothing is pushed yet. The stream stays open until the client goes away
/// (the body is dropped) or the server shuts down.
async fn handle_stream(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    tracing::debug!("SSE stream opened");

    let stream = futures::stream::pending::<Result<Event, Infallible>>()
        .take_until(state.shutdown.clone().cancelled_owned());

    (
        [(header::CONNECTION, HeaderValue::from_static("keep-alive"))],
        Sse::new(stream),
    )
}

enum Payload {
    Single(JsonRpcRequest),
    Batch(Vec<JsonRpcRequest>),
}

impl Payload {
    /// An array body is a batch; anything else must be a single object.
    /// Choosing by shape keeps the reported error relevant to the body.
    fn parse(body: &[u8]) -> McpResult<Self> {
        let is_array = body
            .iter()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|b| *b == b'[');

        let parsed = if is_array {
            serde_json::from_slice::<Vec<JsonRpcRequest>>(body).map(Payload::Batch)
        } else {
            serde_json::from_slice::<JsonRpcRequest>(body).map(Payload::Single)
        };
        parsed.map_err(|e| McpError::ParseError(e.to_string()))
    }

    fn opens_handshake(&self) -> bool {
        let is_initialize = |r: &JsonRpcRequest| {
            !r.is_notification() && McpMethod::parse(&r.method) == McpMethod::Initialize
        };
        match self {
            Payload::Single(request) => is_initialize(request),
            Payload::Batch(batch) => batch.iter().any(is_initialize),
        }
    }
}

/// POST: one JSON-RPC message or a batch.
async fn handle_post(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let payload = match Payload::parse(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!("Rejecting unparseable body: {e}");
            return json_body(StatusCode::BAD_REQUEST, &e.to_json_rpc_error(RequestId::Null));
        }
    };

    let (session, minted_id) = match resolve_session(&state, &headers, &payload).await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };
    let cancel = state.shutdown.child_token();
    let handler = &state.handler;

    let mut response = match payload {
        Payload::Single(request) => {
            match handler.handle_message(&session, request, &cancel).await {
                Some(response) => json_body(StatusCode::OK, &response),
                // Also covers `initialized` sent with an id: nothing to
                // return, so 202 rather than 200 with an empty body.
                None => StatusCode::ACCEPTED.into_response(),
            }
        }
        Payload::Batch(batch) => {
            let mut responses = Vec::with_capacity(batch.len());
            for request in batch {
                if let Some(response) = handler.handle_message(&session, request, &cancel).await {
                    responses.push(response);
                }
            }

            if responses.is_empty() {
                StatusCode::ACCEPTED.into_response()
            } else {
                json_body(StatusCode::OK, &responses)
            }
        }
    };

    if let Some(id) = minted_id {
        if let Ok(value) = HeaderValue::from_str(&id) {
            response.headers_mut().insert(SESSION_HEADER, value);
        }
    }

    response
}

/// Pick the session a request belongs to.
///
/// A session header must name a session this server minted; anything else
/// is answered with 404 so the client starts over. Without a header the
/// request runs on the shared default session; if it carries an
/// `initialize` request, a new session id is minted and returned so the
/// client can opt into its own session.
async fn resolve_session(
    state: &ServerState,
    headers: &HeaderMap,
    payload: &Payload,
) -> Result<(Arc<SessionState>, Option<String>), Response> {
    let requested = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty());

    if let Some(id) = requested {
        return match state.sessions.get(id).await {
            Some(session) => Ok((session, None)),
            None => {
                tracing::debug!("Unknown session {id}");
                Err((StatusCode::NOT_FOUND, "Session not found").into_response())
            }
        };
    }

    if payload.opens_handshake() {
        let (id, _) = state.sessions.create().await;
        return Ok((state.sessions.default_session(), Some(id)));
    }

    Ok((state.sessions.default_session(), None))
}

/// Encode `value` as the JSON body of a response with the given status.
///
/// An encoding failure is logged and reported in the body; the status is
/// kept.
fn json_body<T: Serialize>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(bytes) => (
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode response: {e}");
            (status, format!("Error encoding response: {e}")).into_response()
        }
    }
}
