//! Streamable HTTP transport tests, driven through the router without a socket.

#![cfg(feature = "sse")]

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use futures::StreamExt;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use prospero_mcp::prompts::{PromptArguments, PromptRegistry};
use prospero_mcp::protocol::ProtocolHandler;
use prospero_mcp::transport::SseTransport;
use prospero_mcp::types::*;

// ─────────────────────── helpers ───────────────────────

async fn greet(_cancel: CancellationToken, args: PromptArguments) -> McpResult<PromptGetResult> {
    let name = args.get("name").cloned().unwrap_or_default();
    Ok(PromptGetResult {
        description: Some("Test prompt result".to_string()),
        messages: vec![PromptMessage::user(format!("Hello, {name}"))],
    })
}

fn app_with_shutdown(shutdown: CancellationToken) -> Router {
    let mut registry = PromptRegistry::new();
    registry.register(Prompt::new("test-prompt", "A test prompt"), greet);
    let handler = ProtocolHandler::with_server_info(
        Arc::new(registry),
        Implementation::new("test-server", "1.0.0"),
    );
    SseTransport::new(Arc::new(handler), shutdown).router()
}

fn app() -> Router {
    app_with_shutdown(CancellationToken::new())
}

fn transport_with_capacity(max_sessions: usize) -> SseTransport {
    let mut registry = PromptRegistry::new();
    registry.register(Prompt::new("test-prompt", "A test prompt"), greet);
    let handler = ProtocolHandler::new(Arc::new(registry));
    SseTransport::new(Arc::new(handler), CancellationToken::new()).with_max_sessions(max_sessions)
}

async fn post_raw(
    app: &Router,
    session: Option<&str>,
    body: impl Into<Body>,
) -> (StatusCode, HeaderMap, Bytes) {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/mcp")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(id) = session {
        builder = builder.header("Mcp-Session-Id", id);
    }

    let resp = app
        .clone()
        .oneshot(builder.body(body.into()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, bytes)
}

async fn post(app: &Router, session: Option<&str>, msg: Value) -> (StatusCode, Value) {
    let (status, _, bytes) = post_raw(app, session, msg.to_string()).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn request(id: &str, method: &str, params: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params })
}

fn notification(method: &str) -> Value {
    json!({ "jsonrpc": "2.0", "method": method })
}

async fn handshake(app: &Router, session: Option<&str>) {
    let (status, body) = post(app, session, request("init", "initialize", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("result").is_some());

    let (status, _) = post(app, session, notification("initialized")).await;
    assert_eq!(status, StatusCode::ACCEPTED);
}

// ═══════════════════════════════════════════════════════
// SINGLE MESSAGES
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_initialize_over_http() {
    let app = app();
    let (status, headers, bytes) = post_raw(
        &app,
        None,
        request(
            "1",
            "initialize",
            json!({
                "protocolVersion": "2025-03-26",
                "capabilities": {},
                "clientInfo": { "name": "x", "version": "1" }
            }),
        )
        .to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["id"], "1");
    assert_eq!(body["result"]["protocolVersion"], "2025-03-26");
    assert_eq!(body["result"]["serverInfo"]["name"], "test-server");
}

#[tokio::test]
async fn test_initialize_invalid_params_over_http() {
    let app = app();
    let (status, body) = post(&app, None, request("1", "initialize", json!("invalid params"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"]["code"], -32602);
}

#[tokio::test]
async fn test_notification_is_accepted_with_empty_body() {
    let app = app();
    let (status, _, bytes) = post_raw(&app, None, notification("initialized").to_string()).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn test_prompts_gated_until_initialized() {
    let app = app();
    let (_, body) = post(&app, None, request("1", "prompts/list", json!(null))).await;
    assert_eq!(body["error"]["code"], -32002);
    assert_eq!(body["error"]["message"], "Server not initialized");

    handshake(&app, None).await;

    let (_, body) = post(&app, None, request("2", "prompts/list", json!(null))).await;
    let prompts = body["result"]["prompts"].as_array().unwrap();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0]["name"], "test-prompt");
}

#[tokio::test]
async fn test_prompts_get_over_http() {
    let app = app();
    handshake(&app, None).await;

    let (status, body) = post(
        &app,
        None,
        request(
            "1",
            "prompts/get",
            json!({ "name": "test-prompt", "arguments": { "name": "World" } }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["messages"][0]["content"]["text"], "Hello, World");

    let (_, body) = post(&app, None, request("2", "prompts/get", json!({ "name": "unknown-prompt" }))).await;
    assert_eq!(body["error"]["code"], -32603);
}

#[tokio::test]
async fn test_fractional_id_echoed_over_http() {
    let app = app();
    let (status, body) = post(
        &app,
        None,
        json!({"jsonrpc": "2.0", "id": 1.5, "method": "initialize"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1.5);
    assert!(body.get("result").is_some());
}

#[tokio::test]
async fn test_initialized_with_id_is_accepted() {
    let app = app();
    let (status, _, bytes) =
        post_raw(&app, None, request("1", "initialized", json!(null)).to_string()).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn test_unknown_method_over_http() {
    let app = app();
    let (status, body) = post(&app, None, request("1", "unknown/method", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"]["code"], -32601);
}

// ═══════════════════════════════════════════════════════
// BATCHES
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_batch_preserves_order() {
    let app = app();
    let batch = json!([
        request("1", "initialize", json!({})),
        request("2", "initialize", json!({})),
    ]);

    let (status, body) = post(&app, None, batch).await;
    assert_eq!(status, StatusCode::OK);
    let responses = body.as_array().unwrap();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["id"], "1");
    assert_eq!(responses[1]["id"], "2");
}

#[tokio::test]
async fn test_batch_of_notifications_is_accepted() {
    let app = app();
    let batch = json!([notification("initialized"), notification("prompts/list")]);

    let (status, _, bytes) = post_raw(&app, None, batch.to_string()).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn test_mixed_batch_skips_notifications() {
    let app = app();
    let batch = json!([
        request("1", "initialize", json!({})),
        notification("initialized"),
        request("2", "prompts/list", json!(null)),
    ]);

    let (status, body) = post(&app, None, batch).await;
    assert_eq!(status, StatusCode::OK);
    let responses = body.as_array().unwrap();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["id"], "1");
    // Applied in order, so the handshake completed before the list.
    assert_eq!(responses[1]["id"], "2");
    assert!(responses[1].get("result").is_some());
}

#[tokio::test]
async fn test_empty_batch_is_accepted() {
    let app = app();
    let (status, _, _) = post_raw(&app, None, "[]").await;
    assert_eq!(status, StatusCode::ACCEPTED);
}

// ═══════════════════════════════════════════════════════
// REJECTIONS
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_unparseable_body_is_bad_request() {
    let app = app();
    for body in ["invalid json", "", "42", "{\"jsonrpc\":"] {
        let (status, _, bytes) = post_raw(&app, None, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["error"]["code"], -32700);
        assert_eq!(value["error"]["message"], "Parse error");
        assert_eq!(value["id"], Value::Null);
    }
}

#[tokio::test]
async fn test_object_body_error_describes_object() {
    let app = app();
    let (status, _, bytes) =
        post_raw(&app, None, r#"{"jsonrpc":"2.0","id":{},"method":"initialize"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    let detail = value["error"]["data"].as_str().unwrap();
    assert!(!detail.contains("sequence"), "{detail}");
}

#[tokio::test]
async fn test_other_methods_not_allowed() {
    let app = app();
    for method in [Method::PUT, Method::DELETE, Method::PATCH] {
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method.clone())
                    .uri("/mcp")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
    }
}

// ═══════════════════════════════════════════════════════
// EVENT STREAM
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_event_stream_headers_and_shutdown() {
    let shutdown = CancellationToken::new();
    let app = app_with_shutdown(shutdown.clone());

    let resp = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/mcp")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/event-stream");
    assert_eq!(resp.headers()[header::CACHE_CONTROL], "no-cache");
    assert_eq!(resp.headers()[header::CONNECTION], "keep-alive");

    let mut body = resp.into_body().into_data_stream();

    // Nothing is pushed while the server is running.
    let idle = tokio::time::timeout(Duration::from_millis(50), body.next()).await;
    assert!(idle.is_err());

    shutdown.cancel();
    let end = tokio::time::timeout(Duration::from_secs(5), body.next())
        .await
        .expect("stream should close on shutdown");
    assert!(end.is_none());
}

// ═══════════════════════════════════════════════════════
// SESSIONS
// ═══════════════════════════════════════════════════════

async fn mint_session(app: &Router) -> String {
    let (status, headers, _) =
        post_raw(app, None, request("mint", "initialize", json!({})).to_string()).await;
    assert_eq!(status, StatusCode::OK);
    headers
        .get("mcp-session-id")
        .expect("initialize should return a session id")
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_initialize_mints_session_id() {
    let app = app();
    let session = mint_session(&app).await;
    assert!(!session.is_empty());

    let (status, _) = post(&app, Some(session.as_str()), notification("initialized")).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (_, body) = post(&app, Some(session.as_str()), request("2", "prompts/list", json!(null))).await;
    assert!(body.get("result").is_some());

    // The shared session is untouched.
    let (_, body) = post(&app, None, request("3", "prompts/list", json!(null))).await;
    assert_eq!(body["error"]["code"], -32002);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let app = app();
    let alpha = mint_session(&app).await;
    let beta = mint_session(&app).await;
    assert_ne!(alpha, beta);

    handshake(&app, Some(alpha.as_str())).await;

    let (_, body) = post(&app, Some(alpha.as_str()), request("1", "prompts/list", json!(null))).await;
    assert!(body.get("result").is_some());

    let (_, body) = post(&app, Some(beta.as_str()), request("2", "prompts/list", json!(null))).await;
    assert_eq!(body["error"]["code"], -32002);
}

#[tokio::test]
async fn test_no_session_id_without_initialize() {
    let app = app();
    let (_, headers, _) = post_raw(&app, None, request("1", "prompts/list", json!(null)).to_string()).await;
    assert!(headers.get("mcp-session-id").is_none());

    let known = mint_session(&app).await;
    let (status, headers, _) =
        post_raw(&app, Some(known.as_str()), request("2", "initialize", json!({})).to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers.get("mcp-session-id").is_none());
}

#[tokio::test]
async fn test_unknown_session_ids_are_rejected() {
    let transport = transport_with_capacity(16);
    let app = transport.router();

    for i in 0..200 {
        let id = format!("junk-{i}");
        let (status, _, _) =
            post_raw(&app, Some(id.as_str()), request("1", "prompts/list", json!(null)).to_string()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
    assert_eq!(transport.state().sessions.count().await, 0);
}

#[tokio::test]
async fn test_minted_sessions_stay_bounded() {
    let transport = transport_with_capacity(8);
    let app = transport.router();

    let kept = mint_session(&app).await;
    handshake(&app, Some(kept.as_str())).await;

    for _ in 0..100 {
        mint_session(&app).await;
    }
    assert_eq!(transport.state().sessions.count().await, 8);

    // A client that finished its handshake outlives abandoned ones.
    let (status, body) = post(&app, Some(kept.as_str()), request("1", "prompts/list", json!(null))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("result").is_some());
}
