// Copyright 2026 The Sphere Project
// SPDX-License-Identifier: Apache-2.0

// HTTP surface
//
// Responsibilities:
// - POST /api/v1/stream: validate the request, open a generation stream
//   through the injected source and answer with the SSE event stream
// - POST /api/v1/chat: the same generation drained into one JSON reply
// - GET /api/v1/health and GET / for liveness and identification
// - 404 for unknown paths

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_stream::StreamExt;

use crate::config::ServerConfig;
use crate::stream::ResponseDriver;
use crate::upstream::{GenerationRequest, GenerationSource, UpstreamError, UpstreamSignal};

pub const SERVICE_NAME: &str = "sphere-stream";

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Request rejections, plus generation failures on the non-streaming route.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("request body is empty")]
    EmptyBody,

    #[error("request body is not valid JSON: {0}")]
    MalformedJson(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Generation(#[from] UpstreamError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, public_message) = match &self {
            ServerError::EmptyBody => (StatusCode::BAD_REQUEST, "request body is empty".to_string()),
            ServerError::MalformedJson(_) => (
                StatusCode::BAD_REQUEST,
                "request body is not valid JSON".to_string(),
            ),
            ServerError::InvalidRequest(reason) => (StatusCode::BAD_REQUEST, reason.clone()),
            ServerError::Generation(UpstreamError::Timeout(_)) => (
                StatusCode::GATEWAY_TIMEOUT,
                "generation timed out".to_string(),
            ),
            ServerError::Generation(_) => {
                (StatusCode::BAD_GATEWAY, "generation failed".to_string())
            }
        };
        (status, Json(json!({ "detail": public_message }))).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ServerError> {
    if body.is_empty() {
        return Err(ServerError::EmptyBody);
    }
    serde_json::from_slice(body).map_err(|e| ServerError::MalformedJson(e.to_string()))
}

fn require_query(query: &str) -> Result<(), ServerError> {
    if query.trim().is_empty() {
        return Err(ServerError::InvalidRequest("query must not be empty".into()));
    }
    Ok(())
}

/// An empty target means "let the router decide".
fn normalize_target(target_role: Option<String>) -> Option<String> {
    target_role.filter(|role| !role.trim().is_empty())
}

#[derive(Debug, Deserialize)]
pub struct StreamRequest {
    pub query: String,
    pub session_id: String,
    #[serde(default)]
    pub target_role: Option<String>,
}

impl StreamRequest {
    /// Parse and validate a raw request body.
    pub fn from_body(body: &[u8]) -> Result<Self, ServerError> {
        let request: StreamRequest = parse_body(body)?;
        require_query(&request.query)?;
        if request.session_id.trim().is_empty() {
            return Err(ServerError::InvalidRequest(
                "session_id must not be empty".into(),
            ));
        }
        Ok(request)
    }

    pub fn into_generation_request(self) -> GenerationRequest {
        GenerationRequest {
            query: self.query,
            session_id: self.session_id,
            target_role: normalize_target(self.target_role),
        }
    }
}

/// Body of the non-streaming chat route. It carries no session.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    #[serde(default)]
    pub target_role: Option<String>,
}

static CHAT_SEQ: AtomicU64 = AtomicU64::new(1);

impl ChatRequest {
    pub fn from_body(body: &[u8]) -> Result<Self, ServerError> {
        let request: ChatRequest = parse_body(body)?;
        require_query(&request.query)?;
        Ok(request)
    }

    /// Chat requests get a process-local id so their logs can be told apart.
    pub fn into_generation_request(self) -> GenerationRequest {
        GenerationRequest {
            query: self.query,
            session_id: format!("chat-{}", CHAT_SEQ.fetch_add(1, Ordering::Relaxed)),
            target_role: normalize_target(self.target_role),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub role: String,
    /// Raw generated text, artifact tags included.
    pub response: String,
}

/// Run one generation to completion and join its deltas.
pub async fn collect_reply(
    source: &dyn GenerationSource,
    request: GenerationRequest,
) -> Result<ChatReply, UpstreamError> {
    let mut signals = source.generate(request).await?;
    let mut role = None;
    let mut response = String::new();
    while let Some(signal) = signals.next().await {
        match signal? {
            UpstreamSignal::ContentDelta(delta) => response.push_str(&delta),
            UpstreamSignal::RoleSelected(selected) => {
                role.get_or_insert(selected);
            }
        }
    }
    Ok(ChatReply {
        role: role.unwrap_or_default(),
        response,
    })
}

// ---------------------------------------------------------------------------
// Shared application state
// ---------------------------------------------------------------------------

/// Shared state injected into axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn GenerationSource>,
    pub driver: ResponseDriver,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/health
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "active", "service": SERVICE_NAME }))
}

/// GET /
pub async fn root() -> Json<serde_json::Value> {
    Json(json!({ "service": SERVICE_NAME, "version": env!("CARGO_PKG_VERSION") }))
}

/// POST /api/v1/stream
///
/// Validation failures are plain 400s. Once the body is accepted the
/// response is always 200 SSE; generation failures travel in-band as
/// an `error` event followed by the sentinel.
pub async fn stream_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match StreamRequest::from_body(&body) {
        Ok(r) => r.into_generation_request(),
        Err(e) => {
            tracing::warn!(error = %e, "stream request rejected");
            return e.into_response();
        }
    };

    let frames = state
        .driver
        .run_source(state.source.clone(), request)
        .map(Ok::<_, Infallible>);

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
            (X_ACCEL_BUFFERING, "no"),
        ],
        Body::from_stream(frames),
    )
        .into_response()
}

/// POST /api/v1/chat
pub async fn chat_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match ChatRequest::from_body(&body) {
        Ok(r) => r.into_generation_request(),
        Err(e) => {
            tracing::warn!(error = %e, "chat request rejected");
            return e.into_response();
        }
    };
    let session_id = request.session_id.clone();

    match collect_reply(state.source.as_ref(), request).await {
        Ok(reply) => {
            tracing::info!(
                %session_id,
                role = %reply.role,
                response_len = reply.response.len(),
                "chat answered"
            );
            Json(reply).into_response()
        }
        Err(e) => {
            tracing::error!(%session_id, error = %e, "chat generation failed");
            ServerError::from(e).into_response()
        }
    }
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "not found" })))
}

// ---------------------------------------------------------------------------
// Router construction
// ---------------------------------------------------------------------------

/// Build the axum router. The generation source is injected; no clients
/// are constructed here.
pub fn build_router(source: Arc<dyn GenerationSource>, settings: &ServerConfig) -> Router {
    let state = AppState {
        source,
        driver: ResponseDriver::new(settings.channel_capacity),
    };

    Router::new()
        .route("/", get(root))
        .route("/api/v1/health", get(health))
        // The trailing-slash forms are what existing clients post to.
        .route("/api/v1/stream", post(stream_handler))
        .route("/api/v1/stream/", post(stream_handler))
        .route("/api/v1/chat", post(chat_handler))
        .route("/api/v1/chat/", post(chat_handler))
        .fallback(not_found)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
