// Copyright 2026 The Sphere Project
// SPDX-License-Identifier: Apache-2.0

// Upstream generation interface
//
// The generation engine is an external collaborator. It is consumed as
// an ordered stream of signals: content deltas plus at most one
// role-selected notification. Implementations are injected, so the
// stream driver never touches a concrete client.

use futures_util::Stream;
use std::pin::Pin;

/// One signal from the generation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamSignal {
    /// Incremental fragment of generated text.
    ContentDelta(String),
    /// The responding role was decided. At most once per response.
    RoleSelected(String),
}

/// Failures raised while opening or pulling from the generation stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    #[error("generation request failed: {0}")]
    Transport(String),

    #[error("generation request timed out: {0}")]
    Timeout(String),

    #[error("generation service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode generation stream: {0}")]
    Decode(String),

    #[error("generation failed: {0}")]
    Generation(String),
}

pub type SignalStream = Pin<Box<dyn Stream<Item = Result<UpstreamSignal, UpstreamError>> + Send>>;

/// What the client asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub query: String,
    pub session_id: String,
    /// Private chat with a specific role; `None` lets the router decide.
    pub target_role: Option<String>,
}

/// Opens a generation stream for one response.
///
/// Implementations must be Send + Sync so they can be shared across
/// request handlers via `Arc`.
#[async_trait::async_trait]
pub trait GenerationSource: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<SignalStream, UpstreamError>;
}
