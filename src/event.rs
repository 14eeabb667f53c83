// Copyright 2026 The Sphere Project
// SPDX-License-Identifier: Apache-2.0

// Output events and their SSE wire encoding.
//
// Each event is one `data: <json>` line followed by a blank line. The
// JSON object carries a `type` discriminator. The stream ends with the
// literal `data: [DONE]` frame.

use crate::artifact::ArtifactDescriptor;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Terminal frame of every response.
pub const DONE_FRAME: &str = "data: [DONE]\n\n";

/// A typed structural event produced for the client channel.
///
/// Emission order is the contract: consumers rebuild the conversation
/// and artifact cards from the sequence exactly as produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputEvent {
    /// Conversational text.
    Token { content: String },
    /// The responding role became known.
    Meta { role: String },
    ArtifactOpen {
        title: String,
        #[serde(rename = "artifact_type")]
        kind: String,
        language: String,
    },
    ArtifactChunk { content: String },
    ArtifactClose,
    Error { message: String },
    /// End of the response. Encoded as `data: [DONE]`.
    Done,
}

impl OutputEvent {
    pub fn token(content: impl Into<String>) -> Self {
        OutputEvent::Token {
            content: content.into(),
        }
    }

    pub fn chunk(content: impl Into<String>) -> Self {
        OutputEvent::ArtifactChunk {
            content: content.into(),
        }
    }

    pub fn open(descriptor: ArtifactDescriptor) -> Self {
        OutputEvent::ArtifactOpen {
            title: descriptor.title,
            kind: descriptor.kind,
            language: descriptor.language,
        }
    }

    /// Text carried by `Token` and `ArtifactChunk` events.
    pub fn content_text(&self) -> Option<&str> {
        match self {
            OutputEvent::Token { content } | OutputEvent::ArtifactChunk { content } => {
                Some(content)
            }
            _ => None,
        }
    }

    /// Encode as one SSE frame: `data: <json>\n\n`.
    pub fn to_sse_frame(&self) -> Bytes {
        if matches!(self, OutputEvent::Done) {
            return Bytes::from_static(DONE_FRAME.as_bytes());
        }
        // Serializing a string-only enum cannot fail; keep the stream
        // well-formed regardless.
        let json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                "{{\"type\":\"error\",\"message\":{}}}",
                serde_json::Value::String(e.to_string())
            )
        });
        Bytes::from(format!("data: {json}\n\n"))
    }
}
