// Copyright 2026 The Sphere Project
// SPDX-License-Identifier: Apache-2.0

// Incremental decoding of an OpenAI-style chat-completions SSE body.
//
// Network chunks split lines (and UTF-8 sequences) at arbitrary byte
// offsets, so bytes are held until a full line is available.

use serde::Deserialize;

use crate::upstream::{UpstreamError, UpstreamSignal};

/// Terminator payload sent by OpenAI-compatible servers.
pub const DONE_PAYLOAD: &str = "[DONE]";

/// Splits a byte stream into complete lines.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes, returning every line completed by them (without `\n` / `\r\n`).
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            lines.push(decode_line(&line[..pos]));
        }
        lines
    }

    /// Remaining bytes once the body has ended, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        Some(decode_line(&rest))
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Extract the payload of a `data:` line. Blank lines, comments and other
/// SSE fields (`event:`, `id:`, `retry:`) carry nothing for us.
pub fn parse_data_line(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with(':') {
        return None;
    }
    trimmed
        .strip_prefix("data: ")
        .or_else(|| trimmed.strip_prefix("data:"))
        .map(str::trim)
}

// ---------------------------------------------------------------------------
// Chunk payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// What one `data:` payload means for the signal stream.
#[derive(Debug, PartialEq, Eq)]
pub enum Payload {
    Delta(UpstreamSignal),
    /// Keep-alive, role-only or finish-reason chunk.
    Empty,
    Done,
}

/// Decode one `data:` payload.
pub fn decode_payload(data: &str) -> Result<Payload, UpstreamError> {
    if data == DONE_PAYLOAD {
        return Ok(Payload::Done);
    }
    let chunk: CompletionChunk =
        serde_json::from_str(data).map_err(|e| UpstreamError::Decode(e.to_string()))?;
    if let Some(error) = chunk.error {
        return Err(UpstreamError::Generation(error.message));
    }
    let content = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty());
    Ok(match content {
        Some(content) => Payload::Delta(UpstreamSignal::ContentDelta(content)),
        None => Payload::Empty,
    })
}
