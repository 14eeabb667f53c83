// Copyright 2026 The Sphere Project
// SPDX-License-Identifier: Apache-2.0

// OpenAI-compatible generation source
//
// Responsibilities:
// - Pick the responding role (explicit target, or a classification call)
// - Open a streaming chat-completions request with the role's prompt
//   plus the artifact protocol instruction
// - Turn the SSE body into `RoleSelected` then `ContentDelta` signals
// - Map HTTP and transport failures onto `UpstreamError`

mod sse;

use std::collections::VecDeque;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::config::{RoleConfig, UpstreamConfig};
use crate::routing::{role_from_decision, select_role};
use crate::upstream::{
    GenerationRequest, GenerationSource, SignalStream, UpstreamError, UpstreamSignal,
};

pub use sse::{decode_payload, parse_data_line, LineDecoder, Payload, DONE_PAYLOAD};

/// Instruction appended to every role prompt so the model wraps
/// substantial content in artifact tags.
pub const ARTIFACT_PROTOCOL: &str = "\
--- ARTIFACT PROTOCOL ---
Be useful and practical.
1. Conversational answers are plain text.
2. Substantial content (scripts, markdown documents, tables, diagrams) must not \
go in plain text. Wrap it in a <sphere_artifact> tag:

<sphere_artifact title=\"name\" type=\"code|markdown|mermaid|csv\" language=\"...\">
[CONTENT]
</sphere_artifact>

Answer in the first person. Be direct and executive.";

const CLASSIFIER_PROMPT: &str = "\
You are the gatekeeper of Sphere. Your only job is to classify user queries.
Always answer with ONE WORD: CTO, CEO, CFO or CMO. Do not explain.
- CTO: code, architecture, technology.
- CEO: strategy, vision, leadership.
- CMO: marketing, sales, growth.
- CFO: finance, budgets, runway.";

/// Longest upstream error body kept in `UpstreamError::Status`.
const MAX_ERROR_BODY: usize = 512;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// HTTP client for the generation upstream.
///
/// `timeout_ms` bounds connecting and each individual body read, never
/// the whole response, so a long generation that keeps producing tokens
/// is not cut off.
pub fn build_client(upstream: &UpstreamConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(upstream.timeout())
        .read_timeout(upstream.timeout())
        .tcp_nodelay(true)
        .build()
}

/// Streams generations from an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiCompatSource {
    client: reqwest::Client,
    upstream: UpstreamConfig,
    roles: RoleConfig,
}

impl OpenAiCompatSource {
    pub fn new(client: reqwest::Client, upstream: UpstreamConfig, roles: RoleConfig) -> Self {
        Self {
            client,
            upstream,
            roles,
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.upstream.base_url)
    }

    /// Full system prompt for `role`.
    pub fn system_prompt(&self, role: &str) -> String {
        format!("{}\n\n{}", self.roles.prompt_for(role), ARTIFACT_PROTOCOL)
    }

    async fn send(&self, body: &ChatRequest<'_>) -> Result<reqwest::Response, UpstreamError> {
        let mut req = self.client.post(self.completions_url()).json(body);
        if !body.stream {
            // A one-shot completion is bounded end to end.
            req = req.timeout(self.upstream.timeout());
        }
        if let Some(key) = &self.upstream.api_key {
            req = req.bearer_auth(key);
        }

        // A streamed generation may run far longer than `timeout_ms`; only
        // the wait for its headers is bounded here. Body reads are bounded
        // per read by the client built in `build_client`.
        let sent = if body.stream {
            match tokio::time::timeout(self.upstream.timeout(), req.send()).await {
                Ok(sent) => sent,
                Err(_) => {
                    return Err(UpstreamError::Timeout(format!(
                        "no response headers within {} ms",
                        self.upstream.timeout_ms
                    )))
                }
            }
        } else {
            req.send().await
        };
        let resp = sent.map_err(map_transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let mut body = resp.text().await.unwrap_or_default();
            truncate_at_char_boundary(&mut body, MAX_ERROR_BODY);
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }

    /// Ask the model which core role should answer `query`.
    async fn classify(&self, query: &str) -> Result<String, UpstreamError> {
        let body = ChatRequest {
            model: &self.upstream.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: CLASSIFIER_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: query,
                },
            ],
            temperature: 0.0,
            stream: false,
        };
        let resp = self.send(&body).await?;
        let completion: ChatCompletion = resp
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;
        let decision = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        let role = role_from_decision(&decision, &self.roles.default);
        tracing::debug!(decision = %decision.trim(), role = %role, "query classified");
        Ok(role)
    }

    async fn resolve_role(&self, request: &GenerationRequest) -> Result<String, UpstreamError> {
        match request.target_role.as_deref() {
            Some(target) => Ok(select_role(target, &self.roles.default)),
            None => self.classify(&request.query).await,
        }
    }
}

#[async_trait]
impl GenerationSource for OpenAiCompatSource {
    async fn generate(&self, request: GenerationRequest) -> Result<SignalStream, UpstreamError> {
        let role = self.resolve_role(&request).await?;
        let system_prompt = self.system_prompt(&role);

        let body = ChatRequest {
            model: &self.upstream.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.query,
                },
            ],
            temperature: self.upstream.temperature,
            stream: true,
        };
        let resp = self.send(&body).await?;
        tracing::debug!(session_id = %request.session_id, role = %role, "upstream stream opened");

        let bytes = resp.bytes_stream().map(|item| item.map_err(map_transport_error));
        let role_signal = futures_util::stream::iter([Ok::<_, UpstreamError>(
            UpstreamSignal::RoleSelected(role),
        )]);
        Ok(Box::pin(role_signal.chain(decode_signals(bytes))))
    }
}

// ---------------------------------------------------------------------------
// Body decoding
// ---------------------------------------------------------------------------

type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, UpstreamError>> + Send>>;

struct DecodeState {
    body: ByteStream,
    lines: LineDecoder,
    pending: VecDeque<Result<UpstreamSignal, UpstreamError>>,
    finished: bool,
}

impl DecodeState {
    fn handle_line(&mut self, line: &str) {
        if self.finished {
            return;
        }
        let Some(data) = parse_data_line(line) else {
            return;
        };
        match decode_payload(data) {
            Ok(Payload::Delta(signal)) => self.pending.push_back(Ok(signal)),
            Ok(Payload::Empty) => {}
            Ok(Payload::Done) => self.finished = true,
            Err(e) => {
                self.pending.push_back(Err(e));
                self.finished = true;
            }
        }
    }
}

/// Turn an SSE body into content signals. Ends at `[DONE]`, at the end of
/// the body, or right after the first error.
pub fn decode_signals(
    body: impl Stream<Item = Result<Bytes, UpstreamError>> + Send + 'static,
) -> SignalStream {
    let state = DecodeState {
        body: Box::pin(body),
        lines: LineDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    let stream = futures_util::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.body.next().await {
                Some(Ok(chunk)) => {
                    for line in state.lines.push(&chunk) {
                        state.handle_line(&line);
                    }
                }
                Some(Err(e)) => {
                    state.pending.push_back(Err(e));
                    state.finished = true;
                }
                None => {
                    if let Some(line) = state.lines.finish() {
                        state.handle_line(&line);
                    }
                    state.finished = true;
                }
            }
        }
    });

    Box::pin(stream)
}

fn map_transport_error(e: reqwest::Error) -> UpstreamError {
    if e.is_timeout() {
        UpstreamError::Timeout(e.to_string())
    } else {
        UpstreamError::Transport(e.to_string())
    }
}

fn truncate_at_char_boundary(text: &mut String, max: usize) {
    if text.len() <= max {
        return;
    }
    let mut cut = max;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
}
