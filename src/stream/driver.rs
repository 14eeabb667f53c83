// Copyright 2026 The Sphere Project
// SPDX-License-Identifier: Apache-2.0

// Response driver
//
// Pulls signals from the generation stream, pushes content deltas
// through a per-response artifact parser, relays the role signal the
// moment it arrives, and always finishes with exactly one `Done`.
// Awaiting the next upstream signal is the only suspension point.

use super::emitter::{EmitError, EventEmitter};
use crate::artifact::ArtifactParser;
use crate::event::OutputEvent;
use crate::upstream::{GenerationRequest, GenerationSource, SignalStream, UpstreamError, UpstreamSignal};
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::Instrument;

/// Default capacity of the per-response outbound channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Turns upstream signals into an ordered SSE byte stream.
///
/// Each call to `run`/`run_source` spawns an independent task with its
/// own parser state; nothing is shared between responses.
#[derive(Debug, Clone)]
pub struct ResponseDriver {
    capacity: usize,
}

impl Default for ResponseDriver {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl ResponseDriver {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
        }
    }

    /// Drive an already-open signal stream.
    pub fn run(&self, signals: SignalStream) -> ReceiverStream<Bytes> {
        let (tx, rx) = mpsc::channel::<Bytes>(self.capacity);

        tokio::spawn(async move {
            let mut emitter = EventEmitter::new(tx);
            let outcome = drive(signals, &mut emitter).await;
            log_outcome(outcome, &emitter);
        });

        ReceiverStream::new(rx)
    }

    /// Open a generation stream for `request` and drive it.
    ///
    /// A failure to open the stream is reported like a mid-stream
    /// failure: one `Error` event, then `Done`. A client that disconnects
    /// while the stream is still opening abandons the open.
    pub fn run_source(
        &self,
        source: Arc<dyn GenerationSource>,
        request: GenerationRequest,
    ) -> ReceiverStream<Bytes> {
        let (tx, rx) = mpsc::channel::<Bytes>(self.capacity);
        let span = tracing::info_span!("response", session_id = %request.session_id);

        tokio::spawn(
            async move {
                tracing::info!(
                    query_len = request.query.len(),
                    target_role = ?request.target_role,
                    "stream started"
                );
                let mut emitter = EventEmitter::new(tx);
                // Opening may include a classification round-trip.
                let opened = tokio::select! {
                    biased;
                    _ = emitter.closed() => None,
                    opened = source.generate(request) => Some(opened),
                };
                let outcome = match opened {
                    Some(Ok(signals)) => drive(signals, &mut emitter).await,
                    Some(Err(e)) => fail(&mut emitter, e).await,
                    None => Err(EmitError::Disconnected),
                };
                log_outcome(outcome, &emitter);
            }
            .instrument(span),
        );

        ReceiverStream::new(rx)
    }
}

/// The per-response loop. Returns early on disconnection, dropping the
/// signal stream and with it the upstream connection.
async fn drive(mut signals: SignalStream, emitter: &mut EventEmitter) -> Result<(), EmitError> {
    let mut parser = ArtifactParser::new();
    let mut role_relayed = false;

    loop {
        let next = tokio::select! {
            biased;
            _ = emitter.closed() => return Err(EmitError::Disconnected),
            next = signals.next() => next,
        };

        let signal = match next {
            Some(Ok(signal)) => signal,
            Some(Err(e)) => return fail(emitter, e).await,
            None => break,
        };

        match signal {
            UpstreamSignal::ContentDelta(delta) => {
                emitter.emit_all(parser.push(&delta)).await?;
            }
            UpstreamSignal::RoleSelected(role) => {
                if role_relayed {
                    tracing::warn!(%role, "duplicate role signal ignored");
                    continue;
                }
                role_relayed = true;
                tracing::debug!(%role, "role selected");
                emitter.emit(OutputEvent::Meta { role }).await?;
            }
        }
    }

    if let Some(tail) = parser.finish() {
        emitter.emit(tail).await?;
    }
    emitter.emit(OutputEvent::Done).await
}

/// Surface an upstream failure, then terminate the response.
async fn fail(emitter: &mut EventEmitter, error: UpstreamError) -> Result<(), EmitError> {
    tracing::error!(error = %error, "generation stream failed");
    emitter
        .emit(OutputEvent::Error {
            message: error.to_string(),
        })
        .await?;
    emitter.emit(OutputEvent::Done).await
}

fn log_outcome(outcome: Result<(), EmitError>, emitter: &EventEmitter) {
    match outcome {
        Ok(()) => tracing::info!(events = emitter.emitted(), "stream finished"),
        Err(e) => tracing::info!(
            events = emitter.emitted(),
            reason = %e,
            "stream stopped before completion"
        ),
    }
}
