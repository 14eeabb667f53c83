// Copyright 2026 The Sphere Project
// SPDX-License-Identifier: Apache-2.0

// Event emitter
//
// Serializes output events into SSE frames and writes them, in order,
// to the bounded channel feeding the HTTP response body.

use crate::event::OutputEvent;
use bytes::Bytes;
use tokio::sync::mpsc;

/// Why an event could not be written. Neither is a failure of the
/// response itself: both mean "stop producing".
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EmitError {
    /// The client went away; the receiving half of the channel is closed.
    #[error("client disconnected")]
    Disconnected,
    /// `Done` was already written; nothing may follow it.
    #[error("response already finished")]
    Finished,
}

/// Writes one response's events to its outbound channel.
pub struct EventEmitter {
    tx: mpsc::Sender<Bytes>,
    finished: bool,
    emitted: usize,
}

impl EventEmitter {
    pub fn new(tx: mpsc::Sender<Bytes>) -> Self {
        Self {
            tx,
            finished: false,
            emitted: 0,
        }
    }

    /// Write one event as a `data:` frame.
    pub async fn emit(&mut self, event: OutputEvent) -> Result<(), EmitError> {
        if self.finished {
            return Err(EmitError::Finished);
        }
        if event == OutputEvent::Done {
            self.finished = true;
        }
        self.tx
            .send(event.to_sse_frame())
            .await
            .map_err(|_| EmitError::Disconnected)?;
        self.emitted += 1;
        Ok(())
    }

    /// Write events in order, stopping at the first failure.
    pub async fn emit_all(
        &mut self,
        events: impl IntoIterator<Item = OutputEvent>,
    ) -> Result<(), EmitError> {
        for event in events {
            self.emit(event).await?;
        }
        Ok(())
    }

    /// Resolves once the client side of the channel has been dropped.
    pub async fn closed(&self) {
        self.tx.closed().await
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of events written so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }
}
