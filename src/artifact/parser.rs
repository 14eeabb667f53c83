// Copyright 2026 The Sphere Project
// SPDX-License-Identifier: Apache-2.0

// Mode controller
//
// Holds the Outside/Inside mode and the two mode-specific buffers. Each
// delta is appended to the live buffer, the matcher decides whether the
// buffer is resolved, and resolved text is turned into events. Only a
// tail that could still grow into a delimiter is ever held back.

use super::attributes::parse_attributes;
use super::matcher::{match_close_tag, match_open_tag, TagMatch, OPEN_TAG};
use crate::event::OutputEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Conversational text.
    #[default]
    Outside,
    /// Inside an artifact body.
    Inside,
}

/// Incremental parser for one streamed response.
///
/// Owned by a single response; never shared or reused across responses.
/// Exactly one buffer is live at a time, the other is empty.
#[derive(Debug, Default)]
pub struct ArtifactParser {
    mode: Mode,
    pub(super) outside_buffer: String,
    pub(super) inside_buffer: String,
}

impl ArtifactParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_inside(&self) -> bool {
        self.mode == Mode::Inside
    }

    /// Text currently withheld in the live buffer.
    pub fn pending(&self) -> &str {
        match self.mode {
            Mode::Outside => &self.outside_buffer,
            Mode::Inside => &self.inside_buffer,
        }
    }

    /// Feed one delta and return the events it resolves, in order.
    pub fn push(&mut self, delta: &str) -> Vec<OutputEvent> {
        let mut events = Vec::new();
        if delta.is_empty() {
            return events;
        }
        match self.mode {
            Mode::Outside => self.push_outside(delta, &mut events),
            Mode::Inside => self.push_inside(delta, &mut events),
        }
        events
    }

    /// Resolve whatever is left when the upstream is exhausted.
    ///
    /// Outside: non-whitespace leftovers become a final `Token`. Inside:
    /// the unterminated artifact body is dropped, not force-closed.
    /// The `Done` sentinel belongs to the caller.
    pub fn finish(&mut self) -> Option<OutputEvent> {
        match self.mode {
            Mode::Outside => {
                let rest = std::mem::take(&mut self.outside_buffer);
                if rest.trim().is_empty() {
                    None
                } else {
                    Some(OutputEvent::token(rest))
                }
            }
            Mode::Inside => {
                let dropped = std::mem::take(&mut self.inside_buffer);
                tracing::warn!(
                    dropped_bytes = dropped.len(),
                    "stream ended inside an artifact; pending body dropped"
                );
                None
            }
        }
    }

    fn push_outside(&mut self, delta: &str, events: &mut Vec<OutputEvent>) {
        self.outside_buffer.push_str(delta);

        match match_open_tag(&self.outside_buffer) {
            TagMatch::Complete { start, end } => {
                let buffer = std::mem::take(&mut self.outside_buffer);

                // Raw, unstripped: whitespace before the tag is content.
                if start > 0 {
                    events.push(OutputEvent::token(&buffer[..start]));
                }

                let descriptor = parse_attributes(&buffer[start + OPEN_TAG.len()..end]);
                tracing::info!(
                    title = %descriptor.title,
                    kind = %descriptor.kind,
                    language = %descriptor.language,
                    "artifact opened"
                );
                events.push(OutputEvent::open(descriptor));
                self.mode = Mode::Inside;

                // Text after `>` is artifact body. It goes through the
                // inside path so a close tag in the same delta is honored.
                let residue = &buffer[end + 1..];
                if !residue.is_empty() {
                    self.push_inside(residue, events);
                }
            }
            TagMatch::Pending { .. } | TagMatch::Partial { .. } => {}
            TagMatch::Absent => {
                let text = std::mem::take(&mut self.outside_buffer);
                events.push(OutputEvent::token(text));
            }
        }
    }

    fn push_inside(&mut self, delta: &str, events: &mut Vec<OutputEvent>) {
        self.inside_buffer.push_str(delta);

        match match_close_tag(&self.inside_buffer) {
            TagMatch::Complete { start, end } => {
                let buffer = std::mem::take(&mut self.inside_buffer);

                if start > 0 {
                    events.push(OutputEvent::chunk(&buffer[..start]));
                }
                events.push(OutputEvent::ArtifactClose);
                tracing::debug!("artifact closed");

                self.mode = Mode::Outside;
                self.outside_buffer.clear();

                // Chat text resumed in the same delta is emitted as-is and
                // not rescanned for another open tag.
                let after = &buffer[end..];
                if !after.is_empty() {
                    events.push(OutputEvent::token(after));
                }
            }
            TagMatch::Partial { .. } | TagMatch::Pending { .. } => {}
            TagMatch::Absent => {
                let body = std::mem::take(&mut self.inside_buffer);
                events.push(OutputEvent::chunk(body));
            }
        }
    }
}
