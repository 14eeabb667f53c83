// Copyright 2026 The Sphere Project
// SPDX-License-Identifier: Apache-2.0

// Response streaming
//
// Responsibilities:
// - Drive one generation stream per response through its own parser
// - Relay the role-selected signal as a `meta` event on arrival
// - Write events as SSE frames in generation order (no reordering)
// - Surface upstream failures as one `error` event
// - Always end with exactly one `data: [DONE]` frame
// - Stop pulling from upstream as soon as the client disconnects

mod driver;
mod emitter;

pub use driver::{ResponseDriver, DEFAULT_CHANNEL_CAPACITY};
pub use emitter::{EmitError, EventEmitter};
