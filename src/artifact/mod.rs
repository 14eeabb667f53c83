// Copyright 2026 The Sphere Project
// SPDX-License-Identifier: Apache-2.0

// Artifact tag parsing
//
// Responsibilities:
// - Detect `<sphere_artifact ...>` / `</sphere_artifact>` delimiters in a
//   token stream, including delimiters split across any number of deltas
// - Pass conversational text and artifact bodies through as soon as they
//   can no longer be part of a delimiter
// - Extract title/type/language from the open tag, with defaults
// - Drop an unterminated artifact at end of stream instead of closing it

mod attributes;
mod matcher;
mod parser;

pub use attributes::{parse_attributes, ArtifactDescriptor};
pub use matcher::{match_close_tag, match_open_tag, Delimiter, TagMatch, CLOSE_TAG, OPEN_TAG};
pub use parser::{ArtifactParser, Mode};

#[cfg(test)]
mod tests;
