// Copyright 2026 The Sphere Project
// SPDX-License-Identifier: Apache-2.0

use regex::Regex;
use std::sync::LazyLock;

pub const DEFAULT_TITLE: &str = "untitled";
pub const DEFAULT_KIND: &str = "code";
pub const DEFAULT_LANGUAGE: &str = "";

static TITLE_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"title="([^"]+)""#).expect("static regex"));
static TYPE_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"type="([^"]+)""#).expect("static regex"));
static LANGUAGE_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"language="([^"]*)""#).expect("static regex"));

/// Attributes of one artifact, captured when its open tag completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDescriptor {
    pub title: String,
    /// Value of the `type` attribute (code, markdown, mermaid, csv, ...).
    pub kind: String,
    pub language: String,
}

impl Default for ArtifactDescriptor {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            kind: DEFAULT_KIND.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// Extract `title`, `type` and `language` from the text between the
/// open-tag literal and its `>`.
///
/// Missing attributes take their defaults. Unknown or malformed
/// attributes are ignored; this never fails.
pub fn parse_attributes(raw: &str) -> ArtifactDescriptor {
    let capture = |re: &Regex, default: &str| {
        re.captures(raw)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| default.to_string())
    };

    ArtifactDescriptor {
        title: capture(&TITLE_ATTR, DEFAULT_TITLE),
        kind: capture(&TYPE_ATTR, DEFAULT_KIND),
        language: capture(&LANGUAGE_ATTR, DEFAULT_LANGUAGE),
    }
}
