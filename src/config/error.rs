// Copyright 2026 The Sphere Project
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

/// Why a sphere config could not be turned into a `Config`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("sphere config is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid sphere config: {0}")]
    Invalid(String),

    #[error("config references ${{{name}}}, which is not set in the environment")]
    UnsetVariable { name: String },
}
