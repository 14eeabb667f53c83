// Copyright 2026 The Sphere Project
// SPDX-License-Identifier: Apache-2.0

// Config loader and validator
//
// Loads sphere.yaml, validates structure, resolves variable interpolation
// and computes a deterministic config fingerprint.

mod defaults;
mod error;
mod interpolation;
mod loader;
mod raw;
mod types;

pub use defaults::default_role_prompts;
pub use error::ConfigError;
pub use interpolation::resolve_variables;
pub use loader::{compute_hash, load_config, ConfigSource};
pub use types::*;
