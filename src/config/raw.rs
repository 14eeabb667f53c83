// Copyright 2026 The Sphere Project
// SPDX-License-Identifier: Apache-2.0

// Raw YAML deserialization types (internal)
// Kept separate from the public Config structs because variable
// interpolation, defaults and validation happen between raw and public.

use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    pub sphere: String,
    pub server: Option<RawServerConfig>,
    pub upstream: RawUpstreamConfig,
    pub roles: Option<RawRoleConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawServerConfig {
    pub port: Option<u16>,
    pub channel_capacity: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawUpstreamConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawRoleConfig {
    pub default: Option<String>,
    #[serde(default)]
    pub prompts: HashMap<String, String>,
}
