// Copyright 2026 The Sphere Project
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Parsed and validated service config.
#[derive(Debug, Clone)]
pub struct Config {
    /// Config schema version. Always "v1".
    pub version: String,
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub roles: RoleConfig,
    /// SHA256 of the raw YAML: "sha256:{hex}".
    pub config_hash: String,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    /// Frames buffered per response before the driver waits on the client.
    pub channel_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            channel_capacity: 64,
        }
    }
}

/// OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL without the `/chat/completions` suffix.
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub timeout_ms: u64,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Role routing and per-role system instructions.
#[derive(Debug, Clone)]
pub struct RoleConfig {
    /// Role used when classification or lookup gives nothing better.
    pub default: String,
    /// Role name -> system instruction. Always holds every core role.
    pub prompts: HashMap<String, String>,
}

impl RoleConfig {
    /// System instruction for `role`, falling back to the general `system` prompt.
    pub fn prompt_for(&self, role: &str) -> &str {
        self.prompts
            .get(role)
            .or_else(|| self.prompts.get("system"))
            .map(String::as_str)
            .unwrap_or_default()
    }
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            default: super::defaults::DEFAULT_ROLE.to_string(),
            prompts: super::defaults::default_role_prompts(),
        }
    }
}
