// Copyright 2026 The Sphere Project
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use sha2::{Digest, Sha256};

use super::defaults::{
    default_role_prompts, DEFAULT_MODEL, DEFAULT_ROLE, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_MS,
};
use super::error::ConfigError;
use super::interpolation::resolve_variables;
use super::raw;
use super::types::*;

/// Where the sphere YAML comes from.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// A file on disk, normally `sphere.yaml`.
    File(PathBuf),
    /// YAML text already in memory.
    Inline(String),
}

impl ConfigSource {
    fn read(&self) -> Result<String, ConfigError> {
        match self {
            ConfigSource::File(path) => {
                std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })
            }
            ConfigSource::Inline(yaml) => Ok(yaml.clone()),
        }
    }
}

/// Load and validate a sphere config from the given source.
///
/// Steps:
/// 1. Read raw YAML from source
/// 2. Compute the SHA256 fingerprint
/// 3. Parse YAML into raw deserialization types
/// 4. Validate version and values
/// 5. Resolve `${VAR}` references in `base_url` and `api_key`
/// 6. Fill defaults and build the typed Config
pub fn load_config(source: &ConfigSource) -> Result<Config, ConfigError> {
    let raw_yaml = source.read()?;
    let config_hash = compute_hash(&raw_yaml);

    let raw: raw::RawConfig = serde_yaml::from_str(&raw_yaml)?;

    if raw.sphere != "v1" {
        return Err(ConfigError::Invalid(format!(
            "unsupported config version \"{}\", expected \"v1\"",
            raw.sphere
        )));
    }

    let server = build_server_config(raw.server)?;
    let upstream = build_upstream_config(raw.upstream)?;
    let roles = build_role_config(raw.roles)?;

    Ok(Config {
        version: raw.sphere,
        server,
        upstream,
        roles,
        config_hash,
    })
}

/// Deterministic fingerprint of the raw config text.
pub fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("sha256:{:x}", hasher.finalize())
}

fn build_server_config(raw: Option<raw::RawServerConfig>) -> Result<ServerConfig, ConfigError> {
    let defaults = ServerConfig::default();
    let Some(raw) = raw else {
        return Ok(defaults);
    };

    let channel_capacity = raw.channel_capacity.unwrap_or(defaults.channel_capacity);
    if channel_capacity == 0 {
        return Err(ConfigError::Invalid(
            "server.channel_capacity must be > 0".into(),
        ));
    }

    Ok(ServerConfig {
        port: raw.port.unwrap_or(defaults.port),
        channel_capacity,
    })
}

fn build_upstream_config(raw: raw::RawUpstreamConfig) -> Result<UpstreamConfig, ConfigError> {
    let base_url = resolve_variables(raw.base_url.trim())?;
    if base_url.is_empty() {
        return Err(ConfigError::Invalid(
            "upstream.base_url must not be empty".into(),
        ));
    }
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::Invalid(format!(
            "upstream.base_url must be an http(s) URL, got \"{base_url}\""
        )));
    }

    let api_key = raw
        .api_key
        .map(|key| resolve_variables(&key))
        .transpose()?
        .filter(|key| !key.is_empty());

    let temperature = raw.temperature.unwrap_or(DEFAULT_TEMPERATURE);
    if !(0.0..=2.0).contains(&temperature) {
        return Err(ConfigError::Invalid(format!(
            "upstream.temperature must be in [0.0, 2.0], got {temperature}"
        )));
    }

    let timeout_ms = raw.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
    if timeout_ms == 0 {
        return Err(ConfigError::Invalid(
            "upstream.timeout_ms must be > 0".into(),
        ));
    }

    Ok(UpstreamConfig {
        base_url: base_url.trim_end_matches('/').to_string(),
        api_key,
        model: raw.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        temperature,
        timeout_ms,
    })
}

fn build_role_config(raw: Option<raw::RawRoleConfig>) -> Result<RoleConfig, ConfigError> {
    // Core prompts first, user prompts override per role.
    let mut prompts = default_role_prompts();
    let mut default = DEFAULT_ROLE.to_string();

    if let Some(raw) = raw {
        for (role, prompt) in raw.prompts {
            if prompt.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "roles.prompts.{role} must not be empty"
                )));
            }
            prompts.insert(role, prompt);
        }
        if let Some(role) = raw.default {
            default = role;
        }
    }

    if !prompts.contains_key(&default) {
        return Err(ConfigError::Invalid(format!(
            "roles.default \"{default}\" has no prompt"
        )));
    }

    Ok(RoleConfig { default, prompts })
}
