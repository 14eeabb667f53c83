// Copyright 2026 The Sphere Project
// SPDX-License-Identifier: Apache-2.0

//! Role selection for a generation request.

/// Roles with built-in prompts. Order matters for [`role_from_decision`].
pub const CORE_ROLES: &[&str] = &["CEO", "CTO", "CFO", "CMO", "system"];

pub fn is_core_role(role: &str) -> bool {
    CORE_ROLES.contains(&role)
}

/// Role for an explicitly targeted request.
///
/// A core role is used as-is. Anything else falls back to `default`;
/// custom agents are not resolved here.
pub fn select_role(target_role: &str, default: &str) -> String {
    if is_core_role(target_role) {
        target_role.to_string()
    } else {
        tracing::warn!(target_role, fallback = default, "unknown target role");
        default.to_string()
    }
}

/// Maps free-form classifier output to a role: the first core role whose
/// uppercase name occurs in the uppercased text, else `default`.
pub fn role_from_decision(text: &str, default: &str) -> String {
    let decision = text.trim().to_uppercase();
    CORE_ROLES
        .iter()
        .find(|role| decision.contains(&role.to_uppercase()))
        .map(|role| role.to_string())
        .unwrap_or_else(|| default.to_string())
}
