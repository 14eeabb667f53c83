// Copyright 2026 The Sphere Project
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_ROLE: &str = "CEO";

/// Built-in system instructions for the core roles.
/// User-supplied prompts in `roles.prompts` replace these per role.
const CORE_PROMPTS: &[(&str, &str)] = &[
    (
        "CEO",
        "Act as the CEO of a technology startup. Your focus is the overall vision and strategy.",
    ),
    (
        "CTO",
        "Act as the CTO of a technology startup. Your focus is architecture, code and technical efficiency.",
    ),
    (
        "CFO",
        "Act as the CFO of a technology startup. Your focus is finance, runway and profitability.",
    ),
    (
        "CMO",
        "Act as the CMO of a technology startup. Your focus is marketing, growth and user acquisition.",
    ),
    (
        "system",
        "Act as the general assistant of Sphere. Help with whatever is needed, combining technical and business views.",
    ),
];

pub fn default_role_prompts() -> HashMap<String, String> {
    CORE_PROMPTS
        .iter()
        .map(|(role, prompt)| (role.to_string(), prompt.to_string()))
        .collect()
}
