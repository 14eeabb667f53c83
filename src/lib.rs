// Copyright 2026 The Sphere Project
// SPDX-License-Identifier: Apache-2.0

pub mod artifact;
pub mod config;
pub mod event;
pub mod openai;
pub mod routing;
pub mod server;
pub mod stream;
pub mod upstream;
