// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Configuration schema and layered loader for iris.

mod loader;
mod schema;

pub use loader::load;
pub use schema::{
    AgentConfig, Config, ContextProfile, GroundingConfig, ModelConfig, Platform,
};
