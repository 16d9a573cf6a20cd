// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Multi-turn chat client abstraction over vendor LLM APIs.
//!
//! Messages use one normalized internal form (text + image parts); one
//! adapter per vendor translates to the wire shape.  The [`LlmClient`]
//! wrapper adds the bounded retry policy: transport and parse errors are
//! swallowed and an empty string is returned after exhaustion — a valid
//! signal that upstream format checking treats as a failed attempt.

pub mod registry;
pub mod thinking;

mod anthropic;
mod client;
mod local;
mod mock;
mod openai;
mod provider;
mod types;

pub use anthropic::AnthropicProvider;
pub use client::LlmClient;
pub use local::{GroundingReply, GroundingServerClient, LocalProvider};
pub use mock::{EchoProvider, ScriptedProvider};
pub use openai::OpenAiProvider;
pub use provider::{ChatProvider, GenOptions};
pub use registry::{get_driver, DriverMeta, DRIVERS};
pub use types::{parse_data_url_parts, ChatMessage, ContentPart, Role};

use anyhow::{bail, Context};
use iris_config::ModelConfig;
use std::sync::Arc;

/// Construct a provider from configuration.
///
/// The API key is taken from `cfg.api_key`, then from `cfg.api_key_env`, then
/// from the driver's default environment variable.  A driver that requires a
/// key but has none is a fatal configuration error.
pub fn from_config(cfg: &ModelConfig) -> anyhow::Result<Arc<dyn ChatProvider>> {
    let driver = get_driver(&cfg.provider)
        .with_context(|| format!("unknown model provider `{}`", cfg.provider))?;

    let key = resolve_api_key(cfg, driver.default_api_key_env);
    if driver.requires_api_key && key.is_none() {
        let env = cfg
            .api_key_env
            .as_deref()
            .or(driver.default_api_key_env)
            .unwrap_or("<api_key>");
        bail!("provider `{}` requires an API key; set {env}", cfg.provider);
    }

    Ok(match driver.id {
        "openai" => Arc::new(OpenAiProvider::new(
            cfg.name.clone(),
            key,
            cfg.base_url.clone(),
            cfg.max_tokens,
        )),
        "anthropic" => Arc::new(AnthropicProvider::new(
            cfg.name.clone(),
            key,
            cfg.base_url.clone(),
            cfg.max_tokens,
            cfg.thinking,
        )),
        "local" => Arc::new(LocalProvider::new(
            cfg.name.clone(),
            cfg.base_url
                .clone()
                .unwrap_or_else(|| "http://127.0.0.1:8003".into()),
            cfg.max_tokens,
        )),
        "mock" => Arc::new(EchoProvider::default()),
        _ => unreachable!("registry is closed"),
    })
}

fn resolve_api_key(cfg: &ModelConfig, default_env: Option<&str>) -> Option<String> {
    if let Some(k) = &cfg.api_key {
        return Some(k.clone());
    }
    let env = cfg.api_key_env.as_deref().or(default_env)?;
    std::env::var(env).ok().filter(|v| !v.is_empty())
}
