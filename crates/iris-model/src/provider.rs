// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
use async_trait::async_trait;

use crate::ChatMessage;

/// Sampling options for a single completion.
#[derive(Debug, Clone)]
pub struct GenOptions {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl Default for GenOptions {
    fn default() -> Self {
        Self { temperature: 0.0, max_tokens: None }
    }
}

impl GenOptions {
    pub fn with_temperature(temperature: f32) -> Self {
        Self { temperature, max_tokens: None }
    }
}

/// One vendor adapter.  `complete` returns the assistant's full text; there
/// is no streaming because every consumer here acts on whole responses.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider id for status display (`"openai"`, `"anthropic"`, …).
    fn name(&self) -> &str;

    /// Model identifier as reported to users.
    fn model_name(&self) -> &str;

    /// Whether the provider can separate reasoning from the answer.
    fn supports_thinking(&self) -> bool {
        false
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        opts: &GenOptions,
    ) -> anyhow::Result<String>;

    /// Completion with separated reasoning, formatted as
    /// `<thoughts>…</thoughts>\n<answer>…</answer>`.
    ///
    /// The default falls back to a plain completion: providers without the
    /// capability return the whole response as the answer.
    async fn complete_with_thinking(
        &self,
        messages: &[ChatMessage],
        opts: &GenOptions,
    ) -> anyhow::Result<String> {
        self.complete(messages, opts).await
    }
}
