// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
use anyhow::{bail, Context};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::{ChatMessage, ChatProvider, ContentPart, GenOptions, Role};

pub struct OpenAiProvider {
    model: String,
    api_key: Option<String>,
    base_url: String,
    max_tokens: Option<u32>,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(
        model: String,
        api_key: Option<String>,
        base_url: Option<String>,
        max_tokens: Option<u32>,
    ) -> Self {
        Self {
            model,
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".into()),
            max_tokens,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        opts: &GenOptions,
    ) -> anyhow::Result<String> {
        let key = self.api_key.as_deref().context("OPENAI_API_KEY not set")?;

        let mut body = json!({
            "model": self.model,
            "messages": build_openai_messages(messages),
            "temperature": opts.temperature,
        });
        if let Some(mt) = opts.max_tokens.or(self.max_tokens) {
            body["max_tokens"] = json!(mt);
        }

        debug!(model = %self.model, messages = messages.len(), "sending openai request");

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .context("OpenAI request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("OpenAI error {status}: {text}");
        }

        let v: Value = resp.json().await.context("OpenAI response was not JSON")?;
        extract_choice_text(&v)
    }
}

/// Pull `choices[0].message.content` out of a chat-completions response.
pub(crate) fn extract_choice_text(v: &Value) -> anyhow::Result<String> {
    v["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .with_context(|| format!("no message content in response: {v}"))
}

/// Convert normalized messages into the chat-completions wire shape.
///
/// Images become `{type: "image_url", image_url: {url: <data-url>, detail?}}`
/// parts; messages that are pure text collapse to a plain string content for
/// compatibility with strict servers.
pub(crate) fn build_openai_messages(messages: &[ChatMessage]) -> Vec<Value> {
    messages
        .iter()
        .map(|m| {
            let role = match m.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            if m.image_count() == 0 {
                return json!({ "role": role, "content": m.text() });
            }
            let content: Vec<Value> = m
                .parts
                .iter()
                .map(|p| match p {
                    ContentPart::Text { text } => json!({ "type": "text", "text": text }),
                    ContentPart::Image { image_url, detail } => {
                        let mut img = json!({ "url": image_url });
                        if let Some(d) = detail {
                            img["detail"] = json!(d);
                        }
                        json!({ "type": "image_url", "image_url": img })
                    }
                })
                .collect();
            json!({ "role": role, "content": content })
        })
        .collect()
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
