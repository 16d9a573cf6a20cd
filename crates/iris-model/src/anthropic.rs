// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
use anyhow::{bail, Context};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::{
    parse_data_url_parts, thinking::format_thinking, ChatMessage, ChatProvider, ContentPart,
    GenOptions, Role,
};

/// Reasoning-token budget requested when thinking mode is on.
const THINKING_BUDGET_TOKENS: u32 = 2048;

pub struct AnthropicProvider {
    model: String,
    api_key: Option<String>,
    base_url: String,
    max_tokens: Option<u32>,
    /// Request extended thinking and return the combined
    /// `<thoughts>…</thoughts>\n<answer>…</answer>` form.
    thinking: bool,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(
        model: String,
        api_key: Option<String>,
        base_url: Option<String>,
        max_tokens: Option<u32>,
        thinking: bool,
    ) -> Self {
        Self {
            model,
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.anthropic.com".into()),
            max_tokens,
            thinking,
            client: reqwest::Client::new(),
        }
    }

    async fn request(
        &self,
        messages: &[ChatMessage],
        opts: &GenOptions,
        with_thinking: bool,
    ) -> anyhow::Result<Value> {
        let key = self.api_key.as_deref().context("ANTHROPIC_API_KEY not set")?;

        let (system_text, wire_messages) = build_anthropic_messages(messages);
        let max_tokens = opts.max_tokens.or(self.max_tokens).unwrap_or(4096);

        let mut body = json!({
            "model": self.model,
            "messages": wire_messages,
            "max_tokens": max_tokens,
        });
        if !system_text.is_empty() {
            body["system"] = json!(system_text);
        }
        if with_thinking {
            // Thinking requires temperature 1 and a budget below max_tokens.
            body["thinking"] = json!({
                "type": "enabled",
                "budget_tokens": THINKING_BUDGET_TOKENS.min(max_tokens.saturating_sub(1)),
            });
        } else {
            body["temperature"] = json!(opts.temperature);
        }

        debug!(model = %self.model, thinking = with_thinking, "sending anthropic request");

        let resp = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .context("Anthropic request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("Anthropic error {status}: {text}");
        }

        resp.json().await.context("Anthropic response was not JSON")
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }
    fn model_name(&self) -> &str {
        &self.model
    }
    fn supports_thinking(&self) -> bool {
        self.thinking
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        opts: &GenOptions,
    ) -> anyhow::Result<String> {
        let v = self.request(messages, opts, false).await?;
        let (_, answer) = split_content_blocks(&v)?;
        Ok(answer)
    }

    async fn complete_with_thinking(
        &self,
        messages: &[ChatMessage],
        opts: &GenOptions,
    ) -> anyhow::Result<String> {
        if !self.thinking {
            return self.complete(messages, opts).await;
        }
        let v = self.request(messages, opts, true).await?;
        let (thoughts, answer) = split_content_blocks(&v)?;
        Ok(format_thinking(&thoughts, &answer))
    }
}

/// Collect `(thinking_text, answer_text)` from a messages-API response.
fn split_content_blocks(v: &Value) -> anyhow::Result<(String, String)> {
    let blocks = v["content"]
        .as_array()
        .with_context(|| format!("no content array in response: {v}"))?;
    let mut thoughts = String::new();
    let mut answer = String::new();
    for b in blocks {
        match b["type"].as_str().unwrap_or("") {
            "text" => answer.push_str(b["text"].as_str().unwrap_or("")),
            "thinking" => thoughts.push_str(b["thinking"].as_str().unwrap_or("")),
            _ => {}
        }
    }
    Ok((thoughts, answer))
}

/// Convert normalized messages to the Anthropic wire format.
///
/// The system message is separated out because Anthropic takes it as a
/// top-level `system` field, not a conversation turn.  Images become
/// `{type: base64, media_type, data}` source blocks.
pub(crate) fn build_anthropic_messages(messages: &[ChatMessage]) -> (String, Vec<Value>) {
    let mut system_text = String::new();
    let mut out: Vec<Value> = Vec::new();

    for m in messages {
        if m.role == Role::System {
            system_text = m.text();
            continue;
        }
        let role = match m.role {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => unreachable!(),
        };
        if m.image_count() == 0 {
            out.push(json!({ "role": role, "content": m.text() }));
            continue;
        }
        let content: Vec<Value> = m
            .parts
            .iter()
            .map(|p| match p {
                ContentPart::Text { text } => json!({ "type": "text", "text": text }),
                ContentPart::Image { image_url, .. } => {
                    if let Ok((mime, data)) = parse_data_url_parts(image_url) {
                        json!({
                            "type": "image",
                            "source": { "type": "base64", "media_type": mime, "data": data }
                        })
                    } else {
                        json!({
                            "type": "image",
                            "source": { "type": "url", "url": image_url }
                        })
                    }
                }
            })
            .collect();
        out.push(json!({ "role": role, "content": content }));
    }
    (system_text, out)
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_reports_thinking_capability() {
        let p = AnthropicProvider::new("claude-sonnet-4-5".into(), None, None, None, true);
        assert!(p.supports_thinking());
        let p = AnthropicProvider::new("claude-sonnet-4-5".into(), None, None, None, false);
        assert!(!p.supports_thinking());
    }

    #[test]
    fn system_message_extracted_to_system_text() {
        let (sys, msgs) =
            build_anthropic_messages(&[ChatMessage::system("be precise"), ChatMessage::user("hi")]);
        assert_eq!(sys, "be precise");
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0]["role"], "user");
    }

    #[test]
    fn image_data_url_becomes_base64_source_block() {
        let m = ChatMessage::user_with_parts(vec![
            ContentPart::text("screenshot"),
            ContentPart::image("data:image/png;base64,iVBORw0KGgo="),
        ]);
        let (_, msgs) = build_anthropic_messages(&[m]);
        let img = &msgs[0]["content"][1];
        assert_eq!(img["type"], "image");
        assert_eq!(img["source"]["type"], "base64");
        assert_eq!(img["source"]["media_type"], "image/png");
        assert_eq!(img["source"]["data"], "iVBORw0KGgo=");
    }

    #[test]
    fn split_content_blocks_separates_thinking_from_text() {
        let v = json!({
            "content": [
                { "type": "thinking", "thinking": "the field is empty" },
                { "type": "text", "text": "agent.type(None, \"x\")" },
            ]
        });
        let (thoughts, answer) = split_content_blocks(&v).unwrap();
        assert_eq!(thoughts, "the field is empty");
        assert_eq!(answer, "agent.type(None, \"x\")");
    }

    #[test]
    fn split_content_blocks_errors_without_content() {
        assert!(split_content_blocks(&json!({ "type": "error" })).is_err());
    }
}
