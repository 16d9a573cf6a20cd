// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Clients for the auxiliary grounding-model server.
//!
//! The server exposes an OpenAI-compatible `POST /v1/chat/completions` (used
//! by [`LocalProvider`]) plus a simpler `POST /grounding/generate` and
//! `GET /health` (used by [`GroundingServerClient`]).  Serving the model is
//! an external collaborator; only the client side lives here.

use anyhow::{bail, Context};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::openai::{build_openai_messages, extract_choice_text};
use crate::{ChatMessage, ChatProvider, GenOptions};

/// OpenAI-compatible provider for a local endpoint.  No authentication.
pub struct LocalProvider {
    model: String,
    base_url: String,
    max_tokens: Option<u32>,
    client: reqwest::Client,
}

impl LocalProvider {
    pub fn new(model: String, base_url: String, max_tokens: Option<u32>) -> Self {
        Self { model, base_url, max_tokens, client: reqwest::Client::new() }
    }
}

#[async_trait]
impl ChatProvider for LocalProvider {
    fn name(&self) -> &str {
        "local"
    }
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        opts: &GenOptions,
    ) -> anyhow::Result<String> {
        let mut body = json!({
            "model": self.model,
            "messages": build_openai_messages(messages),
            "temperature": opts.temperature,
        });
        if let Some(mt) = opts.max_tokens.or(self.max_tokens) {
            body["max_tokens"] = json!(mt);
        }

        debug!(url = %self.base_url, "sending local completion request");

        let resp = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&body)
            .send()
            .await
            .context("grounding server request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("grounding server error {status}: {text}");
        }

        let v: Value = resp.json().await.context("grounding server response was not JSON")?;
        extract_choice_text(&v)
    }
}

// ─── Direct grounding endpoint ────────────────────────────────────────────────

/// Reply from `POST /grounding/generate`.
#[derive(Debug, Clone, Deserialize)]
pub struct GroundingReply {
    pub response: String,
    /// `[x, y]` in the server's grounding canvas, when the model produced one.
    #[serde(default)]
    pub coordinates: Option<[i32; 2]>,
}

/// Thin client for the server's dedicated grounding route.
pub struct GroundingServerClient {
    base_url: String,
    client: reqwest::Client,
}

impl GroundingServerClient {
    pub fn new(base_url: String) -> Self {
        Self { base_url, client: reqwest::Client::new() }
    }

    /// `POST /grounding/generate` with `{prompt, image}` (image is raw base64).
    pub async fn generate(&self, prompt: &str, image_b64: &str) -> anyhow::Result<GroundingReply> {
        let resp = self
            .client
            .post(format!("{}/grounding/generate", self.base_url))
            .json(&json!({ "prompt": prompt, "image": image_b64 }))
            .send()
            .await
            .context("grounding generate request failed")?;
        if !resp.status().is_success() {
            bail!("grounding generate error {}", resp.status());
        }
        resp.json().await.context("grounding generate reply was not JSON")
    }

    /// `GET /health` — true when the server answers 200.
    pub async fn health(&self) -> bool {
        match self.client.get(format!("{}/health", self.base_url)).send().await {
            Ok(r) => r.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grounding_reply_parses_coordinates() {
        let r: GroundingReply =
            serde_json::from_str(r#"{"response": "(500, 500)", "coordinates": [500, 500]}"#)
                .unwrap();
        assert_eq!(r.coordinates, Some([500, 500]));
    }

    #[test]
    fn grounding_reply_coordinates_optional() {
        let r: GroundingReply = serde_json::from_str(r#"{"response": "not found"}"#).unwrap();
        assert!(r.coordinates.is_none());
    }
}
