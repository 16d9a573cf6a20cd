// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::{ChatMessage, ChatProvider, GenOptions};

/// Retry policy: attempts per generate call.
const ATTEMPTS: usize = 3;
/// Sleep between attempts.
const BACKOFF: Duration = Duration::from_secs(1);

/// A provider wrapped with the bounded retry policy.
///
/// Transport and parse errors are swallowed with a warning; after the last
/// attempt an empty string is returned.  The empty string is a deliberate
/// in-band signal: the worker's format loop treats it as a failed attempt
/// and produces its own feedback, so errors never propagate past this seam.
#[derive(Clone)]
pub struct LlmClient {
    provider: Arc<dyn ChatProvider>,
}

impl LlmClient {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<dyn ChatProvider> {
        &self.provider
    }

    pub fn supports_thinking(&self) -> bool {
        self.provider.supports_thinking()
    }

    pub async fn generate(&self, messages: &[ChatMessage], opts: &GenOptions) -> String {
        self.run(messages, opts, false).await
    }

    /// Like [`generate`] but requesting the provider's separated-reasoning
    /// mode.  Providers without it return a plain answer.
    ///
    /// [`generate`]: LlmClient::generate
    pub async fn generate_with_thinking(
        &self,
        messages: &[ChatMessage],
        opts: &GenOptions,
    ) -> String {
        self.run(messages, opts, true).await
    }

    async fn run(&self, messages: &[ChatMessage], opts: &GenOptions, thinking: bool) -> String {
        for attempt in 1..=ATTEMPTS {
            let result = if thinking {
                self.provider.complete_with_thinking(messages, opts).await
            } else {
                self.provider.complete(messages, opts).await
            };
            match result {
                Ok(text) => return text,
                Err(e) => {
                    warn!(
                        provider = self.provider.name(),
                        attempt,
                        error = %e,
                        "model call failed",
                    );
                    if attempt < ATTEMPTS {
                        tokio::time::sleep(BACKOFF).await;
                    }
                }
            }
        }
        String::new()
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptedProvider;

    #[tokio::test(start_paused = true)]
    async fn first_success_is_returned_verbatim() {
        let p = ScriptedProvider::new(vec![Ok("reply one".into())]);
        let client = LlmClient::new(Arc::new(p));
        let out = client.generate(&[ChatMessage::user("hi")], &GenOptions::default()).await;
        assert_eq!(out, "reply one");
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_second_attempt_returns_that_output() {
        let p = ScriptedProvider::new(vec![
            Err("connection reset".into()),
            Ok("second time lucky".into()),
        ]);
        let calls = p.call_count();
        let client = LlmClient::new(Arc::new(p));
        let out = client.generate(&[ChatMessage::user("hi")], &GenOptions::default()).await;
        assert_eq!(out, "second time lucky");
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_returns_empty_string_after_three_attempts() {
        let p = ScriptedProvider::new(vec![
            Err("boom".into()),
            Err("boom".into()),
            Err("boom".into()),
            Ok("never reached".into()),
        ]);
        let calls = p.call_count();
        let client = LlmClient::new(Arc::new(p));
        let out = client.generate(&[ChatMessage::user("hi")], &GenOptions::default()).await;
        assert_eq!(out, "");
        assert_eq!(*calls.lock().unwrap(), 3);
    }
}
