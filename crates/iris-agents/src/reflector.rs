// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
use iris_config::{AgentConfig, ContextProfile};
use iris_model::{thinking::split_thinking, ChatMessage, ContentPart, GenOptions, LlmClient};
use tracing::debug;

use crate::prompts::REFLECTOR_SYSTEM;
use crate::trajectory::{flush_images, flush_rounds};

/// One advisory trajectory critique.
#[derive(Debug, Clone)]
pub struct Reflection {
    pub text: String,
    pub thoughts: Option<String>,
}

/// Critiques the recent trajectory each step: on plan, off plan / cycling,
/// or task complete.  Advisory only — its text is injected into the next
/// Worker prompt and never terminates the loop by itself.
pub struct Reflector {
    client: LlmClient,
    opts: GenOptions,
    messages: Vec<ChatMessage>,
    turn: usize,
    max_trajectory_length: usize,
    max_images: usize,
    context_profile: ContextProfile,
    use_thinking: bool,
}

impl Reflector {
    pub fn new(client: LlmClient, cfg: &AgentConfig, context_profile: ContextProfile) -> Self {
        let use_thinking = client.supports_thinking();
        Self {
            client,
            opts: GenOptions::with_temperature(0.0),
            messages: Vec::new(),
            turn: 0,
            max_trajectory_length: cfg.max_trajectory_length,
            max_images: cfg.max_images,
            context_profile,
            use_thinking,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Observe one step.  On turn 0 this registers the task and the initial
    /// screenshot and returns no critique; afterwards it critiques the
    /// latest plan against the latest screenshot.
    pub async fn reflect(
        &mut self,
        instruction: &str,
        plan_text: &str,
        screenshot_url: &str,
    ) -> Option<Reflection> {
        if self.turn == 0 {
            self.messages
                .push(ChatMessage::system(REFLECTOR_SYSTEM.replace("{task}", instruction)));
            self.messages.push(ChatMessage::user_with_parts(vec![
                ContentPart::text("Initial screenshot, before any action:"),
                ContentPart::image(screenshot_url.to_string()),
            ]));
            self.turn = 1;
            return None;
        }

        self.messages.push(ChatMessage::user_with_parts(vec![
            ContentPart::text(format!("Latest plan:\n{plan_text}\n\nScreen after it ran:")),
            ContentPart::image(screenshot_url.to_string()),
        ]));

        let raw = if self.use_thinking {
            self.client.generate_with_thinking(&self.messages, &self.opts).await
        } else {
            self.client.generate(&self.messages, &self.opts).await
        };
        let (thoughts, text) = split_thinking(&raw);

        if text.trim().is_empty() {
            // Transport retries exhausted; skip the critique this step.
            debug!(turn = self.turn, "empty reflection; skipping");
            self.messages.pop();
            return None;
        }

        self.messages.push(ChatMessage::assistant(text.clone()));
        self.turn += 1;
        match self.context_profile {
            ContextProfile::Long => flush_images(&mut self.messages, self.max_images),
            ContextProfile::Short => {
                flush_rounds(&mut self.messages, self.max_trajectory_length + 1)
            }
        }
        Some(Reflection { text, thoughts })
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use iris_model::ScriptedProvider;
    use std::sync::Arc;

    const SHOT: &str = "data:image/png;base64,AA==";

    fn reflector(scripts: Vec<Result<String, String>>) -> Reflector {
        let client = LlmClient::new(Arc::new(ScriptedProvider::new(scripts)));
        Reflector::new(client, &AgentConfig::default(), ContextProfile::Long)
    }

    #[tokio::test(start_paused = true)]
    async fn turn_zero_registers_task_and_returns_no_critique() {
        let mut r = reflector(vec![Ok("never used".into())]);
        let out = r.reflect("Rename the file", "", SHOT).await;
        assert!(out.is_none());
        assert_eq!(r.messages().len(), 2);
        assert!(r.messages()[0].text().contains("Rename the file"));
        assert_eq!(r.messages()[1].image_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn later_turns_return_the_verdict_text() {
        let mut r = reflector(vec![Ok("The trajectory is on track.".into())]);
        r.reflect("task", "", SHOT).await;
        let out = r.reflect("task", "clicked the button", SHOT).await.unwrap();
        assert_eq!(out.text, "The trajectory is on track.");
        assert!(out.thoughts.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn thinking_responses_are_split() {
        let provider = ScriptedProvider::new(vec![Ok(
            "<thoughts>same screen twice</thoughts>\n<answer>The agent is cycling.</answer>"
                .into(),
        )])
        .with_thinking();
        let client = LlmClient::new(Arc::new(provider));
        let mut r = Reflector::new(client, &AgentConfig::default(), ContextProfile::Long);
        r.reflect("task", "", SHOT).await;
        let out = r.reflect("task", "scrolled down", SHOT).await.unwrap();
        assert_eq!(out.text, "The agent is cycling.");
        assert_eq!(out.thoughts.as_deref(), Some("same screen twice"));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_reflection_is_skipped_and_history_unwound() {
        let mut r = reflector(vec![
            Err("down".into()),
            Err("down".into()),
            Err("down".into()),
        ]);
        r.reflect("task", "", SHOT).await;
        let before = r.messages().len();
        let out = r.reflect("task", "plan", SHOT).await;
        assert!(out.is_none());
        assert_eq!(r.messages().len(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn short_context_keeps_reflector_bounded() {
        let scripts = (0..10).map(|_| Ok("on track".to_string())).collect();
        let client = LlmClient::new(Arc::new(ScriptedProvider::new(scripts)));
        let mut cfg = AgentConfig::default();
        cfg.max_trajectory_length = 3;
        let mut r = Reflector::new(client, &cfg, ContextProfile::Short);
        r.reflect("task", "", SHOT).await;
        for _ in 0..9 {
            r.reflect("task", "plan", SHOT).await;
        }
        assert!(r.messages().len() <= 3 + 1);
    }
}
