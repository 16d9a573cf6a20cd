// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
use iris_actions::{extract_calls, parse_call, parse_code_block, AgentAction};
use iris_config::{AgentConfig, ContextProfile};
use iris_model::{thinking::split_thinking, ChatMessage, ContentPart, GenOptions, LlmClient};
use tracing::{debug, warn};

use crate::checkers::{FormatChecker, ParsesChecker, SingleCallChecker};
use crate::prompts::{format_feedback, WORKER_SYSTEM};
use crate::trajectory::{flush_images, flush_rounds};

/// Format-retry attempts per step.
const FORMAT_ATTEMPTS: usize = 3;

/// Wait injected when all format attempts fail, so the loop keeps moving.
pub const DEGRADED_WAIT_SECS: f64 = 1.333;

/// Per-step inputs assembled by the orchestrator.
pub struct WorkerInput<'a> {
    pub instruction: &'a str,
    /// Data URL of the current screenshot.
    pub screenshot_url: String,
    /// Latest Reflector verdict, if any.
    pub reflection: Option<&'a str>,
    /// Current knowledge buffer.
    pub knowledge: &'a [String],
    /// Rendered report of the previous code-agent delegation, if any.
    pub code_report: Option<String>,
}

/// The Worker's output for one step.
#[derive(Debug, Clone)]
pub struct PlanStep {
    /// Full answer text (thoughts stripped).
    pub raw_text: String,
    /// Separated reasoning, when the provider produced it.
    pub thoughts: Option<String>,
    /// The single extracted `agent.<verb>(…)` call.
    pub plan_code: String,
    pub action: AgentAction,
    /// True when format retries were exhausted and the step degraded to a
    /// short wait.
    pub degraded: bool,
}

/// Generates the next plan from screenshot + history, enforcing the response
/// format with bounded feedback retries.
pub struct Worker {
    client: LlmClient,
    opts: GenOptions,
    messages: Vec<ChatMessage>,
    turn: usize,
    max_trajectory_length: usize,
    max_images: usize,
    context_profile: ContextProfile,
    checkers: Vec<Box<dyn FormatChecker>>,
    use_thinking: bool,
}

impl Worker {
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
            checkers: vec![Box::new(SingleCallChecker), Box::new(ParsesChecker)],
            use_thinking,
        }
    }

    pub fn turn(&self) -> usize {
        self.turn
    }

    /// The conversation as currently retained (post-flush).
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Produce the next plan for the bound screenshot.
    pub async fn predict(&mut self, input: WorkerInput<'_>) -> PlanStep {
        if self.turn == 0 {
            self.messages
                .push(ChatMessage::system(WORKER_SYSTEM.replace("{task}", input.instruction)));
        }
        let user_turn = self.build_user_message(&input);
        self.messages.push(user_turn);

        let mut last_answer = String::new();
        let mut last_thoughts = None;

        for attempt in 1..=FORMAT_ATTEMPTS {
            let raw = if self.use_thinking {
                self.client.generate_with_thinking(&self.messages, &self.opts).await
            } else {
                self.client.generate(&self.messages, &self.opts).await
            };
            let (thoughts, answer) = split_thinking(&raw);

            match self.run_checkers(&answer) {
                Ok(()) => {
                    // The checkers guarantee this chain succeeds.
                    let code = parse_code_block(&answer).unwrap_or_default();
                    let call = extract_calls(&code).into_iter().next().unwrap_or_default();
                    match parse_call(&call) {
                        Ok(action) => {
                            debug!(turn = self.turn, verb = action.verb(), "plan accepted");
                            self.messages.push(ChatMessage::assistant(answer.clone()));
                            self.finish_turn();
                            return PlanStep {
                                raw_text: answer,
                                thoughts,
                                plan_code: call,
                                action,
                                degraded: false,
                            };
                        }
                        Err(e) => {
                            self.push_retry(&answer, &e.feedback(), attempt);
                        }
                    }
                }
                Err(feedback) => {
                    self.push_retry(&answer, &feedback, attempt);
                }
            }
            last_answer = answer;
            last_thoughts = thoughts;
        }

        // All attempts failed: degrade to a short wait so the loop continues
        // and the next screenshot gives the model a fresh chance.
        warn!(turn = self.turn, "format retries exhausted; degrading to wait");
        let plan_code = format!("agent.wait({DEGRADED_WAIT_SECS})");
        self.messages.push(ChatMessage::assistant(format!(
            "Falling back to a short wait.\n```python\n{plan_code}\n```"
        )));
        self.finish_turn();
        PlanStep {
            raw_text: last_answer,
            thoughts: last_thoughts,
            plan_code,
            action: AgentAction::Wait { seconds: DEGRADED_WAIT_SECS },
            degraded: true,
        }
    }

    fn build_user_message(&self, input: &WorkerInput<'_>) -> ChatMessage {
        let mut text = String::new();
        if let Some(r) = input.reflection {
            text.push_str("Trajectory critique:\n");
            text.push_str(r);
            text.push_str("\n\n");
        }
        if !input.knowledge.is_empty() {
            text.push_str("Saved notes:\n");
            for note in input.knowledge {
                text.push_str("- ");
                text.push_str(note);
                text.push('\n');
            }
            text.push('\n');
        }
        if let Some(report) = &input.code_report {
            text.push_str(report);
            text.push_str("\n\n");
        }
        text.push_str("Current screenshot:");
        ChatMessage::user_with_parts(vec![
            ContentPart::text(text),
            ContentPart::image(input.screenshot_url.clone()),
        ])
    }

    fn run_checkers(&self, answer: &str) -> Result<(), String> {
        for checker in &self.checkers {
            checker.check(answer)?;
        }
        Ok(())
    }

    fn push_retry(&mut self, answer: &str, feedback: &str, attempt: usize) {
        debug!(attempt, feedback, "plan rejected");
        self.messages.push(ChatMessage::assistant(answer.to_string()));
        self.messages.push(ChatMessage::user(format_feedback(feedback)));
    }

    fn finish_turn(&mut self) {
        self.turn += 1;
        match self.context_profile {
            ContextProfile::Long => flush_images(&mut self.messages, self.max_images),
            ContextProfile::Short => {
                flush_rounds(&mut self.messages, 2 * self.max_trajectory_length + 1)
            }
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trajectory::image_count;
    use iris_model::ScriptedProvider;
    use std::sync::Arc;

    fn cfg() -> AgentConfig {
        AgentConfig::default()
    }

    fn worker_with(scripts: Vec<Result<String, String>>) -> Worker {
        let client = LlmClient::new(Arc::new(ScriptedProvider::new(scripts)));
        Worker::new(client, &cfg(), ContextProfile::Long)
    }

    fn input(instruction: &'static str) -> WorkerInput<'static> {
        WorkerInput {
            instruction,
            screenshot_url: "data:image/png;base64,AA==".into(),
            reflection: None,
            knowledge: &[],
            code_report: None,
        }
    }

    const GOOD: &str = "Clicking the button.\n```python\nagent.click(\"the button\")\n```";

    #[tokio::test(start_paused = true)]
    async fn first_attempt_success_returns_the_action() {
        let mut w = worker_with(vec![Ok(GOOD.into())]);
        let step = w.predict(input("Click the button")).await;
        assert!(!step.degraded);
        assert_eq!(step.plan_code, "agent.click(\"the button\")");
        assert!(matches!(step.action, AgentAction::Click { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn task_is_spliced_into_system_prompt_on_turn_zero() {
        let provider = ScriptedProvider::new(vec![Ok(GOOD.into())]);
        let last = provider.last_request.clone();
        let client = LlmClient::new(Arc::new(provider));
        let mut w = Worker::new(client, &cfg(), ContextProfile::Long);
        w.predict(input("Open the settings pane")).await;
        let sent = last.lock().unwrap().clone().unwrap();
        assert_eq!(sent[0].role, iris_model::Role::System);
        assert!(sent[0].text().contains("Open the settings pane"));
        assert!(!sent[0].text().contains("{task}"));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_succeeds_on_second_attempt() {
        let mut w = worker_with(vec![
            Ok("no code block here".into()),
            Ok("Recovering.\n```python\nagent.wait(1.0)\n```".into()),
        ]);
        let step = w.predict(input("wait")).await;
        assert!(!step.degraded);
        assert_eq!(step.action, AgentAction::Wait { seconds: 1.0 });
        // One failed assistant turn + feedback user turn stays in history.
        let feedback_turns = w
            .messages()
            .iter()
            .filter(|m| m.text().contains("rejected"))
            .count();
        assert_eq!(feedback_turns, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn three_failures_degrade_to_wait() {
        let mut w = worker_with(vec![
            Ok("bad 1".into()),
            Ok("bad 2".into()),
            Ok("bad 3".into()),
            Ok(GOOD.into()), // never reached
        ]);
        let step = w.predict(input("anything")).await;
        assert!(step.degraded);
        assert_eq!(step.action, AgentAction::Wait { seconds: DEGRADED_WAIT_SECS });
        assert_eq!(step.plan_code, "agent.wait(1.333)");
    }

    #[tokio::test(start_paused = true)]
    async fn empty_response_is_a_format_failure() {
        let mut w = worker_with(vec![
            Ok(String::new()),
            Ok(GOOD.into()),
        ]);
        let step = w.predict(input("click")).await;
        assert!(!step.degraded);
        assert!(matches!(step.action, AgentAction::Click { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_verb_feedback_reaches_the_retry_turn() {
        let mut w = worker_with(vec![
            Ok("```python\nagent.jump(\"high\")\n```".into()),
            Ok(GOOD.into()),
        ]);
        w.predict(input("click")).await;
        let retry_turn = w
            .messages()
            .iter()
            .find(|m| m.text().contains("jump"))
            .expect("feedback turn should mention the bad verb");
        assert!(retry_turn.text().contains("rejected") || retry_turn.text().contains("jump"));
    }

    #[tokio::test(start_paused = true)]
    async fn long_context_flush_caps_images() {
        let scripts = (0..8).map(|_| Ok(GOOD.to_string())).collect();
        let mut w = worker_with(scripts);
        for _ in 0..8 {
            w.predict(input("click the button")).await;
        }
        assert!(image_count(w.messages()) <= cfg().max_images);
    }

    #[tokio::test(start_paused = true)]
    async fn long_context_flush_keeps_historical_text() {
        let scripts = (0..6).map(|_| Ok(GOOD.to_string())).collect();
        let client = LlmClient::new(Arc::new(ScriptedProvider::new(scripts)));
        let mut w = Worker::new(client, &cfg(), ContextProfile::Long);
        for _ in 0..6 {
            w.predict(input("click the button")).await;
        }
        // Every user turn's text survives even after its image was flushed.
        let user_texts = w
            .messages()
            .iter()
            .filter(|m| m.role == iris_model::Role::User)
            .count();
        assert_eq!(user_texts, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn short_context_flush_drops_rounds() {
        let scripts = (0..8).map(|_| Ok(GOOD.to_string())).collect();
        let client = LlmClient::new(Arc::new(ScriptedProvider::new(scripts)));
        let mut agent_cfg = cfg();
        agent_cfg.max_trajectory_length = 2;
        let mut w = Worker::new(client, &agent_cfg, ContextProfile::Short);
        for _ in 0..8 {
            w.predict(input("click the button")).await;
        }
        assert!(w.messages().len() <= 2 * 2 + 1);
        assert_eq!(w.messages()[0].role, iris_model::Role::System);
    }

    #[tokio::test(start_paused = true)]
    async fn reflection_and_knowledge_appear_in_user_turn() {
        let provider = ScriptedProvider::new(vec![Ok(GOOD.into())]);
        let last = provider.last_request.clone();
        let client = LlmClient::new(Arc::new(provider));
        let mut w = Worker::new(client, &cfg(), ContextProfile::Long);
        let knowledge = vec!["the password is in notes.txt".to_string()];
        w.predict(WorkerInput {
            instruction: "task",
            screenshot_url: "data:image/png;base64,AA==".into(),
            reflection: Some("on track, continue"),
            knowledge: &knowledge,
            code_report: Some("Code agent report for: x\nOutcome: DONE".into()),
        })
        .await;
        let sent = last.lock().unwrap().clone().unwrap();
        let user_text = sent.last().unwrap().text();
        assert!(user_text.contains("on track, continue"));
        assert!(user_text.contains("notes.txt"));
        assert!(user_text.contains("Outcome: DONE"));
    }
}
