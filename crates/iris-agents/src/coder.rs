// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! The code sub-agent: a bounded loop that writes and runs python/bash
//! snippets for data-manipulation work, then reports a structured summary.
//!
//! Snippets run in an isolated child process with a hard timeout.  This is
//! the only place in the system where model-authored text is executed, and
//! it never escapes the child's process group.

use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, warn};

use iris_model::{ChatMessage, GenOptions, LlmClient};

use crate::prompts::CODER_SYSTEM;

/// One executed snippet and its captured result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnippetRun {
    /// `"python"` or `"bash"`.
    pub language: String,
    pub code: String,
    /// `"success"`, `"error"`, or `"timeout"`.
    pub status: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Final report surfaced back into the Worker's next prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeReport {
    pub task_instruction: String,
    /// `"DONE"`, `"FAIL"`, or `"BUDGET_EXHAUSTED_AFTER_<n>_STEPS"`.
    pub completion_reason: String,
    pub summary: String,
    pub execution_history: Vec<SnippetRun>,
    pub steps_executed: usize,
    pub budget: usize,
}

impl CodeReport {
    /// Short textual rendering for the Worker prompt.
    pub fn render(&self) -> String {
        format!(
            "Code agent report for: {}\nOutcome: {}\nSteps: {}/{}\n{}",
            self.task_instruction, self.completion_reason, self.steps_executed, self.budget,
            self.summary,
        )
    }
}

pub struct CodeAgent {
    client: LlmClient,
    opts: GenOptions,
    budget: usize,
    snippet_timeout: Duration,
}

impl CodeAgent {
    pub fn new(client: LlmClient, budget: usize, snippet_timeout_secs: u64) -> Self {
        Self {
            client,
            opts: GenOptions::with_temperature(0.0),
            budget,
            snippet_timeout: Duration::from_secs(snippet_timeout_secs),
        }
    }

    /// Run the bounded snippet loop for `task` and return the report.
    ///
    /// Runtime failures, timeouts, and empty model responses are appended to
    /// the conversation and counted as steps; nothing here aborts the outer
    /// task.
    pub async fn run(&self, task: &str) -> CodeReport {
        let mut messages = vec![
            ChatMessage::system(CODER_SYSTEM.replace("{task}", task)),
            ChatMessage::user(format!("Task: {task}")),
        ];
        let mut history: Vec<SnippetRun> = Vec::new();
        let mut steps = 0usize;
        let mut reason: Option<String> = None;

        while steps < self.budget {
            steps += 1;
            let response = self.client.generate(&messages, &self.opts).await;

            if response.trim().is_empty() {
                warn!(step = steps, "code agent received empty model response");
                messages.push(ChatMessage::assistant(""));
                messages.push(ChatMessage::user(
                    "Status: error\nReturn Code: -1\nOutput:\n\nError:\nempty model response",
                ));
                continue;
            }
            messages.push(ChatMessage::assistant(response.clone()));

            if let Some(sentinel) = find_sentinel(&response) {
                reason = Some(sentinel.to_string());
                break;
            }

            let Some((language, code)) = extract_snippet(&response) else {
                messages.push(ChatMessage::user(
                    "Status: error\nReturn Code: -1\nOutput:\n\nError:\nno ```python or ```bash \
                     block and no DONE/FAIL sentinel in the response",
                ));
                continue;
            };

            debug!(step = steps, language, "running code agent snippet");
            let run = self.execute_snippet(&language, &code).await;
            messages.push(ChatMessage::user(format!(
                "Status: {}\nReturn Code: {}\nOutput:\n{}\nError:\n{}",
                run.status, run.exit_code, run.stdout, run.stderr
            )));
            history.push(run);
        }

        let completion_reason =
            reason.unwrap_or_else(|| format!("BUDGET_EXHAUSTED_AFTER_{steps}_STEPS"));

        let summary = self.summarise(&messages, task).await;

        CodeReport {
            task_instruction: task.to_string(),
            completion_reason,
            summary,
            execution_history: history,
            steps_executed: steps,
            budget: self.budget,
        }
    }

    /// Second model pass: a short factual summary of the session.
    async fn summarise(&self, session: &[ChatMessage], task: &str) -> String {
        let mut messages = session.to_vec();
        messages.push(ChatMessage::user(
            "Summarize in two or three factual sentences what was executed and what the \
             outcome was. No advice, no plans.",
        ));
        let summary = self.client.generate(&messages, &self.opts).await;
        if summary.trim().is_empty() {
            format!("No summary produced; ran {} snippet(s) for task: {task}", session.len() / 2)
        } else {
            summary.trim().to_string()
        }
    }

    async fn execute_snippet(&self, language: &str, code: &str) -> SnippetRun {
        let mut cmd = match language {
            "python" => {
                let mut c = Command::new("python3");
                c.arg("-c").arg(code);
                c
            }
            _ => {
                let mut c = Command::new("bash");
                c.arg("-c").arg(code);
                c
            }
        };
        // Detach the child from our stdin and make sure a timeout actually
        // kills the whole process group, not just the immediate child.
        cmd.stdin(Stdio::null());
        cmd.kill_on_drop(true);
        #[cfg(unix)]
        unsafe {
            cmd.pre_exec(|| {
                libc::setsid();
                Ok(())
            });
        }

        let result = tokio::time::timeout(self.snippet_timeout, cmd.output()).await;
        match result {
            Ok(Ok(output)) => {
                let exit_code = output.status.code().unwrap_or(-1);
                SnippetRun {
                    language: language.to_string(),
                    code: code.to_string(),
                    status: if exit_code == 0 { "success" } else { "error" }.to_string(),
                    exit_code,
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                }
            }
            Ok(Err(e)) => SnippetRun {
                language: language.to_string(),
                code: code.to_string(),
                status: "error".to_string(),
                exit_code: -1,
                stdout: String::new(),
                stderr: format!("spawn error: {e}"),
            },
            Err(_) => SnippetRun {
                language: language.to_string(),
                code: code.to_string(),
                status: "timeout".to_string(),
                exit_code: -1,
                stdout: String::new(),
                stderr: format!("timeout after {}s", self.snippet_timeout.as_secs()),
            },
        }
    }
}

/// The literal `DONE` / `FAIL` sentinel, on its own line.
fn find_sentinel(response: &str) -> Option<&'static str> {
    for line in response.lines() {
        match line.trim() {
            "DONE" => return Some("DONE"),
            "FAIL" => return Some("FAIL"),
            _ => {}
        }
    }
    None
}

fn snippet_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(python|bash)[ \t]*\n(.*?)```").unwrap())
}

/// First fenced `python`/`bash` block as `(language, code)`.
fn extract_snippet(response: &str) -> Option<(String, String)> {
    snippet_regex()
        .captures(response)
        .map(|c| (c[1].to_string(), c[2].trim().to_string()))
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
