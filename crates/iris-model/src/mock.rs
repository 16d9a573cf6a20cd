// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;

use crate::{ChatMessage, ChatProvider, GenOptions, Role};

/// Deterministic mock provider.  Echoes the last user message back.
#[derive(Default)]
pub struct EchoProvider;

#[async_trait]
impl ChatProvider for EchoProvider {
    fn name(&self) -> &str {
        "mock"
    }
    fn model_name(&self) -> &str {
        "echo"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        _opts: &GenOptions,
    ) -> anyhow::Result<String> {
        let reply = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.text())
            .unwrap_or_else(|| "[no input]".into());
        Ok(format!("MOCK: {reply}"))
    }
}

/// Pre-scripted provider.  Each `complete` call pops the next entry from the
/// front of the queue; `Err` entries simulate transport failures.  Exhausted
/// scripts also fail, so a test that over-calls is caught.
pub struct ScriptedProvider {
    scripts: Arc<Mutex<Vec<Result<String, String>>>>,
    calls: Arc<Mutex<usize>>,
    /// The full message list of the most recent `complete` call, for
    /// asserting on what was actually sent.
    pub last_request: Arc<Mutex<Option<Vec<ChatMessage>>>>,
    thinking: bool,
}

impl ScriptedProvider {
    pub fn new(scripts: Vec<Result<String, String>>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts)),
            calls: Arc::new(Mutex::new(0)),
            last_request: Arc::new(Mutex::new(None)),
            thinking: false,
        }
    }

    /// Convenience: provider that always returns the same reply.
    pub fn always(reply: impl Into<String>) -> Self {
        let r: String = reply.into();
        // A generous fixed supply; tests never legitimately need more.
        Self::new(std::iter::repeat_with(|| Ok(r.clone())).take(64).collect())
    }

    /// Declare that this mock supports separated reasoning.
    pub fn with_thinking(mut self) -> Self {
        self.thinking = true;
        self
    }

    /// Shared call counter for asserting attempt counts.
    pub fn call_count(&self) -> Arc<Mutex<usize>> {
        self.calls.clone()
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted-mock"
    }
    fn model_name(&self) -> &str {
        "scripted"
    }
    fn supports_thinking(&self) -> bool {
        self.thinking
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        _opts: &GenOptions,
    ) -> anyhow::Result<String> {
        *self.calls.lock().unwrap() += 1;
        *self.last_request.lock().unwrap() = Some(messages.to_vec());
        let mut scripts = self.scripts.lock().unwrap();
        if scripts.is_empty() {
            return Err(anyhow!("scripted provider exhausted"));
        }
        scripts.remove(0).map_err(|e| anyhow!(e))
    }
}
