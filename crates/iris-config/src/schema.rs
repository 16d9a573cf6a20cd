// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
use serde::{Deserialize, Serialize};

/// Serde default helper — returns `true`.
///
/// `#[serde(default)]` on a `bool` always falls back to `false`, so fields
/// that should be on unless explicitly disabled need a named function.
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Planner model (the Worker and Reflector share this provider).
    #[serde(default)]
    pub model: ModelConfig,
    /// Grounding model used to resolve element descriptions to coordinates.
    #[serde(default)]
    pub grounding: GroundingConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Provider identifier: "openai" | "anthropic" | "local" | "mock".
    pub provider: String,
    /// Model name forwarded to the provider API.
    pub name: String,
    /// Environment variable that holds the API key (read at runtime).
    pub api_key_env: Option<String>,
    /// Explicit API key; prefer api_key_env in config files to avoid secrets
    /// in version-controlled files.
    pub api_key: Option<String>,
    /// Base URL override.  Useful for local proxies or gateways.
    pub base_url: Option<String>,
    /// Maximum tokens to request in a single completion.
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0.0–2.0).
    pub temperature: Option<f32>,
    /// Request the provider's separated-reasoning mode where supported.
    /// Responses arrive as `<thoughts>…</thoughts>\n<answer>…</answer>`.
    #[serde(default)]
    pub thinking: bool,
    /// Context-management profile.  Long-context providers keep all text and
    /// prune only old images; short-context providers drop whole turn pairs.
    #[serde(default)]
    pub context_profile: ContextProfile,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".into(),
            name: "claude-sonnet-4-5".into(),
            api_key_env: None,
            api_key: None,
            base_url: None,
            max_tokens: None,
            temperature: None,
            thinking: false,
            context_profile: ContextProfile::Long,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextProfile {
    #[default]
    Long,
    Short,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundingConfig {
    /// Provider identifier for the grounding model.  "local" talks to the
    /// auxiliary grounding server (see `url`).
    pub provider: String,
    /// Grounding model name.  Overridden by the GROUNDING_MODEL env var.
    pub name: String,
    /// Base URL of the auxiliary grounding server.
    /// Overridden by the GROUNDING_URL env var.
    pub url: String,
    /// Width of the canvas the grounding model emits coordinates in.
    /// Must match the served model exactly or clicks miss.
    pub width: u32,
    /// Height of the grounding canvas.
    pub height: u32,
}

impl Default for GroundingConfig {
    fn default() -> Self {
        Self {
            provider: "local".into(),
            name: "ui-tars-7b".into(),
            url: "http://127.0.0.1:8003".into(),
            width: 1000,
            height: 1000,
        }
    }
}

/// Host platform the grounder compiles `Open`/`SwitchApplications` for.
///
/// Switching the platform changes only the application-launch recipe and the
/// select-all/paste modifier (`cmd` vs `ctrl`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Darwin,
    Linux,
    Windows,
}

impl Platform {
    /// Platform of the host this binary was compiled for.
    pub fn host() -> Self {
        if cfg!(target_os = "macos") {
            Platform::Darwin
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::host()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum orchestrator steps before the task fails with BudgetExhausted.
    pub max_steps: usize,
    /// Maximum rounds retained by the short-context trajectory flush.
    pub max_trajectory_length: usize,
    /// Maximum screenshot images retained by the long-context flush.
    pub max_images: usize,
    /// Upper bound accepted for `agent.wait(seconds)`.
    pub wait_cap_secs: f64,
    /// Sleep after each executed action before the next capture.
    pub settle_secs: f64,
    /// Sleep before retrying a failed screenshot capture.
    pub capture_retry_secs: f64,
    /// Multiplier converting `Scroll.clicks` to backend wheel ticks.
    pub scroll_unit: i32,
    /// Maximum steps the code sub-agent may take per delegation.
    pub code_budget: usize,
    /// Wall-clock timeout for a single code-agent snippet, in seconds.
    pub snippet_timeout_secs: u64,
    /// Host platform strategy for the grounder.
    #[serde(default)]
    pub platform: Platform,
    /// Extra characters (beyond alphabetic) preserved at OCR word edges.
    /// `None` keeps the built-in set.
    pub ocr_keep_chars: Option<String>,
    /// Whether the Reflector runs at all.  Disabling it removes the
    /// per-step critique turn from the Worker prompt.
    #[serde(default = "default_true")]
    pub reflection: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: 15,
            max_trajectory_length: 8,
            max_images: 3,
            wait_cap_secs: 60.0,
            settle_secs: 0.5,
            capture_retry_secs: 0.5,
            scroll_unit: 1,
            code_budget: 20,
            snippet_timeout_secs: 30,
            platform: Platform::default(),
            ocr_keep_chars: None,
            reflection: true,
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
