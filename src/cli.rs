// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
use clap::Parser;
use iris_config::Platform;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "iris",
    about = "An autonomous desktop GUI agent driven by multimodal language models",
    version,
    long_about = None,
)]
pub struct Cli {
    /// Natural-language instruction to carry out.
    #[arg(value_name = "INSTRUCTION")]
    pub instruction: String,

    /// Planner model provider: openai | anthropic | local | mock.
    #[arg(long)]
    pub provider: Option<String>,

    /// Planner model name, e.g. "gpt-4o" or "claude-sonnet-4-5".
    #[arg(long)]
    pub model: Option<String>,

    /// Grounding model provider (snake_case spelling also accepted).
    #[arg(long, alias = "ground_provider")]
    pub ground_provider: Option<String>,

    /// Grounding model name.
    #[arg(long, alias = "ground_model", env = "GROUNDING_MODEL")]
    pub ground_model: Option<String>,

    /// Base URL of the auxiliary grounding server.
    #[arg(long, alias = "ground_url", env = "GROUNDING_URL")]
    pub ground_url: Option<String>,

    /// Width of the grounding model's coordinate canvas.
    #[arg(long, alias = "grounding_width")]
    pub grounding_width: Option<u32>,

    /// Height of the grounding model's coordinate canvas.
    #[arg(long, alias = "grounding_height")]
    pub grounding_height: Option<u32>,

    /// Explicit config file (merged over the discovered layers).
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Step budget before the task fails as exhausted.
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Platform recipe for open/switch actions (defaults to the host).
    #[arg(long, value_enum)]
    pub platform: Option<Platform>,

    /// Request the provider's separated-reasoning mode.
    #[arg(long)]
    pub thinking: bool,

    /// Verbose logging to stderr (or set IRIS_LOG).
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positional_instruction_and_flags() {
        let cli = Cli::parse_from([
            "iris",
            "Click the save button",
            "--provider",
            "openai",
            "--model",
            "gpt-4o",
            "--grounding_width",
            "1280",
        ]);
        assert_eq!(cli.instruction, "Click the save button");
        assert_eq!(cli.provider.as_deref(), Some("openai"));
        assert_eq!(cli.grounding_width, Some(1280));
    }

    #[test]
    fn kebab_and_snake_spellings_both_work() {
        let a = Cli::parse_from(["iris", "t", "--ground-url", "http://localhost:8003"]);
        let b = Cli::parse_from(["iris", "t", "--ground_url", "http://localhost:8003"]);
        assert_eq!(a.ground_url, b.ground_url);
    }
}
