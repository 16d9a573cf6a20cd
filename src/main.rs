// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! CLI entry point: wires configuration, providers, and the orchestrator.
//!
//! The OS collaborators (screen capture, input synthesis, OCR) sit behind
//! the `ScreenSource`, `InputBackend`, and `TextLocator` traits.  This
//! binary wires the built-in inert implementations so the full pipeline is
//! runnable end-to-end; a host integration replaces them at the three
//! `Arc::new(...)` seams below.

mod cli;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use cli::Cli;
use iris_agents::{CodeAgent, Reflector, Worker};
use iris_config::{Config, ModelConfig};
use iris_core::{Orchestrator, TaskOutcome};
use iris_ground::{platform_strategy, GroundRoute, Grounder};
use iris_input::{Executor, NullBackend};
use iris_model::{GroundingServerClient, LlmClient};
use iris_screen::{SolidColorScreen, StaticOcr};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(outcome) => std::process::exit(outcome.exit_code()),
        Err(e) => {
            eprintln!("iris: {e:#}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<TaskOutcome> {
    let mut config = iris_config::load(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);

    // Planner model — shared by the Worker, Reflector, text locator, and
    // code sub-agent.
    let planner = iris_model::from_config(&config.model)
        .context("constructing the planner model provider")?;
    let planner_client = LlmClient::new(planner);

    // Grounding model.  The "local" provider talks to the auxiliary server's
    // dedicated /grounding/generate route; anything else goes through the
    // normal chat-completions adapters.
    let route = if config.grounding.provider == "local" {
        GroundRoute::Server(GroundingServerClient::new(config.grounding.url.clone()))
    } else {
        let ground_cfg = ModelConfig {
            provider: config.grounding.provider.clone(),
            name: config.grounding.name.clone(),
            ..Default::default()
        };
        let provider = iris_model::from_config(&ground_cfg)
            .context("constructing the grounding model provider")?;
        GroundRoute::Chat(LlmClient::new(provider))
    };

    let coder = CodeAgent::new(
        planner_client.clone(),
        config.agent.code_budget,
        config.agent.snippet_timeout_secs,
    );
    let grounder = Grounder::new(
        route,
        planner_client.clone(),
        // OCR engine seam — a host wires its text recogniser here.
        Arc::new(StaticOcr::default()),
        platform_strategy(config.agent.platform),
        coder,
        &config.agent,
    );

    let worker = Worker::new(planner_client.clone(), &config.agent, config.model.context_profile);
    let reflector = config
        .agent
        .reflection
        .then(|| Reflector::new(planner_client, &config.agent, config.model.context_profile));

    // Screen + input seams.  Without a host integration the agent sees a
    // blank display and synthesises no events, which still exercises the
    // whole plan → action pipeline.
    warn!("no OS screen/input integration wired; running against inert backends");
    let screen = Arc::new(SolidColorScreen::new(1920, 1080, [0, 0, 0]));
    let executor = Executor::new(Arc::new(NullBackend));

    let mut orchestrator = Orchestrator::new(
        screen,
        worker,
        reflector,
        grounder,
        executor,
        config.agent.clone(),
        (config.grounding.width, config.grounding.height),
    );
    Ok(orchestrator.run(&cli.instruction).await)
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(p) = &cli.provider {
        config.model.provider = p.clone();
    }
    if let Some(m) = &cli.model {
        config.model.name = m.clone();
    }
    if cli.thinking {
        config.model.thinking = true;
    }
    if let Some(p) = &cli.ground_provider {
        config.grounding.provider = p.clone();
    }
    if let Some(m) = &cli.ground_model {
        config.grounding.name = m.clone();
    }
    if let Some(u) = &cli.ground_url {
        config.grounding.url = u.clone();
    }
    if let Some(w) = cli.grounding_width {
        config.grounding.width = w;
    }
    if let Some(h) = cli.grounding_height {
        config.grounding.height = h;
    }
    if let Some(s) = cli.max_steps {
        config.agent.max_steps = s;
    }
    if let Some(p) = cli.platform {
        config.agent.platform = p;
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("IRIS_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
