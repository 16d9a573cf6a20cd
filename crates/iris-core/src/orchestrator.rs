// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use iris_agents::{Reflector, Worker, WorkerInput, DEGRADED_WAIT_SECS};
use iris_config::AgentConfig;
use iris_ground::{CompiledStep, Grounder};
use iris_input::{render_exec_code, Executor, Primitive};
use iris_screen::{Observation, ScreenSource};

use crate::control::ControlFlags;
use crate::record::{StepKind, StepRecord};

/// Attempts to capture a screenshot before the task is abandoned.
const CAPTURE_RETRIES: usize = 5;

/// Poll interval while paused.
const PAUSE_POLL: Duration = Duration::from_millis(100);

/// How a task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The model emitted `agent.done()`.
    Succeeded,
    /// The model emitted `agent.fail()`, or the screen could not be captured.
    Failed,
    /// The step budget ran out first.
    BudgetExhausted,
    /// The host cancelled the task.
    Cancelled,
}

impl TaskOutcome {
    /// Process exit code: 0 success, 1 unrecoverable, 2 budget exhausted.
    pub fn exit_code(&self) -> i32 {
        match self {
            TaskOutcome::Succeeded => 0,
            TaskOutcome::Failed | TaskOutcome::Cancelled => 1,
            TaskOutcome::BudgetExhausted => 2,
        }
    }
}

/// Drives one task: capture → reflect → predict → compile → execute, one
/// action per step.  Observations are re-captured after every executed
/// action, never reused; shared task state (knowledge, code report) lives on
/// the grounder and is touched only between phases.
pub struct Orchestrator {
    screen: Arc<dyn ScreenSource>,
    worker: Worker,
    reflector: Option<Reflector>,
    grounder: Grounder,
    executor: Executor,
    cfg: AgentConfig,
    canvas: (u32, u32),
    flags: Arc<ControlFlags>,
    records: Vec<StepRecord>,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        screen: Arc<dyn ScreenSource>,
        worker: Worker,
        reflector: Option<Reflector>,
        grounder: Grounder,
        executor: Executor,
        cfg: AgentConfig,
        canvas: (u32, u32),
    ) -> Self {
        Self {
            screen,
            worker,
            reflector,
            grounder,
            executor,
            cfg,
            canvas,
            flags: Arc::new(ControlFlags::new()),
            records: Vec::new(),
        }
    }

    /// Cooperative pause/cancel flags for the host to flip.
    pub fn control(&self) -> Arc<ControlFlags> {
        self.flags.clone()
    }

    /// Structured records of every step taken so far.
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Run the task to a terminal state.
    pub async fn run(&mut self, instruction: &str) -> TaskOutcome {
        info!(instruction, max_steps = self.cfg.max_steps, "task started");
        let mut last_plan_text = String::new();

        for step in 0..self.cfg.max_steps {
            if let Some(outcome) = self.checkpoint().await {
                return outcome;
            }

            // ── Capturing ────────────────────────────────────────────────────
            let Some(obs) = self.capture_with_retry().await else {
                warn!(step, "screen capture failed repeatedly; giving up");
                return TaskOutcome::Failed;
            };
            let screenshot_url = obs.screen.to_data_url();
            self.grounder.bind_observation(obs);

            if let Some(outcome) = self.checkpoint().await {
                return outcome;
            }

            // ── Predicting ───────────────────────────────────────────────────
            let reflection = match &mut self.reflector {
                Some(r) => r.reflect(instruction, &last_plan_text, &screenshot_url).await,
                None => None,
            };
            let plan = self
                .worker
                .predict(WorkerInput {
                    instruction,
                    screenshot_url,
                    reflection: reflection.as_ref().map(|r| r.text.as_str()),
                    knowledge: self.grounder.knowledge(),
                    code_report: self.grounder.last_code_report().map(|r| r.render()),
                })
                .await;
            last_plan_text =
                if plan.raw_text.is_empty() { plan.plan_code.clone() } else { plan.raw_text.clone() };

            if let Some(outcome) = self.checkpoint().await {
                return outcome;
            }

            // ── Executing ────────────────────────────────────────────────────
            let verb = plan.action.verb();
            let is_wait = matches!(plan.action, iris_actions::AgentAction::Wait { .. });
            match self.grounder.compile(&plan.action, instruction).await {
                Ok(CompiledStep::Done) => {
                    self.record(step, StepKind::Terminal, verb, &plan.plan_code, "", "task complete");
                    return TaskOutcome::Succeeded;
                }
                Ok(CompiledStep::Fail) => {
                    self.record(step, StepKind::Terminal, verb, &plan.plan_code, "", "task declared failed");
                    return TaskOutcome::Failed;
                }
                Ok(CompiledStep::NoOp) => {
                    self.record(step, StepKind::Internal, verb, &plan.plan_code, "", "internal effect only");
                }
                Ok(CompiledStep::Primitives(prims)) => {
                    let exec_code = render_exec_code(&prims);
                    let failures = self.executor.run(&prims).await;
                    let kind = if failures > 0 {
                        StepKind::PrimitiveError
                    } else if plan.degraded {
                        StepKind::FormatDegraded
                    } else {
                        StepKind::Executed
                    };
                    let message = if failures > 0 {
                        format!("{failures} primitive(s) failed")
                    } else {
                        format!("executed {} primitive(s)", prims.len())
                    };
                    self.record(step, kind, verb, &plan.plan_code, &exec_code, &message);
                    // A pure wait already slept; everything else settles
                    // briefly before the next capture.
                    if !is_wait {
                        tokio::time::sleep(Duration::from_secs_f64(self.cfg.settle_secs)).await;
                    }
                }
                Err(e) => {
                    // Grounding failures degrade to a short wait; the next
                    // capture gives the model a fresh view to recover from.
                    let fallback = [Primitive::Sleep { seconds: DEGRADED_WAIT_SECS }];
                    let exec_code = render_exec_code(&fallback);
                    self.executor.run(&fallback).await;
                    self.record(
                        step,
                        StepKind::GroundingError,
                        verb,
                        &plan.plan_code,
                        &exec_code,
                        &e.to_string(),
                    );
                }
            }
        }

        info!(max_steps = self.cfg.max_steps, "step budget exhausted");
        TaskOutcome::BudgetExhausted
    }

    /// Phase-boundary checkpoint: honour cancel, park while paused.
    async fn checkpoint(&self) -> Option<TaskOutcome> {
        loop {
            if self.flags.is_cancelled() {
                info!("task cancelled");
                return Some(TaskOutcome::Cancelled);
            }
            if !self.flags.is_paused() {
                return None;
            }
            tokio::time::sleep(PAUSE_POLL).await;
        }
    }

    async fn capture_with_retry(&self) -> Option<Observation> {
        for attempt in 1..=CAPTURE_RETRIES {
            match self.screen.capture().await {
                Ok(frame) => match Observation::new(frame, self.canvas.0, self.canvas.1) {
                    Ok(obs) => return Some(obs),
                    Err(e) => warn!(attempt, error = %e, "observation build failed"),
                },
                Err(e) => warn!(attempt, error = %e, "screen capture failed"),
            }
            tokio::time::sleep(Duration::from_secs_f64(self.cfg.capture_retry_secs)).await;
        }
        None
    }

    fn record(
        &mut self,
        index: usize,
        kind: StepKind,
        verb: &str,
        plan_code: &str,
        exec_code: &str,
        message: &str,
    ) {
        info!(step = index, ?kind, verb, message, "step");
        self.records
            .push(StepRecord::new(index, kind, verb, plan_code, exec_code, message));
    }
}
