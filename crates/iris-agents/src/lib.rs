// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! The planning agents: Worker (next-plan generation with format-validated
//! retries), Reflector (advisory trajectory critique), and the bounded-budget
//! code sub-agent.

mod checkers;
mod coder;
pub mod prompts;
mod reflector;
pub mod trajectory;
mod worker;

pub use checkers::{FormatChecker, ParsesChecker, SingleCallChecker};
pub use coder::{CodeAgent, CodeReport, SnippetRun};
pub use reflector::{Reflection, Reflector};
pub use worker::{PlanStep, Worker, WorkerInput, DEGRADED_WAIT_SECS};
