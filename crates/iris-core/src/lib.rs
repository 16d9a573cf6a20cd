// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! The orchestrator: capture → predict → execute, one action per step, until
//! a terminal action or the step budget.

mod control;
mod orchestrator;
mod record;

pub use control::ControlFlags;
pub use orchestrator::{Orchestrator, TaskOutcome};
pub use record::{StepKind, StepRecord};
