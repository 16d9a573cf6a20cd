// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! The grounder: resolves natural-language element descriptions to screen
//! coordinates and compiles typed actions into executable primitive
//! sequences.
//!
//! The grounder also owns the task-scoped shared state — the knowledge
//! buffer and the last code-agent report — as declared fields, mutated only
//! between orchestrator phases.

mod error;
mod grounder;
mod platform;
mod spreadsheet;

pub use error::GroundError;
pub use grounder::{Alignment, CompiledStep, GroundRoute, Grounder};
pub use platform::{platform_strategy, Darwin, Linux, PlatformStrategy, Windows};
pub use spreadsheet::{RecordingSpreadsheet, SpreadsheetDriver};
