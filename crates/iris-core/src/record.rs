// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What happened to a step, for the structured console record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Primitives compiled and executed.
    Executed,
    /// The action had only internal effects (notes, code agent, cells).
    Internal,
    /// A terminal `done`/`fail` action.
    Terminal,
    /// Format retries exhausted; the step degraded to a short wait.
    FormatDegraded,
    /// Grounding failed; the step degraded to a short wait.
    GroundingError,
    /// One or more input primitives failed; the step still counts.
    PrimitiveError,
}

/// Append-only per-step record.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub index: usize,
    pub kind: StepKind,
    /// Verb of the parsed action.
    pub verb: String,
    /// The single extracted agent call.
    pub plan_code: String,
    /// Compiled primitive sequence, one exec-code line per primitive.
    pub exec_code: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl StepRecord {
    pub fn new(
        index: usize,
        kind: StepKind,
        verb: impl Into<String>,
        plan_code: impl Into<String>,
        exec_code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            index,
            kind,
            verb: verb.into(),
            plan_code: plan_code.into(),
            exec_code: exec_code.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serialises_kind_as_snake_case() {
        let r = StepRecord::new(3, StepKind::GroundingError, "click", "agent.click(\"x\")", "WAIT(1.333)", "no coordinates");
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"grounding_error\""), "{json}");
        assert!(json.contains("\"index\":3"));
    }
}
