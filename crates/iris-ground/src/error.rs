// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

/// Grounding failures.  None of these abort the task: the orchestrator
/// surfaces them to the Worker as a degraded `WAIT(1.333)` step and the next
/// capture drives recovery.
#[derive(Debug, Error)]
pub enum GroundError {
    #[error("no observation bound; capture a screenshot first")]
    NoObservation,

    #[error("no coordinates in grounding reply: {reply:?}")]
    NoCoordinates { reply: String },

    #[error("text locator chose word id {id} but only {count} words were recognised")]
    WordIdOutOfRange { id: usize, count: usize },

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("set_cell_values requires a spreadsheet driver, none is configured")]
    NoSpreadsheetDriver,

    #[error("spreadsheet driver failed: {0}")]
    Spreadsheet(String),
}
