// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use iris_actions::CellValue;

/// External spreadsheet-automation collaborator for `set_cell_values`.
///
/// The workspace ships no concrete backend; hosts that can script their
/// office suite implement this and hand it to the grounder.
#[async_trait]
pub trait SpreadsheetDriver: Send + Sync {
    async fn set_cells(
        &self,
        app: &str,
        sheet: &str,
        values: &BTreeMap<String, CellValue>,
    ) -> anyhow::Result<()>;
}

/// Test double that records every call.
#[derive(Default, Clone)]
pub struct RecordingSpreadsheet {
    #[allow(clippy::type_complexity)]
    calls: Arc<Mutex<Vec<(String, String, BTreeMap<String, CellValue>)>>>,
}

impl RecordingSpreadsheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(String, String, BTreeMap<String, CellValue>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpreadsheetDriver for RecordingSpreadsheet {
    async fn set_cells(
        &self,
        app: &str,
        sheet: &str,
        values: &BTreeMap<String, CellValue>,
    ) -> anyhow::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((app.to_string(), sheet.to_string(), values.clone()));
        Ok(())
    }
}
