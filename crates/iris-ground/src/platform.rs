// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Per-host-OS divergence, expressed as a strategy interface.
//!
//! Only two things differ between hosts: the select-all/paste modifier
//! (`cmd` vs `ctrl`) and the recipe that opens or switches applications via
//! the system launcher.

use std::sync::Arc;

use iris_config::Platform;
use iris_input::Primitive;

/// Pause after invoking the launcher, before typing into it.
const LAUNCHER_SETTLE_SECS: f64 = 0.5;
/// Pause after confirming the launcher entry, while the app comes up.
const LAUNCH_WAIT_SECS: f64 = 1.0;

pub trait PlatformStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Modifier used for select-all, copy, and paste chords.
    fn command_modifier(&self) -> &'static str;

    /// Primitive sequence that opens an application or file by name through
    /// the system launcher.
    fn open_app(&self, name: &str) -> Vec<Primitive>;

    /// Sequence that brings an already-running application to the front.
    /// Defaults to the launcher recipe, which activates a running app on
    /// every supported host.
    fn switch_app(&self, app_code: &str) -> Vec<Primitive> {
        self.open_app(app_code)
    }
}

/// Launcher recipe shared by all hosts: invoke the launcher chord, settle,
/// type the name, confirm, wait for the app.
fn launcher_sequence(launcher_keys: &[&str], name: &str) -> Vec<Primitive> {
    vec![
        Primitive::Hotkey { keys: launcher_keys.iter().map(|k| k.to_string()).collect() },
        Primitive::Sleep { seconds: LAUNCHER_SETTLE_SECS },
        Primitive::TypeText { text: name.to_string() },
        Primitive::PressEnter,
        Primitive::Sleep { seconds: LAUNCH_WAIT_SECS },
    ]
}

pub struct Darwin;

impl PlatformStrategy for Darwin {
    fn name(&self) -> &'static str {
        "darwin"
    }
    fn command_modifier(&self) -> &'static str {
        "cmd"
    }
    fn open_app(&self, name: &str) -> Vec<Primitive> {
        // Spotlight
        launcher_sequence(&["cmd", "space"], name)
    }
}

pub struct Linux;

impl PlatformStrategy for Linux {
    fn name(&self) -> &'static str {
        "linux"
    }
    fn command_modifier(&self) -> &'static str {
        "ctrl"
    }
    fn open_app(&self, name: &str) -> Vec<Primitive> {
        // GNOME activities / KDE launcher
        launcher_sequence(&["super"], name)
    }
}

pub struct Windows;

impl PlatformStrategy for Windows {
    fn name(&self) -> &'static str {
        "windows"
    }
    fn command_modifier(&self) -> &'static str {
        "ctrl"
    }
    fn open_app(&self, name: &str) -> Vec<Primitive> {
        // Start menu search
        launcher_sequence(&["win"], name)
    }
}

/// Strategy instance for a configured platform.
pub fn platform_strategy(platform: Platform) -> Arc<dyn PlatformStrategy> {
    match platform {
        Platform::Darwin => Arc::new(Darwin),
        Platform::Linux => Arc::new(Linux),
        Platform::Windows => Arc::new(Windows),
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
