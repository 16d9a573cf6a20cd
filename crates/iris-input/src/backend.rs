// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use iris_actions::MouseButton;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("input backend failure: {0}")]
    Backend(String),
}

/// Raw input operations against the OS.  Implementations are external
/// collaborators (CGEvent, XTest, SendInput, …); the workspace ships
/// [`NullBackend`] for dry runs and [`RecordingBackend`] for tests.
///
/// Operations act at pixel coordinates and are best-effort over a single
/// invocation; they carry no notion of UI elements.
#[async_trait]
pub trait InputBackend: Send + Sync {
    async fn mouse_click(
        &self,
        x: i32,
        y: i32,
        count: u32,
        button: MouseButton,
    ) -> Result<(), InputError>;

    #[allow(clippy::too_many_arguments)]
    async fn mouse_drag(
        &self,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        duration: f64,
        button: MouseButton,
    ) -> Result<(), InputError>;

    async fn key_down(&self, key: &str) -> Result<(), InputError>;

    async fn key_up(&self, key: &str) -> Result<(), InputError>;

    /// Tap a key: down then up.
    async fn press_key(&self, key: &str) -> Result<(), InputError> {
        self.key_down(key).await?;
        self.key_up(key).await
    }

    async fn type_text(&self, text: &str) -> Result<(), InputError>;

    async fn scroll(&self, x: i32, y: i32, ticks: i32, horizontal: bool)
        -> Result<(), InputError>;

    async fn clipboard_set(&self, text: &str) -> Result<(), InputError>;
}

// ─── Null backend ─────────────────────────────────────────────────────────────

/// Logs every operation at debug level and synthesises nothing.  Used when no
/// OS backend is wired in, so the rest of the pipeline stays exercisable.
#[derive(Default)]
pub struct NullBackend;

#[async_trait]
impl InputBackend for NullBackend {
    async fn mouse_click(
        &self,
        x: i32,
        y: i32,
        count: u32,
        button: MouseButton,
    ) -> Result<(), InputError> {
        debug!(x, y, count, button = button.as_str(), "null backend: click");
        Ok(())
    }

    async fn mouse_drag(
        &self,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        duration: f64,
        button: MouseButton,
    ) -> Result<(), InputError> {
        debug!(x1, y1, x2, y2, duration, button = button.as_str(), "null backend: drag");
        Ok(())
    }

    async fn key_down(&self, key: &str) -> Result<(), InputError> {
        debug!(key, "null backend: key down");
        Ok(())
    }

    async fn key_up(&self, key: &str) -> Result<(), InputError> {
        debug!(key, "null backend: key up");
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<(), InputError> {
        debug!(len = text.len(), "null backend: type text");
        Ok(())
    }

    async fn scroll(
        &self,
        x: i32,
        y: i32,
        ticks: i32,
        horizontal: bool,
    ) -> Result<(), InputError> {
        debug!(x, y, ticks, horizontal, "null backend: scroll");
        Ok(())
    }

    async fn clipboard_set(&self, text: &str) -> Result<(), InputError> {
        debug!(len = text.len(), "null backend: clipboard set");
        Ok(())
    }
}

// ─── Recording backend ────────────────────────────────────────────────────────

/// One observed raw input event, in execution order.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    MouseClick { x: i32, y: i32, count: u32, button: MouseButton },
    MouseDrag { x1: i32, y1: i32, x2: i32, y2: i32, button: MouseButton },
    KeyDown(String),
    KeyUp(String),
    TypeText(String),
    Scroll { x: i32, y: i32, ticks: i32, horizontal: bool },
    ClipboardSet(String),
}

/// Test double that records the exact event sequence it receives.
#[derive(Default, Clone)]
pub struct RecordingBackend {
    events: Arc<Mutex<Vec<InputEvent>>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events recorded so far, in order.
    pub fn events(&self) -> Vec<InputEvent> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, ev: InputEvent) {
        self.events.lock().unwrap().push(ev);
    }
}

#[async_trait]
impl InputBackend for RecordingBackend {
    async fn mouse_click(
        &self,
        x: i32,
        y: i32,
        count: u32,
        button: MouseButton,
    ) -> Result<(), InputError> {
        self.push(InputEvent::MouseClick { x, y, count, button });
        Ok(())
    }

    async fn mouse_drag(
        &self,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        _duration: f64,
        button: MouseButton,
    ) -> Result<(), InputError> {
        self.push(InputEvent::MouseDrag { x1, y1, x2, y2, button });
        Ok(())
    }

    async fn key_down(&self, key: &str) -> Result<(), InputError> {
        self.push(InputEvent::KeyDown(key.to_string()));
        Ok(())
    }

    async fn key_up(&self, key: &str) -> Result<(), InputError> {
        self.push(InputEvent::KeyUp(key.to_string()));
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<(), InputError> {
        self.push(InputEvent::TypeText(text.to_string()));
        Ok(())
    }

    async fn scroll(
        &self,
        x: i32,
        y: i32,
        ticks: i32,
        horizontal: bool,
    ) -> Result<(), InputError> {
        self.push(InputEvent::Scroll { x, y, ticks, horizontal });
        Ok(())
    }

    async fn clipboard_set(&self, text: &str) -> Result<(), InputError> {
        self.push(InputEvent::ClipboardSet(text.to_string()));
        Ok(())
    }
}
