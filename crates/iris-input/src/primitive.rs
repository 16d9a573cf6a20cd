// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
use std::fmt;

use iris_actions::MouseButton;
use serde::{Deserialize, Serialize};

/// A low-level input command.  Produced by the grounder's compilation table
/// and consumed immediately by the [`Executor`](crate::Executor).
///
/// `Display` renders the exec-code form logged per step, e.g.
/// `CLICK(960, 540, clicks=1, button=left)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    Click {
        x: i32,
        y: i32,
        count: u32,
        button: MouseButton,
    },
    Drag {
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        /// Seconds taken to travel from start to end.
        duration: f64,
        button: MouseButton,
    },
    KeyDown { key: String },
    KeyUp { key: String },
    TypeText { text: String },
    PressEnter,
    PressBackspace,
    Hotkey { keys: Vec<String> },
    Scroll {
        x: i32,
        y: i32,
        ticks: i32,
        horizontal: bool,
    },
    ClipboardSet { text: String },
    Sleep { seconds: f64 },
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Click { x, y, count, button } => {
                write!(f, "CLICK({x}, {y}, clicks={count}, button={})", button.as_str())
            }
            Self::Drag { x1, y1, x2, y2, duration, button } => write!(
                f,
                "DRAG({x1}, {y1} -> {x2}, {y2}, duration={duration:?}, button={})",
                button.as_str()
            ),
            Self::KeyDown { key } => write!(f, "KEY_DOWN({key})"),
            Self::KeyUp { key } => write!(f, "KEY_UP({key})"),
            Self::TypeText { text } => write!(f, "TYPE({text:?})"),
            Self::PressEnter => write!(f, "PRESS_ENTER()"),
            Self::PressBackspace => write!(f, "PRESS_BACKSPACE()"),
            Self::Hotkey { keys } => write!(f, "HOTKEY({})", keys.join(",")),
            Self::Scroll { x, y, ticks, horizontal } => {
                write!(f, "SCROLL({x}, {y}, ticks={ticks}, horizontal={horizontal})")
            }
            Self::ClipboardSet { text } => write!(f, "CLIPBOARD_SET({text:?})"),
            Self::Sleep { seconds } => write!(f, "WAIT({seconds:?})"),
        }
    }
}

/// Render a compiled sequence as one exec-code line per primitive.
pub fn render_exec_code(primitives: &[Primitive]) -> String {
    primitives
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
