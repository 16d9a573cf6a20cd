// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Mouse button selector shared by click-like verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "middle" => Some(Self::Middle),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Middle => "middle",
        }
    }
}

/// A scalar cell value for `set_cell_values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// One step the agent commits to per turn.
///
/// This is the closed verb set: every model response must parse to exactly
/// one of these variants or the turn is rejected with parser feedback.
/// Field defaults match the call syntax — omitted arguments and explicitly
/// written defaults produce identical values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verb", rename_all = "snake_case")]
pub enum AgentAction {
    Click {
        /// Natural-language description of the element to click.
        description: String,
        num_clicks: u32,
        button: MouseButton,
        /// Keys held down for the duration of the click.
        hold_keys: Vec<String>,
    },
    Type {
        /// Element to click before typing; `None` types into the current focus.
        description: Option<String>,
        text: String,
        /// Select-all + delete the existing content first.
        overwrite: bool,
        /// Press Enter after typing.
        enter: bool,
    },
    Scroll {
        description: String,
        /// Wheel clicks; the sign selects the direction.
        clicks: i32,
        horizontal: bool,
    },
    DragAndDrop {
        start_desc: String,
        end_desc: String,
        hold_keys: Vec<String>,
    },
    HighlightTextSpan {
        start_phrase: String,
        end_phrase: String,
        button: MouseButton,
    },
    Hotkey {
        /// Non-empty; modifiers and regular keys may be freely mixed.
        keys: Vec<String>,
    },
    HoldAndPress {
        hold_keys: Vec<String>,
        press_keys: Vec<String>,
    },
    Wait {
        seconds: f64,
    },
    Done,
    Fail,
    CallCodeAgent {
        /// `None` delegates the current task instruction.
        task: Option<String>,
    },
    SwitchApplications {
        app_code: String,
    },
    Open {
        app_or_filename: String,
    },
    SaveToKnowledge {
        notes: Vec<String>,
    },
    SetCellValues {
        values: BTreeMap<String, CellValue>,
        app: String,
        sheet: String,
    },
}

impl AgentAction {
    /// The verb name as it appears in model call syntax (`agent.<verb>(…)`).
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Click { .. } => "click",
            Self::Type { .. } => "type",
            Self::Scroll { .. } => "scroll",
            Self::DragAndDrop { .. } => "drag_and_drop",
            Self::HighlightTextSpan { .. } => "highlight_text_span",
            Self::Hotkey { .. } => "hotkey",
            Self::HoldAndPress { .. } => "hold_and_press",
            Self::Wait { .. } => "wait",
            Self::Done => "done",
            Self::Fail => "fail",
            Self::CallCodeAgent { .. } => "call_code_agent",
            Self::SwitchApplications { .. } => "switch_applications",
            Self::Open { .. } => "open",
            Self::SaveToKnowledge { .. } => "save_to_knowledge",
            Self::SetCellValues { .. } => "set_cell_values",
        }
    }

    /// Whether this action ends the task instead of producing input events.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Fail)
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verb_names_are_snake_case() {
        assert_eq!(AgentAction::Done.verb(), "done");
        assert_eq!(
            AgentAction::HighlightTextSpan {
                start_phrase: "a".into(),
                end_phrase: "b".into(),
                button: MouseButton::Left,
            }
            .verb(),
            "highlight_text_span"
        );
    }

    #[test]
    fn done_and_fail_are_terminal() {
        assert!(AgentAction::Done.is_terminal());
        assert!(AgentAction::Fail.is_terminal());
        assert!(!AgentAction::Wait { seconds: 1.0 }.is_terminal());
    }

    #[test]
    fn mouse_button_parse_rejects_unknown() {
        assert_eq!(MouseButton::parse("left"), Some(MouseButton::Left));
        assert_eq!(MouseButton::parse("LEFT"), None);
        assert_eq!(MouseButton::parse("double"), None);
    }

    #[test]
    fn action_serialises_with_verb_tag() {
        let a = AgentAction::Wait { seconds: 2.5 };
        let json = serde_json::to_string(&a).unwrap();
        assert!(json.contains("\"verb\":\"wait\""), "{json}");
    }

    #[test]
    fn cell_value_untagged_round_trip() {
        let v: CellValue = serde_json::from_str("42").unwrap();
        assert_eq!(v, CellValue::Int(42));
        let v: CellValue = serde_json::from_str("\"total\"").unwrap();
        assert_eq!(v, CellValue::Text("total".into()));
    }
}
