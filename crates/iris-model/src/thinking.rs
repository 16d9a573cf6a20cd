// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! `<thoughts>…</thoughts>\n<answer>…</answer>` formatting and splitting.
//!
//! Providers with a separated-reasoning mode emit this combined form;
//! downstream code splits it back apart.  A response without the tags is
//! treated as answer-only.

/// Combine reasoning and answer into the canonical tagged form.
pub fn format_thinking(thoughts: &str, answer: &str) -> String {
    format!("<thoughts>{thoughts}</thoughts>\n<answer>{answer}</answer>")
}

/// Split a tagged response into `(thoughts, answer)`.
///
/// Absent tags mean the whole text is the answer and `thoughts` is `None`.
pub fn split_thinking(text: &str) -> (Option<String>, String) {
    let thoughts = slice_between(text, "<thoughts>", "</thoughts>");
    let answer = slice_between(text, "<answer>", "</answer>");
    match (thoughts, answer) {
        (t, Some(a)) => (t.map(str::trim).map(String::from), a.trim().to_string()),
        (Some(t), None) => {
            // Thoughts present but no answer tag: everything after the
            // closing thoughts tag is the answer.
            let after = text
                .split_once("</thoughts>")
                .map(|(_, rest)| rest)
                .unwrap_or("");
            (Some(t.trim().to_string()), after.trim().to_string())
        }
        (None, None) => (None, text.trim().to_string()),
    }
}

fn slice_between<'a>(text: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = text.find(open)? + open.len();
    let end = text[start..].find(close)? + start;
    Some(&text[start..end])
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_through_format_and_split() {
        let combined = format_thinking("the button is on the left", "agent.click(\"button\")");
        let (thoughts, answer) = split_thinking(&combined);
        assert_eq!(thoughts.as_deref(), Some("the button is on the left"));
        assert_eq!(answer, "agent.click(\"button\")");
    }

    #[test]
    fn tagless_text_is_answer_only() {
        let (thoughts, answer) = split_thinking("plain response");
        assert!(thoughts.is_none());
        assert_eq!(answer, "plain response");
    }

    #[test]
    fn thoughts_without_answer_tag_use_trailing_text() {
        let (thoughts, answer) = split_thinking("<thoughts>hm</thoughts>\nthe plan");
        assert_eq!(thoughts.as_deref(), Some("hm"));
        assert_eq!(answer, "the plan");
    }

    #[test]
    fn empty_thoughts_are_preserved_as_empty() {
        let (thoughts, answer) = split_thinking("<thoughts></thoughts>\n<answer>a</answer>");
        assert_eq!(thoughts.as_deref(), Some(""));
        assert_eq!(answer, "a");
    }
}
