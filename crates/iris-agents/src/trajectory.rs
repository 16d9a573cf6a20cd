// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Trajectory flush policies that keep a conversation bounded.
//!
//! Long-context providers keep every text part and prune only old images;
//! short-context providers drop whole turn rounds from the front (after the
//! system message).

use iris_model::{ChatMessage, ContentPart};

/// Keep only the newest `max_images` image parts across all messages.
///
/// Messages are walked newest-to-oldest; once the count exceeds the cap,
/// older image parts are removed.  Text parts and message ordering are
/// never touched.
pub fn flush_images(messages: &mut [ChatMessage], max_images: usize) {
    let mut seen = 0usize;
    for msg in messages.iter_mut().rev() {
        // Parts are walked in reverse as well so the newest image in a
        // multi-image message is the one that survives.
        let mut keep = vec![true; msg.parts.len()];
        for (i, part) in msg.parts.iter().enumerate().rev() {
            if part.is_image() {
                seen += 1;
                if seen > max_images {
                    keep[i] = false;
                }
            }
        }
        let mut flags = keep.into_iter();
        msg.parts.retain(|_| flags.next().unwrap_or(true));
    }
}

/// Drop one user+assistant round at index 1 while the message count exceeds
/// `max_messages`.  Index 0 (the system prompt) is always preserved.
pub fn flush_rounds(messages: &mut Vec<ChatMessage>, max_messages: usize) {
    while messages.len() > max_messages && messages.len() >= 3 {
        messages.remove(1);
        messages.remove(1);
    }
}

/// Total image parts across the conversation.
pub fn image_count(messages: &[ChatMessage]) -> usize {
    messages.iter().map(|m| m.image_count()).sum()
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn screenshot_turn(n: usize) -> ChatMessage {
        ChatMessage::user_with_parts(vec![
            ContentPart::text(format!("step {n}")),
            ContentPart::image(format!("data:image/png;base64,IMG{n}")),
        ])
    }

    // ── flush_images ──────────────────────────────────────────────────────────

    #[test]
    fn image_cap_is_enforced_across_messages() {
        let mut msgs = vec![ChatMessage::system("sys")];
        for n in 0..6 {
            msgs.push(screenshot_turn(n));
            msgs.push(ChatMessage::assistant(format!("plan {n}")));
        }
        flush_images(&mut msgs, 3);
        assert_eq!(image_count(&msgs), 3);
    }

    #[test]
    fn newest_images_survive_the_flush() {
        let mut msgs = vec![screenshot_turn(0), screenshot_turn(1), screenshot_turn(2)];
        flush_images(&mut msgs, 1);
        assert_eq!(msgs[0].image_count(), 0);
        assert_eq!(msgs[1].image_count(), 0);
        assert_eq!(msgs[2].image_count(), 1);
    }

    #[test]
    fn text_parts_are_never_dropped() {
        let mut msgs = vec![screenshot_turn(0), screenshot_turn(1)];
        flush_images(&mut msgs, 0);
        assert_eq!(image_count(&msgs), 0);
        assert_eq!(msgs[0].text(), "step 0");
        assert_eq!(msgs[1].text(), "step 1");
    }

    #[test]
    fn flush_under_cap_is_a_no_op() {
        let mut msgs = vec![screenshot_turn(0)];
        let before = msgs.clone();
        flush_images(&mut msgs, 3);
        assert_eq!(msgs, before);
    }

    // ── flush_rounds ──────────────────────────────────────────────────────────

    #[test]
    fn rounds_drop_from_index_one() {
        let mut msgs = vec![ChatMessage::system("sys")];
        for n in 0..4 {
            msgs.push(ChatMessage::user(format!("u{n}")));
            msgs.push(ChatMessage::assistant(format!("a{n}")));
        }
        // max_trajectory_length = 2 → cap is 2·2 + 1 = 5 messages
        flush_rounds(&mut msgs, 5);
        assert_eq!(msgs.len(), 5);
        assert_eq!(msgs[0].text(), "sys");
        // Oldest rounds (u0/a0, u1/a1) are gone; newest are intact.
        assert_eq!(msgs[1].text(), "u2");
        assert_eq!(msgs[4].text(), "a3");
    }

    #[test]
    fn flush_rounds_never_removes_the_system_message() {
        let mut msgs = vec![
            ChatMessage::system("sys"),
            ChatMessage::user("u"),
            ChatMessage::assistant("a"),
        ];
        flush_rounds(&mut msgs, 1);
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].text(), "sys");
    }
}
