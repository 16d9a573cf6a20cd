// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::keys::split_modifiers;
use crate::{InputBackend, InputError, Primitive};

/// Settling delay between the modifier phase and the regular-key phase of a
/// hotkey, and again before release.
const KEY_SETTLE: Duration = Duration::from_millis(25);

/// Drives compiled primitive sequences against an [`InputBackend`] in strict
/// order.  Individual primitive failures are logged and skipped; the sequence
/// always runs to the end and the next capture drives recovery.
pub struct Executor {
    backend: Arc<dyn InputBackend>,
}

impl Executor {
    pub fn new(backend: Arc<dyn InputBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn InputBackend> {
        &self.backend
    }

    /// Execute every primitive in order, best-effort.  Returns the number of
    /// primitives that failed.
    pub async fn run(&self, primitives: &[Primitive]) -> usize {
        let mut failures = 0;
        for p in primitives {
            if let Err(e) = self.execute(p).await {
                failures += 1;
                warn!(primitive = %p, error = %e, "input primitive failed");
            }
        }
        failures
    }

    async fn execute(&self, p: &Primitive) -> Result<(), InputError> {
        match p {
            Primitive::Click { x, y, count, button } => {
                self.backend.mouse_click(*x, *y, *count, *button).await
            }
            Primitive::Drag { x1, y1, x2, y2, duration, button } => {
                self.backend.mouse_drag(*x1, *y1, *x2, *y2, *duration, *button).await
            }
            Primitive::KeyDown { key } => self.backend.key_down(key).await,
            Primitive::KeyUp { key } => self.backend.key_up(key).await,
            Primitive::TypeText { text } => self.backend.type_text(text).await,
            Primitive::PressEnter => self.backend.press_key("enter").await,
            Primitive::PressBackspace => self.backend.press_key("backspace").await,
            Primitive::Hotkey { keys } => self.hotkey(keys).await,
            Primitive::Scroll { x, y, ticks, horizontal } => {
                self.backend.scroll(*x, *y, *ticks, *horizontal).await
            }
            Primitive::ClipboardSet { text } => self.backend.clipboard_set(text).await,
            Primitive::Sleep { seconds } => {
                tokio::time::sleep(Duration::from_secs_f64(*seconds)).await;
                Ok(())
            }
        }
    }

    /// Chord execution.  The ordering is load-bearing:
    /// modifiers go down in the given order, regular keys are pressed while
    /// the modifiers are held, then everything releases in reverse order.
    async fn hotkey(&self, keys: &[String]) -> Result<(), InputError> {
        let (mods, regulars) = split_modifiers(keys);

        for m in &mods {
            self.backend.key_down(m).await?;
        }
        tokio::time::sleep(KEY_SETTLE).await;
        for r in &regulars {
            self.backend.key_down(r).await?;
        }
        tokio::time::sleep(KEY_SETTLE).await;
        for r in regulars.iter().rev() {
            self.backend.key_up(r).await?;
        }
        for m in mods.iter().rev() {
            self.backend.key_up(m).await?;
        }
        Ok(())
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InputEvent, RecordingBackend};
    use iris_actions::MouseButton;

    fn executor() -> (Executor, RecordingBackend) {
        let rec = RecordingBackend::new();
        (Executor::new(Arc::new(rec.clone())), rec)
    }

    fn keys(ks: &[&str]) -> Vec<String> {
        ks.iter().map(|s| s.to_string()).collect()
    }

    // ── Hotkey determinism ────────────────────────────────────────────────────

    #[tokio::test]
    async fn hotkey_cmd_space_event_order() {
        let (ex, rec) = executor();
        ex.run(&[Primitive::Hotkey { keys: keys(&["cmd", "space"]) }]).await;
        assert_eq!(
            rec.events(),
            vec![
                InputEvent::KeyDown("cmd".into()),
                InputEvent::KeyDown("space".into()),
                InputEvent::KeyUp("space".into()),
                InputEvent::KeyUp("cmd".into()),
            ]
        );
    }

    #[tokio::test]
    async fn hotkey_ctrl_shift_t_event_order() {
        let (ex, rec) = executor();
        ex.run(&[Primitive::Hotkey { keys: keys(&["ctrl", "shift", "t"]) }]).await;
        assert_eq!(
            rec.events(),
            vec![
                InputEvent::KeyDown("ctrl".into()),
                InputEvent::KeyDown("shift".into()),
                InputEvent::KeyDown("t".into()),
                InputEvent::KeyUp("t".into()),
                InputEvent::KeyUp("shift".into()),
                InputEvent::KeyUp("ctrl".into()),
            ]
        );
    }

    #[tokio::test]
    async fn hotkey_regular_keys_are_pressed_not_skipped() {
        // The regular-key press phase must actually happen even for chords
        // with a single regular key.
        let (ex, rec) = executor();
        ex.run(&[Primitive::Hotkey { keys: keys(&["cmd", "v"]) }]).await;
        let evs = rec.events();
        assert!(evs.contains(&InputEvent::KeyDown("v".into())));
        assert!(evs.contains(&InputEvent::KeyUp("v".into())));
    }

    // ── Sequencing and best-effort ────────────────────────────────────────────

    #[tokio::test]
    async fn primitives_run_in_given_order() {
        let (ex, rec) = executor();
        ex.run(&[
            Primitive::ClipboardSet { text: "résumé".into() },
            Primitive::Hotkey { keys: keys(&["cmd", "v"]) },
        ])
        .await;
        let evs = rec.events();
        assert_eq!(evs[0], InputEvent::ClipboardSet("résumé".into()));
        assert_eq!(evs[1], InputEvent::KeyDown("cmd".into()));
    }

    #[tokio::test]
    async fn click_passes_coordinates_through() {
        let (ex, rec) = executor();
        ex.run(&[Primitive::Click { x: 960, y: 540, count: 1, button: MouseButton::Left }])
            .await;
        assert_eq!(
            rec.events(),
            vec![InputEvent::MouseClick { x: 960, y: 540, count: 1, button: MouseButton::Left }]
        );
    }

    #[tokio::test]
    async fn enter_and_backspace_are_key_taps() {
        let (ex, rec) = executor();
        ex.run(&[Primitive::PressEnter, Primitive::PressBackspace]).await;
        assert_eq!(
            rec.events(),
            vec![
                InputEvent::KeyDown("enter".into()),
                InputEvent::KeyUp("enter".into()),
                InputEvent::KeyDown("backspace".into()),
                InputEvent::KeyUp("backspace".into()),
            ]
        );
    }

    #[tokio::test]
    async fn run_reports_zero_failures_on_recording_backend() {
        let (ex, _rec) = executor();
        let failures = ex.run(&[Primitive::Sleep { seconds: 0.0 }]).await;
        assert_eq!(failures, 0);
    }
}
