// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Low-level input primitives and the backend that synthesises them.
//!
//! The only component allowed to touch the OS input subsystem is an
//! [`InputBackend`] implementation.  Everything above this crate speaks
//! [`Primitive`] sequences; the [`Executor`] drives them in strict order.
//! Primitives act at pixel coordinates and are best-effort: they have no
//! notion of UI elements and never fail because an element is "not present".

mod backend;
mod executor;
mod keys;
mod primitive;

pub use backend::{InputBackend, InputError, InputEvent, NullBackend, RecordingBackend};
pub use executor::Executor;
pub use keys::{is_modifier, split_modifiers, MODIFIER_KEYS};
pub use primitive::{render_exec_code, Primitive};
