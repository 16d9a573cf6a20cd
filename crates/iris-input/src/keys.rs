// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! The fixed modifier-key table.
//!
//! Hotkey execution partitions its key list into modifiers and regular keys
//! by membership here; anything not listed is a regular key.

/// Keys treated as modifiers, including common aliases.
pub const MODIFIER_KEYS: &[&str] = &[
    "shift", "ctrl", "control", "cmd", "command", "alt", "option", "meta", "super", "win",
];

pub fn is_modifier(key: &str) -> bool {
    MODIFIER_KEYS.contains(&key.to_ascii_lowercase().as_str())
}

/// Partition `keys` into `(modifiers, regulars)`, each preserving the input
/// order.
pub fn split_modifiers<'a>(keys: &'a [String]) -> (Vec<&'a str>, Vec<&'a str>) {
    let mut mods = Vec::new();
    let mut regulars = Vec::new();
    for k in keys {
        if is_modifier(k) {
            mods.push(k.as_str());
        } else {
            regulars.push(k.as_str());
        }
    }
    (mods, regulars)
}
