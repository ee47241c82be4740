//! An in-memory desktop: keyboard and capture surface in one.
//!
//! Keystrokes go into a shared text buffer the way a focused text box would
//! receive them:
//!
//! - a Unicode tap appends its character, or `?` if the character is listed
//!   as broken (simulating a remote session that mangles raw Unicode input);
//!   surrogate pairs are joined before appending;
//! - a virtual-key press appends whatever the configured layout produces for
//!   that key under the currently held modifiers;
//! - Enter appends `'\n'`.
//!
//! Clones share the same state, so one handle can be given to the dispatch
//! policy as a keyboard and another to calibration as the capture surface.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use vkb_core::keymap::layout_scan::{is_modifier, VK_CONTROL, VK_MENU, VK_RETURN, VK_SHIFT};
use vkb_core::{KeyStroke, ModifierMask};

use crate::application::calibrate_keyboard::{CaptureError, CaptureSurface};
use crate::application::inject_char::PlatformKeyboard;

/// Character typed when a broken Unicode injection reaches the buffer.
pub const GARBLED: char = '?';

#[derive(Default)]
struct DesktopState {
    buffer: String,
    layout: HashMap<char, KeyStroke>,
    broken_unicode: HashSet<char>,
    held: BTreeSet<u8>,
    pending_high: Option<u16>,
    open: bool,
    fail_open: bool,
}

impl DesktopState {
    fn held_mask(&self) -> ModifierMask {
        self.held.iter().fold(ModifierMask::NONE, |mask, vk| {
            mask | match *vk {
                VK_SHIFT => ModifierMask::SHIFT,
                VK_CONTROL => ModifierMask::CONTROL,
                VK_MENU => ModifierMask::ALT,
                _ => ModifierMask::NONE,
            }
        })
    }

    fn receive(&mut self, ch: char) {
        if self.broken_unicode.contains(&ch) {
            self.buffer.push(GARBLED);
        } else {
            self.buffer.push(ch);
        }
    }
}

/// Shared simulated desktop.  See the module docs for the typing model.
#[derive(Clone, Default)]
pub struct SimulatedDesktop {
    state: Arc<Mutex<DesktopState>>,
}

impl SimulatedDesktop {
    /// A desktop with an empty layout; layout replay fails for everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// A desktop with a US-style layout for letters, digits, space and the
    /// shifted digit-row symbols.
    pub fn us_layout() -> Self {
        let desktop = Self::new();
        {
            let mut state = desktop.lock();
            for (i, lower) in ('a'..='z').enumerate() {
                let vk = 0x41 + i as u8;
                state.layout.insert(lower, KeyStroke::new(vk, ModifierMask::NONE));
                state
                    .layout
                    .insert(lower.to_ascii_uppercase(), KeyStroke::new(vk, ModifierMask::SHIFT));
            }
            for (i, (digit, shifted)) in "0123456789".chars().zip(")!@#$%^&*(".chars()).enumerate() {
                let vk = 0x30 + i as u8;
                state.layout.insert(digit, KeyStroke::new(vk, ModifierMask::NONE));
                state.layout.insert(shifted, KeyStroke::new(vk, ModifierMask::SHIFT));
            }
            state.layout.insert(' ', KeyStroke::new(0x20, ModifierMask::NONE));
        }
        desktop
    }

    /// Adds (or replaces) one layout entry.
    pub fn with_key(self, ch: char, stroke: KeyStroke) -> Self {
        self.lock().layout.insert(ch, stroke);
        self
    }

    /// Makes direct injection of each of `chars` arrive as [`GARBLED`].
    pub fn with_broken_unicode(self, chars: impl IntoIterator<Item = char>) -> Self {
        self.lock().broken_unicode.extend(chars);
        self
    }

    /// Makes [`CaptureSurface::prepare`] fail.
    pub fn failing_open(self) -> Self {
        self.lock().fail_open = true;
        self
    }

    /// Everything typed since the last clear.
    pub fn typed(&self) -> String {
        self.lock().buffer.clone()
    }

    /// Modifier keys currently held down.
    pub fn held_modifiers(&self) -> Vec<u8> {
        self.lock().held.iter().copied().collect()
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    fn lock(&self) -> MutexGuard<'_, DesktopState> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PlatformKeyboard for SimulatedDesktop {
    fn tap_unicode_unit(&self, unit: u16) {
        let mut state = self.lock();
        match unit {
            0xD800..=0xDBFF => state.pending_high = Some(unit),
            0xDC00..=0xDFFF => {
                if let Some(high) = state.pending_high.take() {
                    let code = 0x10000 + (((high as u32) - 0xD800) << 10) + ((unit as u32) - 0xDC00);
                    if let Some(ch) = char::from_u32(code) {
                        state.receive(ch);
                    }
                }
            }
            _ => {
                state.pending_high = None;
                if let Some(ch) = char::from_u32(unit as u32) {
                    state.receive(ch);
                }
            }
        }
    }

    fn send_virtual_key(&self, vk: u8, key_up: bool) {
        let mut state = self.lock();
        if is_modifier(vk) {
            if key_up {
                state.held.remove(&vk);
            } else {
                state.held.insert(vk);
            }
            return;
        }
        if key_up {
            return;
        }
        if vk == VK_RETURN {
            state.buffer.push('\n');
            return;
        }
        let pressed = KeyStroke::new(vk, state.held_mask());
        let produced = state
            .layout
            .iter()
            .find(|(_, stroke)| **stroke == pressed)
            .map(|(ch, _)| *ch);
        if let Some(ch) = produced {
            state.buffer.push(ch);
        }
    }

    fn scan_char(&self, ch: char) -> Option<KeyStroke> {
        self.lock().layout.get(&ch).copied()
    }
}

impl CaptureSurface for SimulatedDesktop {
    fn prepare(&mut self) -> Result<(), CaptureError> {
        let mut state = self.lock();
        if state.fail_open {
            return Err(CaptureError::Open("simulated desktop refused focus".to_string()));
        }
        state.open = true;
        state.buffer.clear();
        Ok(())
    }

    fn clear(&mut self) {
        self.lock().buffer.clear();
    }

    fn read(&mut self) -> String {
        self.typed()
    }

    fn settle(&mut self, _duration: Duration) {
        // Delivery is synchronous.
    }

    fn close(&mut self) {
        self.lock().open = false;
    }
}
