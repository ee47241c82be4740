//! Mock keyboard for unit and integration testing.
//!
//! # Why a mock keyboard?
//!
//! `WindowsKeyboard` calls `SendInput`, which types into whatever window has
//! focus on the test machine and cannot be observed from Rust test code.
//! `MockKeyboard` replaces every OS call with in-memory recording.  Each
//! synthesized event is pushed into a `Mutex<Vec<...>>` so assertions can
//! inspect exactly what was emitted and in what order.
//!
//! # Usage in tests
//!
//! ```ignore
//! let kb = Arc::new(MockKeyboard::new().with_key('á', KeyStroke::new(0xDE, ModifierMask::NONE)));
//! let policy = DispatchPolicy::new(Arc::clone(&kb) as Arc<dyn PlatformKeyboard>, map);
//!
//! policy.send('á');
//!
//! assert_eq!(kb.virtual_keys(), vec![(0xDE, false), (0xDE, true)]);
//! ```

use std::collections::HashMap;
use std::sync::Mutex;

use vkb_core::{KeyStroke, ModifierMask};

use crate::application::inject_char::PlatformKeyboard;

/// One event recorded by [`MockKeyboard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyboardEvent {
    /// Key-down + key-up of one UTF-16 unit.
    UnicodeTap(u16),
    /// A single virtual-key transition.
    VirtualKey { vk: u8, key_up: bool },
}

/// A keyboard that records all calls without performing OS API calls.
#[derive(Default)]
pub struct MockKeyboard {
    /// Every event, in emission order.
    pub events: Mutex<Vec<KeyboardEvent>>,
    layout: HashMap<char, KeyStroke>,
}

impl MockKeyboard {
    /// Creates a keyboard with an empty layout; every `scan_char` fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a keyboard whose layout covers lowercase and uppercase ASCII
    /// letters and digits, US style.
    pub fn us_letters() -> Self {
        let mut kb = Self::new();
        for (i, lower) in ('a'..='z').enumerate() {
            let vk = 0x41 + i as u8;
            kb.layout.insert(lower, KeyStroke::new(vk, ModifierMask::NONE));
            kb.layout
                .insert(lower.to_ascii_uppercase(), KeyStroke::new(vk, ModifierMask::SHIFT));
        }
        for (i, digit) in ('0'..='9').enumerate() {
            kb.layout
                .insert(digit, KeyStroke::new(0x30 + i as u8, ModifierMask::NONE));
        }
        kb.layout.insert(' ', KeyStroke::new(0x20, ModifierMask::NONE));
        kb
    }

    /// Adds (or replaces) one layout entry.
    pub fn with_key(mut self, ch: char, stroke: KeyStroke) -> Self {
        self.layout.insert(ch, stroke);
        self
    }

    /// The UTF-16 units tapped so far.
    pub fn unicode_units(&self) -> Vec<u16> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                KeyboardEvent::UnicodeTap(unit) => Some(*unit),
                KeyboardEvent::VirtualKey { .. } => None,
            })
            .collect()
    }

    /// The virtual-key transitions sent so far, as `(vk, key_up)`.
    pub fn virtual_keys(&self) -> Vec<(u8, bool)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                KeyboardEvent::VirtualKey { vk, key_up } => Some((*vk, *key_up)),
                KeyboardEvent::UnicodeTap(_) => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl PlatformKeyboard for MockKeyboard {
    fn tap_unicode_unit(&self, unit: u16) {
        self.events.lock().unwrap().push(KeyboardEvent::UnicodeTap(unit));
    }

    fn send_virtual_key(&self, vk: u8, key_up: bool) {
        self.events
            .lock()
            .unwrap()
            .push(KeyboardEvent::VirtualKey { vk, key_up });
    }

    fn scan_char(&self, ch: char) -> Option<KeyStroke> {
        self.layout.get(&ch).copied()
    }
}
