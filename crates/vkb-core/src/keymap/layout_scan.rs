//! Decoding `VkKeyScanW` results and ordering the key events that replay them.
//!
//! # What does `VkKeyScanW` return? (for beginners)
//!
//! Given a character, Windows looks it up in the active keyboard layout and
//! returns a 16-bit value:
//!
//! ```text
//!  15            8 7             0
//! ┌───────────────┬───────────────┐
//! │ shift state   │ virtual key   │
//! └───────────────┴───────────────┘
//! ```
//!
//! The shift-state byte is a bit mask: 1 = Shift, 2 = Control, 4 = Alt.  On a
//! Spanish layout, for example, `'@'` is AltGr+2, which Windows reports as
//! Control+Alt with VK `0x32`.  If the layout has no key for the character
//! both bytes are `0xFF` (the call returns `-1`).
//!
//! Replaying a stroke presses the modifiers in a fixed order (Shift, Control,
//! Alt), taps the key, and releases the modifiers in reverse order so no
//! modifier is left logically held.

/// `VK_SHIFT`
pub const VK_SHIFT: u8 = 0x10;
/// `VK_CONTROL`
pub const VK_CONTROL: u8 = 0x11;
/// `VK_MENU` (Alt)
pub const VK_MENU: u8 = 0x12;
/// `VK_RETURN`
pub const VK_RETURN: u8 = 0x0D;

/// Modifier mask taken from the high byte of a `VkKeyScanW` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ModifierMask(u8);

impl ModifierMask {
    pub const NONE: ModifierMask = ModifierMask(0);
    pub const SHIFT: ModifierMask = ModifierMask(0x01);
    pub const CONTROL: ModifierMask = ModifierMask(0x02);
    pub const ALT: ModifierMask = ModifierMask(0x04);

    /// Keeps only the three bits that map to a modifier key.
    ///
    /// Bits 3–5 (Hankaku and reserved) have no key to press and are ignored.
    pub fn from_bits(bits: u8) -> Self {
        ModifierMask(bits & 0x07)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: ModifierMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// Modifier virtual keys in press order: Shift, Control, Alt.
    pub fn virtual_keys(self) -> Vec<u8> {
        let mut keys = Vec::with_capacity(3);
        if self.contains(Self::SHIFT) {
            keys.push(VK_SHIFT);
        }
        if self.contains(Self::CONTROL) {
            keys.push(VK_CONTROL);
        }
        if self.contains(Self::ALT) {
            keys.push(VK_MENU);
        }
        keys
    }
}

impl std::ops::BitOr for ModifierMask {
    type Output = ModifierMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        ModifierMask(self.0 | rhs.0)
    }
}

/// A virtual key plus the modifiers required to produce one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyStroke {
    pub vk: u8,
    pub modifiers: ModifierMask,
}

/// One synthetic virtual-key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VkEvent {
    pub vk: u8,
    pub key_up: bool,
}

impl KeyStroke {
    pub fn new(vk: u8, modifiers: ModifierMask) -> Self {
        Self { vk, modifiers }
    }

    /// Decodes a raw `VkKeyScanW` result.
    ///
    /// Returns `None` when the layout cannot produce the character (both
    /// bytes `0xFF`).
    pub fn from_scan_result(raw: i16) -> Option<Self> {
        let raw = raw as u16;
        let vk = (raw & 0xFF) as u8;
        let shift_state = (raw >> 8) as u8;
        if vk == 0xFF && shift_state == 0xFF {
            return None;
        }
        Some(Self {
            vk,
            modifiers: ModifierMask::from_bits(shift_state),
        })
    }

    /// The full event sequence: modifier downs, key down, key up, modifier
    /// ups in reverse order.
    pub fn replay_sequence(&self) -> Vec<VkEvent> {
        let mods = self.modifiers.virtual_keys();
        let mut events = Vec::with_capacity(mods.len() * 2 + 2);
        events.extend(mods.iter().map(|&vk| VkEvent { vk, key_up: false }));
        events.push(VkEvent { vk: self.vk, key_up: false });
        events.push(VkEvent { vk: self.vk, key_up: true });
        events.extend(mods.iter().rev().map(|&vk| VkEvent { vk, key_up: true }));
        events
    }
}

/// Returns `true` if `vk` is one of the modifier keys replayed around a stroke.
pub fn is_modifier(vk: u8) -> bool {
    matches!(vk, VK_SHIFT | VK_CONTROL | VK_MENU)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_letter() {
        // 'a' on US layout: VK_A (0x41), no modifiers.
        let stroke = KeyStroke::from_scan_result(0x0041).unwrap();
        assert_eq!(stroke, KeyStroke::new(0x41, ModifierMask::NONE));
    }

    #[test]
    fn test_decode_shifted_letter() {
        let stroke = KeyStroke::from_scan_result(0x0141).unwrap();
        assert_eq!(stroke.vk, 0x41);
        assert_eq!(stroke.modifiers, ModifierMask::SHIFT);
    }

    #[test]
    fn test_decode_altgr_as_control_alt() {
        // '@' on a Spanish layout: Ctrl+Alt+2.
        let stroke = KeyStroke::from_scan_result(0x0632).unwrap();
        assert_eq!(stroke.vk, 0x32);
        assert!(stroke.modifiers.contains(ModifierMask::CONTROL));
        assert!(stroke.modifiers.contains(ModifierMask::ALT));
        assert!(!stroke.modifiers.contains(ModifierMask::SHIFT));
    }

    #[test]
    fn test_decode_minus_one_is_unrepresentable() {
        assert_eq!(KeyStroke::from_scan_result(-1), None);
    }

    #[test]
    fn test_replay_unmodified_key_is_down_then_up() {
        let events = KeyStroke::new(0x41, ModifierMask::NONE).replay_sequence();
        assert_eq!(
            events,
            vec![
                VkEvent { vk: 0x41, key_up: false },
                VkEvent { vk: 0x41, key_up: true },
            ]
        );
    }

    #[test]
    fn test_replay_presses_modifiers_in_order_and_releases_in_reverse() {
        // Arrange
        let all = ModifierMask::SHIFT | ModifierMask::CONTROL | ModifierMask::ALT;
        let stroke = KeyStroke::new(0x45, all);

        // Act
        let events = stroke.replay_sequence();

        // Assert
        let expected = vec![
            VkEvent { vk: VK_SHIFT, key_up: false },
            VkEvent { vk: VK_CONTROL, key_up: false },
            VkEvent { vk: VK_MENU, key_up: false },
            VkEvent { vk: 0x45, key_up: false },
            VkEvent { vk: 0x45, key_up: true },
            VkEvent { vk: VK_MENU, key_up: true },
            VkEvent { vk: VK_CONTROL, key_up: true },
            VkEvent { vk: VK_SHIFT, key_up: true },
        ];
        assert_eq!(events, expected);
    }

    #[test]
    fn test_replay_releases_every_modifier_it_presses() {
        let stroke = KeyStroke::new(0x32, ModifierMask::CONTROL | ModifierMask::ALT);
        let events = stroke.replay_sequence();
        let downs = events.iter().filter(|e| !e.key_up).count();
        let ups = events.iter().filter(|e| e.key_up).count();
        assert_eq!(downs, ups);
    }

    #[test]
    fn test_reserved_shift_bits_are_ignored() {
        let mask = ModifierMask::from_bits(0x39);
        assert_eq!(mask, ModifierMask::SHIFT);
    }

    #[test]
    fn test_is_modifier() {
        assert!(is_modifier(VK_SHIFT));
        assert!(is_modifier(VK_MENU));
        assert!(!is_modifier(0x41));
    }
}
