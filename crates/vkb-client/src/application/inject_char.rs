//! Injection primitives: direct code-point injection and layout replay.
//!
//! Both primitives sit on top of the [`PlatformKeyboard`] trait, which is the
//! only OS-facing seam.  The platform implementations live in the
//! infrastructure layer (`SendInput` on Windows, a recorder in tests).
//!
//! Direct injection has no failure signal: the OS accepts the events whether
//! or not the focused window ends up receiving the character, so it is treated
//! as assumed success and verified only by calibration.  Layout replay fails
//! explicitly when the active layout has no key for the character.

use thiserror::Error;
use vkb_core::keymap::layout_scan::VK_RETURN;
use vkb_core::{InjectionMethod, KeyStroke, Utf16Units};

/// Error type for injection primitives.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InjectionError {
    /// The active keyboard layout has no key (with any modifier combination)
    /// that produces this character.
    #[error("character {0:?} is not representable in the active keyboard layout")]
    Unrepresentable(char),
}

/// OS keyboard synthesis operations used by the primitives.
///
/// Implementations must be cheap to call repeatedly; every character typed
/// results in two to eight calls.
pub trait PlatformKeyboard: Send + Sync {
    /// Emits key-down followed by key-up for one UTF-16 code unit, tagged as
    /// raw Unicode input (virtual key 0).
    fn tap_unicode_unit(&self, unit: u16);

    /// Emits a single key-down or key-up for a virtual key.
    fn send_virtual_key(&self, vk: u8, key_up: bool);

    /// Resolves `ch` against the active keyboard layout.
    ///
    /// Returns `None` if the layout cannot produce it.
    fn scan_char(&self, ch: char) -> Option<KeyStroke>;
}

/// Types `ch` by sending its UTF-16 unit(s) directly.
///
/// Characters above U+FFFF are sent as a surrogate pair: two taps, high first.
pub fn inject_unicode(keyboard: &dyn PlatformKeyboard, ch: char) {
    for unit in Utf16Units::encode(ch).iter() {
        keyboard.tap_unicode_unit(unit);
    }
}

/// Types `ch` by replaying the key and modifiers the active layout maps it to.
///
/// # Errors
///
/// Returns [`InjectionError::Unrepresentable`] if the layout has no key for
/// `ch`.  Nothing is emitted in that case.
pub fn inject_layout_replay(keyboard: &dyn PlatformKeyboard, ch: char) -> Result<(), InjectionError> {
    let stroke = keyboard
        .scan_char(ch)
        .ok_or(InjectionError::Unrepresentable(ch))?;
    for event in stroke.replay_sequence() {
        keyboard.send_virtual_key(event.vk, event.key_up);
    }
    Ok(())
}

/// Types `ch` with exactly the given method, without any fallback.
///
/// # Errors
///
/// Only layout replay can fail; see [`inject_layout_replay`].
pub fn inject_with(
    keyboard: &dyn PlatformKeyboard,
    method: InjectionMethod,
    ch: char,
) -> Result<(), InjectionError> {
    match method {
        InjectionMethod::Unicode => {
            inject_unicode(keyboard, ch);
            Ok(())
        }
        InjectionMethod::LayoutReplay => inject_layout_replay(keyboard, ch),
    }
}

/// Presses and releases Enter.
pub fn press_enter(keyboard: &dyn PlatformKeyboard) {
    keyboard.send_virtual_key(VK_RETURN, false);
    keyboard.send_virtual_key(VK_RETURN, true);
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use vkb_core::keymap::layout_scan::{VK_MENU, VK_SHIFT, VK_CONTROL};
    use vkb_core::ModifierMask;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Unicode(u16),
        Vk(u8, bool),
    }

    #[derive(Default)]
    struct RecordingKeyboard {
        calls: Mutex<Vec<Call>>,
        layout: HashMap<char, KeyStroke>,
    }

    impl PlatformKeyboard for RecordingKeyboard {
        fn tap_unicode_unit(&self, unit: u16) {
            self.calls.lock().unwrap().push(Call::Unicode(unit));
        }

        fn send_virtual_key(&self, vk: u8, key_up: bool) {
            self.calls.lock().unwrap().push(Call::Vk(vk, key_up));
        }

        fn scan_char(&self, ch: char) -> Option<KeyStroke> {
            self.layout.get(&ch).copied()
        }
    }

    #[test]
    fn test_inject_unicode_bmp_char_taps_once() {
        // Arrange
        let kb = RecordingKeyboard::default();

        // Act
        inject_unicode(&kb, 'á');

        // Assert
        assert_eq!(*kb.calls.lock().unwrap(), vec![Call::Unicode(0x00E1)]);
    }

    #[test]
    fn test_inject_unicode_supplementary_char_taps_surrogate_pair() {
        // Arrange
        let kb = RecordingKeyboard::default();

        // Act – U+1F4CB CLIPBOARD
        inject_unicode(&kb, '📋');

        // Assert – v = 0xF4CB; high = 0xD800 + 0x3D; low = 0xDC00 + 0xCB
        assert_eq!(
            *kb.calls.lock().unwrap(),
            vec![Call::Unicode(0xD83D), Call::Unicode(0xDCCB)]
        );
    }

    #[test]
    fn test_inject_layout_replay_wraps_key_in_modifiers() {
        // Arrange
        let mut kb = RecordingKeyboard::default();
        kb.layout
            .insert('@', KeyStroke::new(0x32, ModifierMask::CONTROL | ModifierMask::ALT));

        // Act
        inject_layout_replay(&kb, '@').unwrap();

        // Assert
        assert_eq!(
            *kb.calls.lock().unwrap(),
            vec![
                Call::Vk(VK_CONTROL, false),
                Call::Vk(VK_MENU, false),
                Call::Vk(0x32, false),
                Call::Vk(0x32, true),
                Call::Vk(VK_MENU, true),
                Call::Vk(VK_CONTROL, true),
            ]
        );
    }

    #[test]
    fn test_inject_layout_replay_unrepresentable_emits_nothing() {
        let kb = RecordingKeyboard::default();

        let result = inject_layout_replay(&kb, '€');

        assert_eq!(result, Err(InjectionError::Unrepresentable('€')));
        assert!(kb.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_inject_with_shifted_letter() {
        let mut kb = RecordingKeyboard::default();
        kb.layout.insert('Z', KeyStroke::new(0x5A, ModifierMask::SHIFT));

        inject_with(&kb, InjectionMethod::LayoutReplay, 'Z').unwrap();

        let calls = kb.calls.lock().unwrap();
        assert_eq!(calls.first(), Some(&Call::Vk(VK_SHIFT, false)));
        assert_eq!(calls.last(), Some(&Call::Vk(VK_SHIFT, true)));
    }

    #[test]
    fn test_press_enter_sends_return_down_and_up() {
        let kb = RecordingKeyboard::default();

        press_enter(&kb);

        assert_eq!(
            *kb.calls.lock().unwrap(),
            vec![Call::Vk(VK_RETURN, false), Call::Vk(VK_RETURN, true)]
        );
    }
}
