//! Windows keyboard synthesis via the SendInput API.
//!
//! Direct injection sends `KEYEVENTF_UNICODE` events with virtual key 0 and
//! the UTF-16 unit in `wScan`.  Layout replay looks characters up with
//! `VkKeyScanW` and sends ordinary virtual-key events, with the hardware scan
//! code filled in via `MapVirtualKeyW` so that applications reading scan
//! codes (remote-desktop clients in particular) see a plausible key.

#![cfg(target_os = "windows")]

use vkb_core::KeyStroke;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    MapVirtualKeyW, SendInput, VkKeyScanW, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT,
    KEYBD_EVENT_FLAGS, KEYEVENTF_KEYUP, KEYEVENTF_UNICODE, MAPVK_VK_TO_VSC, VIRTUAL_KEY,
};

use crate::application::inject_char::PlatformKeyboard;

/// Windows implementation of [`PlatformKeyboard`] using SendInput.
pub struct WindowsKeyboard;

impl WindowsKeyboard {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsKeyboard {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformKeyboard for WindowsKeyboard {
    fn tap_unicode_unit(&self, unit: u16) {
        send_keyboard_input(0, unit, KEYEVENTF_UNICODE);
        send_keyboard_input(0, unit, KEYEVENTF_UNICODE | KEYEVENTF_KEYUP);
    }

    fn send_virtual_key(&self, vk: u8, key_up: bool) {
        // SAFETY: MapVirtualKeyW is a pure lookup against the active layout
        let scan = unsafe { MapVirtualKeyW(vk as u32, MAPVK_VK_TO_VSC) } as u16;
        let flags = if key_up {
            KEYEVENTF_KEYUP
        } else {
            KEYBD_EVENT_FLAGS(0)
        };
        send_keyboard_input(vk as u16, scan, flags);
    }

    fn scan_char(&self, ch: char) -> Option<KeyStroke> {
        // VkKeyScanW only accepts a single UTF-16 unit
        let unit = u16::try_from(ch as u32).ok()?;
        // SAFETY: VkKeyScanW is a pure lookup against the active layout
        let raw = unsafe { VkKeyScanW(unit) };
        KeyStroke::from_scan_result(raw)
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn send_keyboard_input(vk: u16, scan: u16, flags: KEYBD_EVENT_FLAGS) {
    let input = INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(vk),
                wScan: scan,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    };
    // SAFETY: input is a valid KEYBDINPUT structure on the stack
    let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
    if sent == 0 {
        tracing::warn!(vk, scan, "SendInput was blocked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_char_rejects_supplementary_plane() {
        // No layout key can produce a surrogate pair
        let kb = WindowsKeyboard::new();
        assert_eq!(kb.scan_char('🚀'), None);
    }
}
