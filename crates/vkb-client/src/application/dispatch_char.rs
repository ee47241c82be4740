//! DispatchPolicy: chooses and applies an injection method per character.
//!
//! Resolution order for each character:
//!
//! 1. the operator's forced method, if one is set;
//! 2. the calibrated mapping for the current environment;
//! 3. direct code-point injection.
//!
//! Sending falls back exactly one level: if layout replay reports that the
//! character is unrepresentable, the character is sent with direct injection
//! instead.  Direct injection has no failure signal and is the last resort.
//!
//! # Concurrency
//!
//! The policy is shared between the playback task and the shell.  The
//! mapping sits behind an [`ArcSwap`] and is replaced wholesale after
//! calibration, so a reader sees either the old or the new mapping, never a
//! mix.  The override is a single atomic byte.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{debug, info};
use vkb_core::{CalibrationMap, InjectionMethod, MethodCounts, MethodOverride};

use super::inject_char::{inject_layout_replay, inject_unicode, press_enter, PlatformKeyboard};

const OVERRIDE_AUTO: u8 = 0;
const OVERRIDE_UNICODE: u8 = 1;
const OVERRIDE_LAYOUT: u8 = 2;

fn encode_override(value: MethodOverride) -> u8 {
    match value {
        MethodOverride::Auto => OVERRIDE_AUTO,
        MethodOverride::Force(InjectionMethod::Unicode) => OVERRIDE_UNICODE,
        MethodOverride::Force(InjectionMethod::LayoutReplay) => OVERRIDE_LAYOUT,
    }
}

fn decode_override(raw: u8) -> MethodOverride {
    match raw {
        OVERRIDE_UNICODE => MethodOverride::Force(InjectionMethod::Unicode),
        OVERRIDE_LAYOUT => MethodOverride::Force(InjectionMethod::LayoutReplay),
        _ => MethodOverride::Auto,
    }
}

/// What happened when a character was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// The method the policy chose.
    pub resolved: InjectionMethod,
    /// The method that actually emitted events.
    pub used: InjectionMethod,
}

impl Delivery {
    pub fn fell_back(&self) -> bool {
        self.resolved != self.used
    }
}

/// The process-wide dispatch state: active mapping plus operator override.
pub struct DispatchPolicy {
    keyboard: Arc<dyn PlatformKeyboard>,
    mapping: ArcSwap<CalibrationMap>,
    forced: AtomicU8,
}

impl DispatchPolicy {
    /// Creates a policy seeded with `mapping` and no override.
    pub fn new(keyboard: Arc<dyn PlatformKeyboard>, mapping: CalibrationMap) -> Self {
        Self {
            keyboard,
            mapping: ArcSwap::from_pointee(mapping),
            forced: AtomicU8::new(OVERRIDE_AUTO),
        }
    }

    /// Chooses the method for `ch`.  Always returns exactly one method.
    pub fn resolve_method(&self, ch: char) -> InjectionMethod {
        if let Some(forced) = self.override_mode().forced() {
            return forced;
        }
        self.mapping.load().method_for(ch)
    }

    /// Sends one character using the current policy.
    pub fn send(&self, ch: char) -> Delivery {
        let resolved = self.resolve_method(ch);
        let used = match resolved {
            InjectionMethod::LayoutReplay => match inject_layout_replay(self.keyboard.as_ref(), ch) {
                Ok(()) => InjectionMethod::LayoutReplay,
                Err(e) => {
                    debug!("{e}; falling back to direct injection");
                    inject_unicode(self.keyboard.as_ref(), ch);
                    InjectionMethod::Unicode
                }
            },
            InjectionMethod::Unicode => {
                inject_unicode(self.keyboard.as_ref(), ch);
                InjectionMethod::Unicode
            }
        };
        Delivery { resolved, used }
    }

    /// Sends a line break as the Enter key.
    pub fn send_enter(&self) {
        press_enter(self.keyboard.as_ref());
    }

    /// Sets (or clears, with [`MethodOverride::Auto`]) the forced method.
    pub fn set_override(&self, value: MethodOverride) {
        self.forced.store(encode_override(value), Ordering::SeqCst);
        info!(?value, "injection method override changed");
    }

    pub fn override_mode(&self) -> MethodOverride {
        decode_override(self.forced.load(Ordering::SeqCst))
    }

    /// Atomically replaces the active mapping.
    pub fn replace_mapping(&self, mapping: CalibrationMap) {
        let entries = mapping.len();
        self.mapping.store(Arc::new(mapping));
        info!(entries, "dispatch mapping replaced");
    }

    /// Snapshot of the active mapping.
    pub fn mapping(&self) -> Arc<CalibrationMap> {
        self.mapping.load_full()
    }

    pub fn method_counts(&self) -> MethodCounts {
        self.mapping.load().counts()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use vkb_core::{KeyStroke, ModifierMask, ProbeSet};

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

    fn make_policy(mapping: CalibrationMap) -> (DispatchPolicy, Arc<RecordingKeyboard>) {
        let mut kb = RecordingKeyboard::default();
        kb.layout.insert('a', KeyStroke::new(0x41, ModifierMask::NONE));
        kb.layout.insert('á', KeyStroke::new(0xDE, ModifierMask::NONE));
        let kb = Arc::new(kb);
        let policy = DispatchPolicy::new(Arc::clone(&kb) as Arc<dyn PlatformKeyboard>, mapping);
        (policy, kb)
    }

    #[test]
    fn test_resolve_defaults_to_unicode_for_unmapped_char() {
        let (policy, _) = make_policy(CalibrationMap::new());
        assert_eq!(policy.resolve_method('x'), InjectionMethod::Unicode);
    }

    #[test]
    fn test_resolve_uses_calibrated_mapping() {
        let map: CalibrationMap = [('á', InjectionMethod::LayoutReplay)].into_iter().collect();
        let (policy, _) = make_policy(map);

        assert_eq!(policy.resolve_method('á'), InjectionMethod::LayoutReplay);
        assert_eq!(policy.resolve_method('a'), InjectionMethod::Unicode);
    }

    #[test]
    fn test_forced_override_wins_over_mapping() {
        // Arrange
        let map: CalibrationMap = [('á', InjectionMethod::LayoutReplay)].into_iter().collect();
        let (policy, _) = make_policy(map);

        // Act
        policy.set_override(MethodOverride::Force(InjectionMethod::Unicode));

        // Assert
        assert_eq!(policy.resolve_method('á'), InjectionMethod::Unicode);
        policy.set_override(MethodOverride::Auto);
        assert_eq!(policy.resolve_method('á'), InjectionMethod::LayoutReplay);
    }

    #[test]
    fn test_resolve_is_total_over_probe_set() {
        let (policy, _) = make_policy(CalibrationMap::new());
        for mode in [
            MethodOverride::Auto,
            MethodOverride::Force(InjectionMethod::Unicode),
            MethodOverride::Force(InjectionMethod::LayoutReplay),
        ] {
            policy.set_override(mode);
            for ch in ProbeSet::standard().iter() {
                let method = policy.resolve_method(ch);
                assert!(matches!(
                    method,
                    InjectionMethod::Unicode | InjectionMethod::LayoutReplay
                ));
            }
        }
    }

    #[test]
    fn test_send_layout_replay_char_uses_virtual_keys() {
        let map: CalibrationMap = [('a', InjectionMethod::LayoutReplay)].into_iter().collect();
        let (policy, kb) = make_policy(map);

        let delivery = policy.send('a');

        assert!(!delivery.fell_back());
        assert_eq!(
            *kb.calls.lock().unwrap(),
            vec![Call::Vk(0x41, false), Call::Vk(0x41, true)]
        );
    }

    #[test]
    fn test_send_falls_back_to_unicode_when_unrepresentable() {
        // Arrange – '€' is mapped to layout replay but missing from the layout
        let map: CalibrationMap = [('€', InjectionMethod::LayoutReplay)].into_iter().collect();
        let (policy, kb) = make_policy(map);

        // Act
        let delivery = policy.send('€');

        // Assert
        assert_eq!(delivery.resolved, InjectionMethod::LayoutReplay);
        assert_eq!(delivery.used, InjectionMethod::Unicode);
        assert_eq!(*kb.calls.lock().unwrap(), vec![Call::Unicode(0x20AC)]);
    }

    #[test]
    fn test_forced_layout_replay_still_falls_back() {
        let (policy, kb) = make_policy(CalibrationMap::new());
        policy.set_override(MethodOverride::Force(InjectionMethod::LayoutReplay));

        let delivery = policy.send('🚀');

        assert!(delivery.fell_back());
        assert_eq!(
            *kb.calls.lock().unwrap(),
            vec![Call::Unicode(0xD83D), Call::Unicode(0xDE80)]
        );
    }

    #[test]
    fn test_replace_mapping_swaps_wholesale() {
        // Arrange
        let old: CalibrationMap = [
            ('a', InjectionMethod::LayoutReplay),
            ('b', InjectionMethod::LayoutReplay),
        ]
        .into_iter()
        .collect();
        let (policy, _) = make_policy(old);
        let snapshot = policy.mapping();

        // Act
        policy.replace_mapping([('a', InjectionMethod::Unicode)].into_iter().collect());

        // Assert – 'b' is gone, not merged; old snapshot is untouched
        assert_eq!(policy.resolve_method('a'), InjectionMethod::Unicode);
        assert_eq!(policy.mapping().get('b'), None);
        assert_eq!(snapshot.get('b'), Some(InjectionMethod::LayoutReplay));
    }

    #[test]
    fn test_method_counts_reflect_active_mapping() {
        let map: CalibrationMap = [
            ('a', InjectionMethod::Unicode),
            ('á', InjectionMethod::LayoutReplay),
        ]
        .into_iter()
        .collect();
        let (policy, _) = make_policy(map);

        let counts = policy.method_counts();

        assert_eq!(counts.unicode, 1);
        assert_eq!(counts.layout_replay, 1);
    }

    #[test]
    fn test_send_enter_presses_return() {
        let (policy, kb) = make_policy(CalibrationMap::new());
        policy.send_enter();
        assert_eq!(
            *kb.calls.lock().unwrap(),
            vec![Call::Vk(0x0D, false), Call::Vk(0x0D, true)]
        );
    }
}
