//! TypeTextUseCase: paced, cancellable playback of a text body.
//!
//! Playback is expected to run on a background task.  Cancellation is
//! cooperative: a shared flag is polled before every countdown tick, before
//! every character and before every inter-character delay.  A character that
//! has started is always finished, so no modifier key is ever left held.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use vkb_core::domain::playback::{has_content, keystrokes};
use vkb_core::{Keystroke, PlaybackSettings, StopReason};

use super::dispatch_char::DispatchPolicy;

/// Status notifications emitted during playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// Seconds left before typing starts.
    Countdown { remaining: u32 },
    /// The countdown finished; characters are being sent.
    Typing,
    /// Playback ended.
    Finished(StopReason),
}

impl PlaybackStatus {
    pub fn message(&self) -> String {
        match self {
            PlaybackStatus::Countdown { remaining } => {
                format!("Typing in {remaining} seconds... switch to the destination window!")
            }
            PlaybackStatus::Typing => "Typing...".to_string(),
            PlaybackStatus::Finished(reason) => reason.message().to_string(),
        }
    }
}

/// Sleeps between steps.  Abstracted so tests run instantly.
pub trait Pacer: Send + Sync {
    fn pause(&self, duration: Duration);
}

/// Pacer backed by `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Length of one countdown tick.
const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// The Type Text use case.
pub struct TypeTextUseCase {
    policy: Arc<DispatchPolicy>,
    pacer: Arc<dyn Pacer>,
}

impl TypeTextUseCase {
    pub fn new(policy: Arc<DispatchPolicy>, pacer: Arc<dyn Pacer>) -> Self {
        Self { policy, pacer }
    }

    /// Types `text` with `settings`, stopping early if `cancel` is raised.
    ///
    /// `on_status` receives every status change, ending with exactly one
    /// [`PlaybackStatus::Finished`].  The same stop reason is returned.
    pub fn run(
        &self,
        text: &str,
        settings: &PlaybackSettings,
        cancel: &AtomicBool,
        on_status: &mut dyn FnMut(PlaybackStatus),
    ) -> StopReason {
        let reason = self.play(text, settings, cancel, on_status);
        info!(?reason, "playback finished");
        on_status(PlaybackStatus::Finished(reason));
        reason
    }

    fn play(
        &self,
        text: &str,
        settings: &PlaybackSettings,
        cancel: &AtomicBool,
        on_status: &mut dyn FnMut(PlaybackStatus),
    ) -> StopReason {
        if !has_content(text) {
            return StopReason::NothingToSend;
        }

        for remaining in (1..=settings.countdown_secs).rev() {
            if cancel.load(Ordering::SeqCst) {
                return StopReason::Cancelled;
            }
            on_status(PlaybackStatus::Countdown { remaining });
            self.pacer.pause(COUNTDOWN_TICK);
        }

        on_status(PlaybackStatus::Typing);
        let mut sent = 0usize;
        for stroke in keystrokes(text) {
            if cancel.load(Ordering::SeqCst) {
                debug!(sent, "playback cancelled");
                return StopReason::Cancelled;
            }
            match stroke {
                Keystroke::Enter => self.policy.send_enter(),
                Keystroke::Char(ch) => {
                    self.policy.send(ch);
                }
            }
            sent += 1;

            if cancel.load(Ordering::SeqCst) {
                debug!(sent, "playback cancelled");
                return StopReason::Cancelled;
            }
            self.pacer.pause(settings.char_delay);
        }
        StopReason::Completed
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::inject_char::PlatformKeyboard;
    use std::sync::Mutex;
    use vkb_core::{CalibrationMap, KeyStroke};

    /// Records typed units and raises `cancel` after `cancel_after` taps.
    struct CountingKeyboard {
        units: Mutex<Vec<u16>>,
        vks: Mutex<Vec<(u8, bool)>>,
        cancel: Arc<AtomicBool>,
        cancel_after: Option<usize>,
    }

    impl CountingKeyboard {
        fn new(cancel: Arc<AtomicBool>, cancel_after: Option<usize>) -> Self {
            Self {
                units: Mutex::new(Vec::new()),
                vks: Mutex::new(Vec::new()),
                cancel,
                cancel_after,
            }
        }
    }

    impl PlatformKeyboard for CountingKeyboard {
        fn tap_unicode_unit(&self, unit: u16) {
            let mut units = self.units.lock().unwrap();
            units.push(unit);
            if Some(units.len()) == self.cancel_after {
                self.cancel.store(true, Ordering::SeqCst);
            }
        }

        fn send_virtual_key(&self, vk: u8, key_up: bool) {
            self.vks.lock().unwrap().push((vk, key_up));
        }

        fn scan_char(&self, _ch: char) -> Option<KeyStroke> {
            None
        }
    }

    #[derive(Default)]
    struct RecordingPacer {
        pauses: Mutex<Vec<Duration>>,
    }

    impl Pacer for RecordingPacer {
        fn pause(&self, duration: Duration) {
            self.pauses.lock().unwrap().push(duration);
        }
    }

    fn make_use_case(
        cancel_after: Option<usize>,
    ) -> (TypeTextUseCase, Arc<CountingKeyboard>, Arc<RecordingPacer>, Arc<AtomicBool>) {
        let cancel = Arc::new(AtomicBool::new(false));
        let kb = Arc::new(CountingKeyboard::new(Arc::clone(&cancel), cancel_after));
        let pacer = Arc::new(RecordingPacer::default());
        let policy = Arc::new(DispatchPolicy::new(
            Arc::clone(&kb) as Arc<dyn PlatformKeyboard>,
            CalibrationMap::new(),
        ));
        let uc = TypeTextUseCase::new(policy, Arc::clone(&pacer) as Arc<dyn Pacer>);
        (uc, kb, pacer, cancel)
    }

    fn instant() -> PlaybackSettings {
        PlaybackSettings::from_secs(0, 0.0).unwrap()
    }

    #[test]
    fn test_run_types_every_character_and_completes() {
        // Arrange
        let (uc, kb, _, cancel) = make_use_case(None);
        let mut statuses = Vec::new();

        // Act
        let reason = uc.run("hi", &instant(), &cancel, &mut |s| statuses.push(s));

        // Assert
        assert_eq!(reason, StopReason::Completed);
        assert_eq!(*kb.units.lock().unwrap(), vec![b'h' as u16, b'i' as u16]);
        assert_eq!(
            statuses,
            vec![PlaybackStatus::Typing, PlaybackStatus::Finished(StopReason::Completed)]
        );
    }

    #[test]
    fn test_run_with_blank_text_sends_nothing() {
        let (uc, kb, pacer, cancel) = make_use_case(None);

        let reason = uc.run("  \n ", &PlaybackSettings::default(), &cancel, &mut |_| {});

        assert_eq!(reason, StopReason::NothingToSend);
        assert!(kb.units.lock().unwrap().is_empty());
        assert!(pacer.pauses.lock().unwrap().is_empty());
    }

    #[test]
    fn test_run_counts_down_before_typing() {
        // Arrange
        let (uc, _, pacer, cancel) = make_use_case(None);
        let settings = PlaybackSettings::from_secs(2, 0.0).unwrap();
        let mut statuses = Vec::new();

        // Act
        uc.run("x", &settings, &cancel, &mut |s| statuses.push(s));

        // Assert
        assert_eq!(
            &statuses[..3],
            &[
                PlaybackStatus::Countdown { remaining: 2 },
                PlaybackStatus::Countdown { remaining: 1 },
                PlaybackStatus::Typing,
            ]
        );
        assert_eq!(pacer.pauses.lock().unwrap()[..2], [COUNTDOWN_TICK, COUNTDOWN_TICK]);
    }

    #[test]
    fn test_cancel_during_playback_stops_before_next_character() {
        // Arrange – flag raised while the second character is being typed
        let (uc, kb, _, cancel) = make_use_case(Some(2));

        // Act
        let reason = uc.run("abcdef", &instant(), &cancel, &mut |_| {});

        // Assert – 'b' completes, nothing after it is sent
        assert_eq!(reason, StopReason::Cancelled);
        assert_eq!(kb.units.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_cancel_mid_surrogate_pair_finishes_the_character() {
        // Flag raised after the high surrogate; the low surrogate must follow.
        let (uc, kb, _, cancel) = make_use_case(Some(1));

        let reason = uc.run("🚀🚀", &instant(), &cancel, &mut |_| {});

        assert_eq!(reason, StopReason::Cancelled);
        assert_eq!(*kb.units.lock().unwrap(), vec![0xD83D, 0xDE80]);
    }

    #[test]
    fn test_cancel_before_start_aborts_countdown() {
        let (uc, kb, _, cancel) = make_use_case(None);
        cancel.store(true, Ordering::SeqCst);

        let reason = uc.run("abc", &PlaybackSettings::default(), &cancel, &mut |_| {});

        assert_eq!(reason, StopReason::Cancelled);
        assert!(kb.units.lock().unwrap().is_empty());
    }

    #[test]
    fn test_newline_is_sent_as_enter() {
        let (uc, kb, _, cancel) = make_use_case(None);

        uc.run("a\r\nb", &instant(), &cancel, &mut |_| {});

        assert_eq!(*kb.vks.lock().unwrap(), vec![(0x0D, false), (0x0D, true)]);
        assert_eq!(kb.units.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_char_delay_applied_after_each_character() {
        let (uc, _, pacer, cancel) = make_use_case(None);
        let settings = PlaybackSettings::from_secs(0, 0.04).unwrap();

        uc.run("abc", &settings, &cancel, &mut |_| {});

        assert_eq!(*pacer.pauses.lock().unwrap(), vec![settings.char_delay; 3]);
    }

    #[test]
    fn test_status_messages() {
        assert_eq!(
            PlaybackStatus::Countdown { remaining: 3 }.message(),
            "Typing in 3 seconds... switch to the destination window!"
        );
        assert_eq!(
            PlaybackStatus::Finished(StopReason::Cancelled).message(),
            "Stopped by the user."
        );
    }
}
