//! Keyboard calibration: learn, per character, which injection method the
//! current environment honours.
//!
//! # How calibration works (for beginners)
//!
//! A small text box (the *capture surface*) takes keyboard focus.  For every
//! probe character, in a fixed order:
//!
//! ```text
//!   clear box ─► direct injection ─► settle ─► read ── matches? ──► Unicode
//!                                                 │ no
//!   clear box ─► layout replay    ─► settle ─► read ── matches? ──► LayoutReplay
//!                                                 │ no
//!                                   Unicode + record as unresolved
//! ```
//!
//! Synthetic input is delivered asynchronously, so each attempt waits for the
//! surface to settle before reading it back.  Reading too early would
//! disqualify a method that actually works.
//!
//! Probes are never tried concurrently: with two characters in flight the
//! read-back could not be attributed to either.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};
use vkb_core::domain::probe::describe_probe;
use vkb_core::{CalibrationMap, CalibrationReport, InjectionMethod, ProbeSet, UnresolvedProbe};

use super::dispatch_char::DispatchPolicy;
use super::identify_environment::Environment;
use super::inject_char::{inject_with, PlatformKeyboard};
use super::manage_profiles::{PersistOutcome, ProfileService};

/// Error type for capture-surface operations.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The capture window could not be created or focused.
    #[error("could not open capture surface: {0}")]
    Open(String),
}

/// A focused text target whose contents can be read back.
///
/// Implementations are driven from a single thread; the Windows
/// implementation owns a native window and must be used on the thread that
/// created it.
pub trait CaptureSurface {
    /// Opens and focuses the surface.  Called once before the first probe.
    fn prepare(&mut self) -> Result<(), CaptureError>;

    /// Empties the surface.
    fn clear(&mut self);

    /// Returns the current contents.
    fn read(&mut self) -> String;

    /// Waits `duration` while letting pending input reach the surface.
    fn settle(&mut self, duration: Duration);

    /// Closes the surface.  Called once after the last probe.
    fn close(&mut self);
}

/// Settle delays budgeted around every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationTiming {
    /// Once, after the surface opens, before the first probe.
    pub warmup: Duration,
    /// After clearing, before injecting.
    pub settle_before: Duration,
    /// After injecting, before reading back.
    pub settle_after: Duration,
}

impl CalibrationTiming {
    /// No waiting at all; for simulated surfaces that deliver synchronously.
    pub const IMMEDIATE: CalibrationTiming = CalibrationTiming {
        warmup: Duration::ZERO,
        settle_before: Duration::ZERO,
        settle_after: Duration::ZERO,
    };
}

impl Default for CalibrationTiming {
    fn default() -> Self {
        Self {
            warmup: Duration::from_millis(400),
            settle_before: Duration::from_millis(30),
            settle_after: Duration::from_millis(60),
        }
    }
}

/// Progress notification sent before each probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationProgress {
    /// 1-based position of the probe.
    pub index: usize,
    pub total: usize,
    pub character: char,
}

impl CalibrationProgress {
    /// `[3/127] Probing 'c'  U+0063`
    pub fn message(&self) -> String {
        format!(
            "[{}/{}] Probing {}",
            self.index,
            self.total,
            describe_probe(self.character)
        )
    }
}

/// Runs the probe loop against a capture surface.
pub struct CalibrationEngine<'a> {
    keyboard: &'a dyn PlatformKeyboard,
    timing: CalibrationTiming,
}

impl<'a> CalibrationEngine<'a> {
    pub fn new(keyboard: &'a dyn PlatformKeyboard, timing: CalibrationTiming) -> Self {
        Self { keyboard, timing }
    }

    /// Probes every character of `probes` in order and builds the report.
    ///
    /// `progress` is called before each probe; it must not block.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError`] if the surface cannot be opened.  Once the
    /// loop has started it always runs to completion.
    pub fn run(
        &self,
        surface: &mut dyn CaptureSurface,
        probes: &ProbeSet,
        progress: &mut dyn FnMut(&CalibrationProgress),
    ) -> Result<CalibrationReport, CaptureError> {
        surface.prepare()?;
        surface.settle(self.timing.warmup);

        let total = probes.len();
        let mut report = CalibrationReport::default();

        for (i, ch) in probes.iter().enumerate() {
            progress(&CalibrationProgress { index: i + 1, total, character: ch });

            let (unicode_ok, unicode_capture) = self.attempt(surface, InjectionMethod::Unicode, ch);
            if unicode_ok {
                report.map.insert(ch, InjectionMethod::Unicode);
                continue;
            }

            let (layout_ok, layout_capture) = self.attempt(surface, InjectionMethod::LayoutReplay, ch);
            if layout_ok {
                report.map.insert(ch, InjectionMethod::LayoutReplay);
                continue;
            }

            warn!(
                "no method reproduced {}: unicode gave {:?}, vkscan gave {:?}",
                describe_probe(ch),
                unicode_capture,
                layout_capture
            );
            report.map.insert(ch, InjectionMethod::DEFAULT);
            report.unresolved.push(UnresolvedProbe {
                character: ch,
                unicode_capture,
                layout_capture,
            });
        }

        surface.close();
        Ok(report)
    }

    /// One attempt: clear, inject, settle, read, clear.
    fn attempt(
        &self,
        surface: &mut dyn CaptureSurface,
        method: InjectionMethod,
        ch: char,
    ) -> (bool, String) {
        surface.clear();
        surface.settle(self.timing.settle_before);

        if let Err(e) = inject_with(self.keyboard, method, ch) {
            debug!("{method} attempt skipped: {e}");
        }
        surface.settle(self.timing.settle_after);

        let captured = surface.read();
        surface.clear();

        let mut chars = captured.chars();
        let ok = chars.next() == Some(ch) && chars.next().is_none();
        debug!(method = %method, ok, "probe {}: captured {:?}", describe_probe(ch), captured);
        (ok, captured)
    }
}

/// The result handed back to the shell after a calibration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationOutcome {
    pub report: CalibrationReport,
    pub persistence: PersistOutcome,
}

impl CalibrationOutcome {
    /// The mapping and unresolved list, as the shell interface returns them.
    pub fn into_parts(self) -> (CalibrationMap, Vec<UnresolvedProbe>) {
        (self.report.map, self.report.unresolved)
    }
}

/// The Calibrate Keyboard use case.
///
/// Runs the engine, persists the mapping as both the legacy file and the
/// current environment's profile, and swaps it into the dispatch policy.
pub struct CalibrateKeyboardUseCase {
    keyboard: Arc<dyn PlatformKeyboard>,
    profiles: ProfileService,
    policy: Arc<DispatchPolicy>,
    environment: Environment,
    timing: CalibrationTiming,
}

impl CalibrateKeyboardUseCase {
    pub fn new(
        keyboard: Arc<dyn PlatformKeyboard>,
        profiles: ProfileService,
        policy: Arc<DispatchPolicy>,
        environment: Environment,
        timing: CalibrationTiming,
    ) -> Self {
        Self {
            keyboard,
            profiles,
            policy,
            environment,
            timing,
        }
    }

    /// Calibrates `probes` and makes the result active.
    ///
    /// Persistence failures do not fail the run; they are reported in
    /// [`CalibrationOutcome::persistence`].
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError`] if the capture surface cannot be opened.
    pub fn calibrate(
        &self,
        surface: &mut dyn CaptureSurface,
        probes: &ProbeSet,
        progress: &mut dyn FnMut(&CalibrationProgress),
    ) -> Result<CalibrationOutcome, CaptureError> {
        info!(
            environment = %self.environment.id,
            probes = probes.len(),
            "calibration started"
        );
        let engine = CalibrationEngine::new(self.keyboard.as_ref(), self.timing);
        let report = engine.run(surface, probes, progress)?;

        let persistence = self
            .profiles
            .persist_calibration(&self.environment.id, &report.map);
        self.policy.replace_mapping(report.map.clone());

        info!("{}", report.summary(self.environment.id.as_str()));
        Ok(CalibrationOutcome { report, persistence })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
