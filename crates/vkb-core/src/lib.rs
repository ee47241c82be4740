//! # vkb-core
//!
//! Shared domain library for the virtual keyboard: injection method tags,
//! the calibration probe set, calibration maps and reports, environment
//! identifiers, playback settings, and the key encodings used by the
//! injection adapters.
//!
//! It has no dependency on OS APIs, so it builds and tests on any platform.
//!
//! # Architecture overview (for beginners)
//!
//! The virtual keyboard types text into whichever window has focus.  Windows
//! offers two ways to synthesise a character and neither works everywhere:
//! direct Unicode injection is dropped by some remote-desktop sessions, and
//! layout replay cannot produce characters missing from the active layout.
//! Calibration types every probe character into a capture window with both
//! methods and remembers, per environment, which one produced the right
//! character.
//!
//! This crate defines the vocabulary for that process:
//!
//! - **`domain`** – methods, probes, maps, environment ids, playback settings.
//! - **`keymap`** – UTF-16 surrogate splitting and `VkKeyScanW` decoding.

pub mod domain;
pub mod keymap;

// Re-export the most-used types at the crate root so callers can write
// `vkb_core::InjectionMethod` instead of `vkb_core::domain::method::InjectionMethod`.
pub use domain::calibration::{CalibrationMap, CalibrationReport, MethodCounts, UnresolvedProbe};
pub use domain::environment::{EnvironmentId, SessionKind};
pub use domain::method::{InjectionMethod, MethodOverride};
pub use domain::playback::{Keystroke, PlaybackSettings, SettingsError, StopReason};
pub use domain::probe::ProbeSet;
pub use keymap::{KeyStroke, ModifierMask, Utf16Units, VkEvent};
