//! vkb-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does the virtual keyboard do? (for beginners)
//!
//! It types text into whatever window has focus by synthesizing keystrokes.
//! There are two ways to synthesize a character on Windows:
//!
//! - send its code point directly (`KEYEVENTF_UNICODE`), which works for any
//!   character but is mangled by some remote-desktop sessions;
//! - replay the key and modifiers the active keyboard layout uses for it,
//!   which survives remote sessions but only covers what the layout has.
//!
//! Which one works depends on the environment, so the keyboard:
//!
//! 1. Identifies the environment as `<host>_local` or `<host>_remoto`.
//! 2. Loads the calibration profile for exactly that environment.
//! 3. Optionally calibrates: types every probe character both ways into a
//!    capture window and records which way reproduced it.
//! 4. Types text character by character, each with its calibrated method,
//!    falling back to direct injection when the layout lacks a key.

/// Application layer: use cases and the traits they depend on.
pub mod application;

/// Infrastructure layer: OS adapters, storage and the shell bridge.
pub mod infrastructure;
