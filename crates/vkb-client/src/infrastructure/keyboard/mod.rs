//! Platform implementations of [`PlatformKeyboard`].
//!
//! The real implementation is selected at compile time via
//! `#[cfg(target_os = ...)]`.  Only Windows has one; on other targets the
//! binary runs against the simulated desktop in `infrastructure::capture`.
//!
//! [`PlatformKeyboard`]: crate::application::inject_char::PlatformKeyboard

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;
