//! Key encoding helpers shared by the injection adapters.
//!
//! - [`utf16`] splits a character into the UTF-16 units sent by direct
//!   code-point injection.
//! - [`layout_scan`] decodes `VkKeyScanW` results and orders the virtual-key
//!   events that replay a character through the active keyboard layout.

pub mod layout_scan;
pub mod utf16;

pub use layout_scan::{KeyStroke, ModifierMask, VkEvent};
pub use utf16::Utf16Units;
