//! Capture surfaces used by calibration.
//!
//! - **`windows`** – a small always-on-top `EDIT` window that receives the
//!   probe keystrokes and is read back with `GetWindowTextW`.
//! - **`simulated`** – an in-memory desktop that acts as both the keyboard and
//!   the capture surface.  Used by tests and by the headless binary on
//!   targets without a native keyboard backend.

pub mod simulated;

#[cfg(target_os = "windows")]
pub mod windows;
