//! Application layer use cases.
//!
//! # What use cases does the keyboard have?
//!
//! - **`inject_char`** – The two injection primitives (direct code-point
//!   injection and layout replay) expressed over the [`PlatformKeyboard`]
//!   trait.  The OS calls themselves live in `infrastructure::keyboard`.
//!
//! - **`identify_environment`** – Derives the `<host>_<local|remoto>` key that
//!   selects which calibration profile applies.
//!
//! - **`calibrate_keyboard`** – Probes every character with both methods
//!   against a capture surface and records which one reproduces it.
//!
//! - **`manage_profiles`** – Loads the profile for the current environment at
//!   startup and persists fresh calibrations, best-effort.
//!
//! - **`dispatch_char`** – The shared policy that picks a method per
//!   character, honouring the operator override and falling back once.
//!
//! - **`type_text`** – Paced, cancellable playback of a whole text body.
//!
//! [`PlatformKeyboard`]: inject_char::PlatformKeyboard

pub mod calibrate_keyboard;
pub mod dispatch_char;
pub mod identify_environment;
pub mod inject_char;
pub mod manage_profiles;
pub mod type_text;
