//! Domain entities for per-character keystroke injection.
//!
//! Pure data and rules with no OS dependencies, so every type here can be
//! tested on any platform.
//!
//! - [`method`] – the two injection strategies and the operator override.
//! - [`probe`] – the fixed calibration probe set.
//! - [`calibration`] – the character → method map and unresolved probes.
//! - [`environment`] – environment identifiers (host + local/remote session).
//! - [`playback`] – validated playback settings and stop reasons.

pub mod calibration;
pub mod environment;
pub mod method;
pub mod playback;
pub mod probe;
