//! Playback settings and outcomes.
//!
//! The operator supplies the countdown and the inter-character speed as free
//! text; both are validated here, before any background work starts, so that
//! playback never begins with values it cannot honour.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for operator-supplied playback settings.
#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    /// The countdown is not a whole, non-negative number of seconds.
    #[error("countdown must be a whole number of seconds, got '{0}'")]
    InvalidDelay(String),

    /// The inter-character speed is not a number.
    #[error("speed must be a number of seconds between keys, got '{0}'")]
    InvalidSpeed(String),

    /// The inter-character speed is negative, infinite or NaN.
    #[error("speed must be a finite, non-negative number of seconds, got {0}")]
    NegativeSpeed(f64),

    /// The inter-character speed is too large to represent as a pause.
    #[error("speed of {0} seconds between keys is out of range")]
    SpeedOutOfRange(f64),
}

/// Validated playback settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSettings {
    /// Whole seconds to wait before the first character, giving the operator
    /// time to focus the destination window.
    pub countdown_secs: u32,
    /// Pause after each character.
    pub char_delay: Duration,
}

impl PlaybackSettings {
    pub const DEFAULT_COUNTDOWN_SECS: u32 = 3;
    pub const DEFAULT_CHAR_DELAY_SECS: f64 = 0.04;

    /// Parses the two operator fields.
    ///
    /// # Errors
    ///
    /// Returns a [`SettingsError`] describing the first invalid field.
    pub fn parse(countdown: &str, speed: &str) -> Result<Self, SettingsError> {
        let countdown_secs = countdown
            .trim()
            .parse::<u32>()
            .map_err(|_| SettingsError::InvalidDelay(countdown.to_string()))?;
        let speed_secs = speed
            .trim()
            .parse::<f64>()
            .map_err(|_| SettingsError::InvalidSpeed(speed.to_string()))?;
        Self::from_secs(countdown_secs, speed_secs)
    }

    /// Builds settings from already-numeric values.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::NegativeSpeed`] if `speed_secs` is negative or
    /// not finite, and [`SettingsError::SpeedOutOfRange`] if it does not fit in
    /// a [`Duration`].
    pub fn from_secs(countdown_secs: u32, speed_secs: f64) -> Result<Self, SettingsError> {
        if !speed_secs.is_finite() || speed_secs < 0.0 {
            return Err(SettingsError::NegativeSpeed(speed_secs));
        }
        let char_delay = Duration::try_from_secs_f64(speed_secs)
            .map_err(|_| SettingsError::SpeedOutOfRange(speed_secs))?;
        Ok(Self {
            countdown_secs,
            char_delay,
        })
    }
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            countdown_secs: Self::DEFAULT_COUNTDOWN_SECS,
            char_delay: Duration::from_secs_f64(Self::DEFAULT_CHAR_DELAY_SECS),
        }
    }
}

/// Why a playback run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Every character was sent.
    Completed,
    /// The cancellation flag was raised before the text was finished.
    Cancelled,
    /// The text was empty or only whitespace; nothing was sent.
    NothingToSend,
}

impl StopReason {
    pub fn message(self) -> &'static str {
        match self {
            StopReason::Completed => "Text typed successfully.",
            StopReason::Cancelled => "Stopped by the user.",
            StopReason::NothingToSend => "Nothing to type: the text is empty.",
        }
    }
}

/// One unit of playback work derived from the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keystroke {
    /// A line break, sent as the Enter key.
    Enter,
    /// Any other character, sent through the dispatch policy.
    Char(char),
}

/// Splits `text` into keystrokes: `\n` becomes Enter, `\r` is dropped so
/// CRLF input produces one line break.
pub fn keystrokes(text: &str) -> impl Iterator<Item = Keystroke> + '_ {
    text.chars().filter_map(|c| match c {
        '\r' => None,
        '\n' => Some(Keystroke::Enter),
        other => Some(Keystroke::Char(other)),
    })
}

/// Returns `true` when `text` has something worth typing.
pub fn has_content(text: &str) -> bool {
    !text.trim().is_empty()
}
