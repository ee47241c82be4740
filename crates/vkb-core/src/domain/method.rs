//! Injection method tags and the operator's method override.
//!
//! # Two ways to type a character (for beginners)
//!
//! Windows can synthesise keyboard input in two fundamentally different ways:
//!
//! | Method          | How it works                                            | Weakness                              |
//! |-----------------|---------------------------------------------------------|---------------------------------------|
//! | `Unicode`       | Sends the raw UTF-16 code unit(s) of the character.     | Silently dropped in some RDP sessions |
//! | `LayoutReplay`  | Presses the physical keys (plus Shift/Ctrl/Alt) that the active layout maps to the character. | Fails for characters the layout cannot produce |
//!
//! Neither works everywhere, so every character is assigned one of them by
//! calibration.  The on-disk tags (`"unicode"` / `"vkscan"`) are kept stable so
//! that profiles written by older releases still load.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The two low-level strategies for synthesising a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InjectionMethod {
    /// Direct code-point injection (`KEYEVENTF_UNICODE`).
    #[serde(rename = "unicode")]
    Unicode,
    /// Virtual-key + modifier replay resolved against the active layout.
    #[serde(rename = "vkscan")]
    LayoutReplay,
}

impl InjectionMethod {
    /// The method every character falls back to when nothing better is known.
    pub const DEFAULT: InjectionMethod = InjectionMethod::Unicode;

    /// Returns the stable tag used in profile files and status lines.
    pub fn as_tag(self) -> &'static str {
        match self {
            InjectionMethod::Unicode => "unicode",
            InjectionMethod::LayoutReplay => "vkscan",
        }
    }
}

impl Default for InjectionMethod {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for InjectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Error returned when a method tag cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown injection method '{0}' (expected 'auto', 'unicode' or 'vkscan')")]
pub struct UnknownMethodTag(pub String);

impl FromStr for InjectionMethod {
    type Err = UnknownMethodTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "unicode" => Ok(InjectionMethod::Unicode),
            "vkscan" => Ok(InjectionMethod::LayoutReplay),
            other => Err(UnknownMethodTag(other.to_string())),
        }
    }
}

/// Tri-state operator override of the per-character policy.
///
/// `Auto` defers to the calibrated mapping; `Force(m)` sends every character
/// with `m` regardless of calibration.  The override is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MethodOverride {
    #[default]
    Auto,
    Force(InjectionMethod),
}

impl MethodOverride {
    /// Returns the forced method, if any.
    pub fn forced(self) -> Option<InjectionMethod> {
        match self {
            MethodOverride::Auto => None,
            MethodOverride::Force(m) => Some(m),
        }
    }
}

impl From<Option<InjectionMethod>> for MethodOverride {
    fn from(value: Option<InjectionMethod>) -> Self {
        value.map_or(MethodOverride::Auto, MethodOverride::Force)
    }
}

impl FromStr for MethodOverride {
    type Err = UnknownMethodTag;

    /// Parses the selector values offered to the operator: `auto`, `unicode`, `vkscan`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "auto" => Ok(MethodOverride::Auto),
            other => other.parse::<InjectionMethod>().map(MethodOverride::Force),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_method_is_unicode() {
        assert_eq!(InjectionMethod::default(), InjectionMethod::Unicode);
    }

    #[test]
    fn test_methods_serialize_with_legacy_tags() {
        // Arrange / Act
        let unicode = serde_json::to_string(&InjectionMethod::Unicode).unwrap();
        let replay = serde_json::to_string(&InjectionMethod::LayoutReplay).unwrap();

        // Assert
        assert_eq!(unicode, "\"unicode\"");
        assert_eq!(replay, "\"vkscan\"");
    }

    #[test]
    fn test_unknown_tag_fails_to_deserialize() {
        let result: Result<InjectionMethod, _> = serde_json::from_str("\"sendkeys\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_override_selector_values() {
        assert_eq!("auto".parse::<MethodOverride>(), Ok(MethodOverride::Auto));
        assert_eq!(
            "unicode".parse::<MethodOverride>(),
            Ok(MethodOverride::Force(InjectionMethod::Unicode))
        );
        assert_eq!(
            " vkscan ".parse::<MethodOverride>(),
            Ok(MethodOverride::Force(InjectionMethod::LayoutReplay))
        );
        assert!("fast".parse::<MethodOverride>().is_err());
    }

    #[test]
    fn test_override_from_option() {
        assert_eq!(MethodOverride::from(None), MethodOverride::Auto);
        assert_eq!(
            MethodOverride::from(Some(InjectionMethod::LayoutReplay)).forced(),
            Some(InjectionMethod::LayoutReplay)
        );
    }
}
