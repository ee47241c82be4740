//! Integration tests for the on-disk calibration format.
//!
//! Calibration files are flat JSON objects from a one-character string to a
//! method tag.  Files written by earlier releases must keep loading, so these
//! tests pin the exact shape through the public API.

use vkb_core::{CalibrationMap, InjectionMethod, ProbeSet, UnresolvedProbe};

/// A file as written by an earlier release, including an astral character.
const LEGACY_FILE: &str = r#"{
  " ": "unicode",
  "a": "unicode",
  "á": "vkscan",
  "@": "vkscan",
  "🚀": "unicode"
}"#;

#[test]
fn test_legacy_file_loads_with_expected_methods() {
    // Act
    let map: CalibrationMap = serde_json::from_str(LEGACY_FILE).expect("legacy file parses");

    // Assert
    assert_eq!(map.len(), 5);
    assert_eq!(map.get('á'), Some(InjectionMethod::LayoutReplay));
    assert_eq!(map.get('🚀'), Some(InjectionMethod::Unicode));
    assert_eq!(map.counts().layout_replay, 2);
}

#[test]
fn test_written_file_reloads_identically() {
    // Arrange
    let map: CalibrationMap = ProbeSet::standard()
        .iter()
        .map(|ch| (ch, InjectionMethod::Unicode))
        .collect();

    // Act
    let text = serde_json::to_string_pretty(&map).unwrap();
    let reloaded: CalibrationMap = serde_json::from_str(&text).unwrap();

    // Assert
    assert_eq!(reloaded, map);
    assert!(text.contains("\"ñ\""), "non-ASCII keys must stay literal");
}

#[test]
fn test_unknown_tag_or_long_key_is_rejected() {
    assert!(serde_json::from_str::<CalibrationMap>(r#"{"a": "sendkeys"}"#).is_err());
    assert!(serde_json::from_str::<CalibrationMap>(r#"{"ab": "unicode"}"#).is_err());
}

#[test]
fn test_unresolved_probe_serializes_both_captures() {
    let miss = UnresolvedProbe {
        character: '€',
        unicode_capture: "?".to_string(),
        layout_capture: String::new(),
    };

    let value = serde_json::to_value(&miss).unwrap();

    assert_eq!(value["character"], "€");
    assert_eq!(value["unicode_capture"], "?");
    assert_eq!(value["layout_capture"], "");
}
