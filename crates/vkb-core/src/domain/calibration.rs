//! Calibration results: the character → method mapping and unresolved probes.
//!
//! A [`CalibrationMap`] is what gets persisted per environment.  A
//! [`CalibrationReport`] is what one calibration run produces: the map plus
//! the probes neither method could reproduce, with what each method actually
//! typed so the operator can see why.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::method::InjectionMethod;

/// Character → injection method mapping.
///
/// Serialized as a flat JSON object keyed by the character itself, e.g.
/// `{"a": "unicode", "á": "vkscan"}`.  A `BTreeMap` keeps the file order
/// deterministic so two identical calibrations produce identical files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalibrationMap {
    entries: BTreeMap<char, InjectionMethod>,
}

/// How many characters of a map use each method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodCounts {
    pub unicode: usize,
    pub layout_replay: usize,
}

impl CalibrationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `method` for `ch`, replacing any previous decision.
    pub fn insert(&mut self, ch: char, method: InjectionMethod) {
        self.entries.insert(ch, method);
    }

    /// Returns the calibrated method for `ch`, if it was probed.
    pub fn get(&self, ch: char) -> Option<InjectionMethod> {
        self.entries.get(&ch).copied()
    }

    /// Returns the calibrated method for `ch`, or the safe default.
    pub fn method_for(&self, ch: char) -> InjectionMethod {
        self.get(ch).unwrap_or(InjectionMethod::DEFAULT)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, InjectionMethod)> + '_ {
        self.entries.iter().map(|(&c, &m)| (c, m))
    }

    pub fn counts(&self) -> MethodCounts {
        let mut counts = MethodCounts::default();
        for method in self.entries.values() {
            match method {
                InjectionMethod::Unicode => counts.unicode += 1,
                InjectionMethod::LayoutReplay => counts.layout_replay += 1,
            }
        }
        counts
    }
}

impl FromIterator<(char, InjectionMethod)> for CalibrationMap {
    fn from_iter<T: IntoIterator<Item = (char, InjectionMethod)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// A probe that neither method reproduced, with what each one produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedProbe {
    pub character: char,
    /// Capture-surface contents after direct code-point injection.
    pub unicode_capture: String,
    /// Capture-surface contents after layout replay (empty if the layout
    /// could not represent the character at all).
    pub layout_capture: String,
}

impl UnresolvedProbe {
    /// One warning line: `'€' -> unicode gave '', vkscan gave 'E'`.
    pub fn describe(&self) -> String {
        format!(
            "'{}' -> unicode gave '{}', vkscan gave '{}'",
            self.character, self.unicode_capture, self.layout_capture
        )
    }
}

/// The complete outcome of one calibration run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalibrationReport {
    pub map: CalibrationMap,
    pub unresolved: Vec<UnresolvedProbe>,
}

impl CalibrationReport {
    pub fn is_clean(&self) -> bool {
        self.unresolved.is_empty()
    }

    /// Status line shown after a run, e.g.
    /// `Calibration OK [HOST_local]: 90 unicode + 37 vkscan | 1 unresolved: '€'`.
    pub fn summary(&self, environment: &str) -> String {
        let counts = self.map.counts();
        let mut line = format!(
            "Calibration OK [{environment}]: {} unicode + {} vkscan",
            counts.unicode, counts.layout_replay
        );
        if !self.unresolved.is_empty() {
            let chars: Vec<String> = self
                .unresolved
                .iter()
                .map(|u| format!("'{}'", u.character))
                .collect();
            line.push_str(&format!(
                " | {} unresolved: {}",
                self.unresolved.len(),
                chars.join("  ")
            ));
        }
        line
    }
}
