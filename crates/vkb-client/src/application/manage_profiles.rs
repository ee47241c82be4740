//! Profile management: loading the active calibration at startup and
//! persisting new calibrations.
//!
//! Two kinds of records exist:
//!
//! - **Environment profiles**, one per [`EnvironmentId`].  These are the
//!   authoritative source: a profile for `HOST_local` never overwrites or
//!   answers for `HOST_remoto`.
//! - **The legacy file**, a single mapping that always mirrors the most recent
//!   calibration from any environment.  It is only consulted when the current
//!   environment has no profile of its own.
//!
//! Writes are best-effort.  A failed write is reported as
//! [`PersistStatus::InMemoryOnly`]; the calibration stays usable for the
//! running process.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use vkb_core::{CalibrationMap, EnvironmentId};

/// Error type for profile storage operations.
#[derive(Debug, Error)]
pub enum ProfileStoreError {
    /// The platform data directory could not be determined.
    #[error("could not determine platform data directory")]
    NoPlatformDataDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing profile at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but is not a valid character → method mapping.
    #[error("malformed profile at {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    /// The mapping could not be serialized.
    #[error("failed to serialize profile: {0}")]
    Serialize(String),
}

/// Persistence backend for calibration maps.
///
/// `load_*` return `Ok(None)` when the record simply does not exist.
#[cfg_attr(test, mockall::automock)]
pub trait ProfileRepository: Send + Sync {
    /// Writes the profile for `env`, replacing any previous one.
    fn save_profile(&self, env: &EnvironmentId, map: &CalibrationMap) -> Result<(), ProfileStoreError>;

    /// Reads the profile for exactly `env`.
    fn load_profile(&self, env: &EnvironmentId) -> Result<Option<CalibrationMap>, ProfileStoreError>;

    /// Writes the legacy single-file mapping.
    fn save_legacy(&self, map: &CalibrationMap) -> Result<(), ProfileStoreError>;

    /// Reads the legacy single-file mapping.
    fn load_legacy(&self) -> Result<Option<CalibrationMap>, ProfileStoreError>;

    /// Lists the environments that have a stored profile.
    fn list_profiles(&self) -> Result<BTreeSet<EnvironmentId>, ProfileStoreError>;
}

/// Outcome of one best-effort write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersistStatus {
    Persisted,
    /// The write failed; the mapping only lives in memory.
    InMemoryOnly { reason: String },
}

impl PersistStatus {
    pub fn is_persisted(&self) -> bool {
        matches!(self, PersistStatus::Persisted)
    }

    fn from_result(result: Result<(), ProfileStoreError>, what: &str) -> Self {
        match result {
            Ok(()) => PersistStatus::Persisted,
            Err(e) => {
                warn!("could not persist {what}: {e}");
                PersistStatus::InMemoryOnly { reason: e.to_string() }
            }
        }
    }
}

/// Outcome of persisting one calibration (legacy file + environment profile).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistOutcome {
    pub legacy: PersistStatus,
    pub profile: PersistStatus,
}

impl PersistOutcome {
    pub fn fully_persisted(&self) -> bool {
        self.legacy.is_persisted() && self.profile.is_persisted()
    }

    /// Human-readable reasons for every failed write.
    pub fn warnings(&self) -> Vec<String> {
        [("legacy file", &self.legacy), ("environment profile", &self.profile)]
            .into_iter()
            .filter_map(|(what, status)| match status {
                PersistStatus::Persisted => None,
                PersistStatus::InMemoryOnly { reason } => Some(format!("{what} not saved: {reason}")),
            })
            .collect()
    }
}

/// The calibration found at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileLoad {
    /// A profile for exactly this environment.
    Exact(CalibrationMap),
    /// No profile for this environment; the legacy file (calibrated on some
    /// environment, possibly another one) was used instead.
    Legacy(CalibrationMap),
    /// Nothing usable on disk.
    Missing,
}

impl ProfileLoad {
    /// The mapping to seed the dispatch policy with (empty when missing).
    pub fn into_map(self) -> CalibrationMap {
        match self {
            ProfileLoad::Exact(map) | ProfileLoad::Legacy(map) => map,
            ProfileLoad::Missing => CalibrationMap::new(),
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, ProfileLoad::Exact(_))
    }
}

/// Application service wrapping a [`ProfileRepository`] with the startup
/// fallback rules and best-effort writes.
#[derive(Clone)]
pub struct ProfileService {
    repository: Arc<dyn ProfileRepository>,
}

impl ProfileService {
    pub fn new(repository: Arc<dyn ProfileRepository>) -> Self {
        Self { repository }
    }

    /// Loads the calibration for `env`, preferring its own profile and falling
    /// back to the legacy file only when no such profile is usable.
    ///
    /// Malformed or unreadable files count as absent.
    pub fn load_for(&self, env: &EnvironmentId) -> ProfileLoad {
        match self.repository.load_profile(env) {
            Ok(Some(map)) => {
                info!(environment = %env, entries = map.len(), "loaded environment profile");
                return ProfileLoad::Exact(map);
            }
            Ok(None) => {}
            Err(e) => warn!("ignoring unreadable profile for {env}: {e}"),
        }

        match self.repository.load_legacy() {
            Ok(Some(map)) => {
                warn!(environment = %env, "no profile for this environment; using legacy calibration");
                ProfileLoad::Legacy(map)
            }
            Ok(None) => ProfileLoad::Missing,
            Err(e) => {
                warn!("ignoring unreadable legacy calibration: {e}");
                ProfileLoad::Missing
            }
        }
    }

    /// Returns `true` if `env` has a readable profile of its own.
    pub fn has_profile(&self, env: &EnvironmentId) -> bool {
        matches!(self.repository.load_profile(env), Ok(Some(_)))
    }

    /// Writes `map` as both the legacy file and the profile for `env`.
    pub fn persist_calibration(&self, env: &EnvironmentId, map: &CalibrationMap) -> PersistOutcome {
        let legacy = PersistStatus::from_result(self.repository.save_legacy(map), "legacy calibration");
        let profile = PersistStatus::from_result(
            self.repository.save_profile(env, map),
            "environment profile",
        );
        PersistOutcome { legacy, profile }
    }

    /// Lists known environments; an unreadable store lists nothing.
    pub fn list_known(&self) -> BTreeSet<EnvironmentId> {
        self.repository.list_profiles().unwrap_or_else(|e| {
            warn!("could not list calibration profiles: {e}");
            BTreeSet::new()
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
