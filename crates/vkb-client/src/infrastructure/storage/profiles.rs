//! JSON file store for calibration maps.
//!
//! Layout under the data directory:
//!
//! ```text
//! <data_dir>/
//! ├── calibration.json          legacy single-file mapping (last calibration)
//! └── profiles/
//!     ├── WS01_local.json
//!     └── WS01_remoto.json
//! ```
//!
//! Each file is a flat JSON object from a one-character string to a method
//! tag, written pretty-printed with non-ASCII characters kept literal:
//!
//! ```json
//! {
//!   "a": "unicode",
//!   "á": "vkscan"
//! }
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;
use vkb_core::{CalibrationMap, EnvironmentId};

use crate::application::manage_profiles::{ProfileRepository, ProfileStoreError};

/// File name of the legacy single-file mapping.
pub const LEGACY_FILE: &str = "calibration.json";
/// Sub-directory holding one file per environment.
pub const PROFILES_DIR: &str = "profiles";

/// [`ProfileRepository`] backed by JSON files in one directory.
#[derive(Debug, Clone)]
pub struct FileProfileStore {
    root: PathBuf,
}

impl FileProfileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn legacy_path(&self) -> PathBuf {
        self.root.join(LEGACY_FILE)
    }

    pub fn profiles_dir(&self) -> PathBuf {
        self.root.join(PROFILES_DIR)
    }

    /// Path of the profile for `env`, with file-name-unsafe characters replaced.
    pub fn profile_path(&self, env: &EnvironmentId) -> PathBuf {
        self.profiles_dir().join(format!("{}.json", env.file_stem()))
    }

    fn read_map(path: &Path) -> Result<Option<CalibrationMap>, ProfileStoreError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ProfileStoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let map: CalibrationMap =
            serde_json::from_str(&content).map_err(|e| ProfileStoreError::Malformed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        debug!(path = %path.display(), entries = map.len(), "read calibration file");
        Ok(Some(map))
    }

    fn write_map(path: &Path, map: &CalibrationMap) -> Result<(), ProfileStoreError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| ProfileStoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let content = serde_json::to_string_pretty(map)
            .map_err(|e| ProfileStoreError::Serialize(e.to_string()))?;
        std::fs::write(path, content).map_err(|source| ProfileStoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), entries = map.len(), "wrote calibration file");
        Ok(())
    }
}

impl ProfileRepository for FileProfileStore {
    fn save_profile(&self, env: &EnvironmentId, map: &CalibrationMap) -> Result<(), ProfileStoreError> {
        Self::write_map(&self.profile_path(env), map)
    }

    fn load_profile(&self, env: &EnvironmentId) -> Result<Option<CalibrationMap>, ProfileStoreError> {
        Self::read_map(&self.profile_path(env))
    }

    fn save_legacy(&self, map: &CalibrationMap) -> Result<(), ProfileStoreError> {
        Self::write_map(&self.legacy_path(), map)
    }

    fn load_legacy(&self) -> Result<Option<CalibrationMap>, ProfileStoreError> {
        Self::read_map(&self.legacy_path())
    }

    /// Lists environments by decoding each profile's file stem.
    fn list_profiles(&self) -> Result<BTreeSet<EnvironmentId>, ProfileStoreError> {
        let dir = self.profiles_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(source) => return Err(ProfileStoreError::Io { path: dir, source }),
        };

        let mut found = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|source| ProfileStoreError::Io {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                found.insert(EnvironmentId::from_file_stem(stem));
            }
        }
        Ok(found)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
