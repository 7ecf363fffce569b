//! Session profile metadata.
//!
//! The browser owns the user-data directory itself; authflow only records a
//! small sidecar file marking whether the profile holds an authenticated
//! session that a later `--resume` run may reuse.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

pub const PROFILE_METADATA_FILE: &str = "authflow-profile.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionProfile {
    #[serde(default)]
    pub resumable: bool,
    #[serde(default)]
    pub last_authenticated: Option<DateTime<Utc>>,
}

impl SessionProfile {
    pub fn authenticated_now() -> Self {
        Self {
            resumable: true,
            last_authenticated: Some(Utc::now()),
        }
    }

    /// Load profile metadata from a user-data directory. A missing or
    /// unreadable file is treated as "no resumable session".
    pub fn load(user_data_dir: &Path) -> Option<Self> {
        let path = user_data_dir.join(PROFILE_METADATA_FILE);
        if !path.exists() {
            return None;
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(profile) => Some(profile),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "ignoring corrupt profile metadata");
                    None
                }
            },
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read profile metadata");
                None
            }
        }
    }

    pub fn save(&self, user_data_dir: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(user_data_dir)?;
        let path = user_data_dir.join(PROFILE_METADATA_FILE);
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_metadata_is_not_resumable() {
        let dir = tempdir().unwrap();
        assert!(SessionProfile::load(dir.path()).is_none());
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let profile = SessionProfile::authenticated_now();
        profile.save(dir.path()).unwrap();

        let loaded = SessionProfile::load(dir.path()).unwrap();
        assert!(loaded.resumable);
        assert!(loaded.last_authenticated.is_some());
    }

    #[test]
    fn corrupt_metadata_is_ignored() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(PROFILE_METADATA_FILE), "{not json").unwrap();
        assert!(SessionProfile::load(dir.path()).is_none());
    }
}
