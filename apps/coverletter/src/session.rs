//! Remembers the last resume and sample files between runs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::AppError;

pub const DEFAULT_STATE_FILE: &str = ".cover_letter_state.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    pub resume_path: Option<PathBuf>,
    pub sample_path: Option<PathBuf>,
}

impl SessionState {
    /// Loads the state file. Remembered paths that no longer exist are
    /// dropped and the file is rewritten without them.
    pub fn load(path: &Path) -> Self {
        let mut state: SessionState = match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Ignoring malformed session state {}: {e}", path.display());
                SessionState::default()
            }),
            Err(_) => return SessionState::default(),
        };

        let mut pruned = false;
        for slot in [&mut state.resume_path, &mut state.sample_path] {
            if let Some(p) = slot.as_ref().filter(|p| !p.exists()) {
                warn!("Remembered file {} no longer exists", p.display());
                *slot = None;
                pruned = true;
            }
        }
        if pruned {
            if let Err(e) = state.save(path) {
                warn!("Unable to rewrite session state: {e}");
            }
        }
        debug!("Session state: {state:?}");
        state
    }

    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to serialize session state: {e}"))
        })?;
        std::fs::write(path, json).map_err(|source| AppError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Records the files used for a successful run.
    pub fn remember(&mut self, resume: &Path, sample: Option<&Path>) {
        self.resume_path = Some(resume.to_path_buf());
        if let Some(sample) = sample {
            self.sample_path = Some(sample.to_path_buf());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load_keeps_existing_paths() {
        let dir = tempfile::tempdir().unwrap();
        let resume = dir.path().join("resume.pdf");
        std::fs::write(&resume, b"%PDF-1.4").unwrap();
        let state_file = dir.path().join("state.json");

        let mut state = SessionState::default();
        state.remember(&resume, None);
        state.save(&state_file).unwrap();

        assert_eq!(SessionState::load(&state_file), state);
    }

    #[test]
    fn test_load_drops_missing_paths_and_rewrites() {
        let dir = tempfile::tempdir().unwrap();
        let resume = dir.path().join("resume.txt");
        std::fs::write(&resume, "Jane").unwrap();
        let state_file = dir.path().join("state.json");

        SessionState {
            resume_path: Some(resume.clone()),
            sample_path: Some(dir.path().join("gone.txt")),
        }
        .save(&state_file)
        .unwrap();

        let loaded = SessionState::load(&state_file);
        assert_eq!(loaded.resume_path, Some(resume));
        assert_eq!(loaded.sample_path, None);

        let on_disk: SessionState =
            serde_json::from_str(&std::fs::read_to_string(&state_file).unwrap()).unwrap();
        assert_eq!(on_disk, loaded, "pruned state must be written back");
    }

    #[test]
    fn test_missing_or_malformed_file_gives_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            SessionState::load(&dir.path().join("absent.json")),
            SessionState::default()
        );
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "[1, 2").unwrap();
        assert_eq!(SessionState::load(&bad), SessionState::default());
    }

    #[test]
    fn test_remember_keeps_previous_sample() {
        let mut state = SessionState {
            resume_path: None,
            sample_path: Some(PathBuf::from("sample.txt")),
        };
        state.remember(Path::new("resume.pdf"), None);
        assert_eq!(state.resume_path, Some(PathBuf::from("resume.pdf")));
        assert_eq!(state.sample_path, Some(PathBuf::from("sample.txt")));
    }
}
