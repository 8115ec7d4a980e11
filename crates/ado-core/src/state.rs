use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::library::SongFilter;
use super::platform;

/// UI preferences remembered between runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistentState {
    #[serde(default)]
    pub volume: Option<f32>,
    #[serde(default)]
    pub filter: SongFilter,
}

impl Default for PersistentState {
    fn default() -> Self {
        Self {
            volume: None,
            filter: SongFilter::All,
        }
    }
}

impl PersistentState {
    pub fn state_path() -> PathBuf {
        platform::data_dir().join("state.json")
    }

    pub fn load() -> Self {
        Self::load_from(&Self::state_path())
    }

    /// Missing or unreadable state falls back to defaults.
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::state_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_and_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        assert_eq!(PersistentState::load_from(&path), PersistentState::default());

        let state = PersistentState {
            volume: Some(0.35),
            filter: SongFilter::Cover,
        };
        state.save_to(&path).unwrap();
        assert_eq!(PersistentState::load_from(&path), state);

        std::fs::write(&path, "garbage").unwrap();
        assert_eq!(PersistentState::load_from(&path), PersistentState::default());
    }
}
