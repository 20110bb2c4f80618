//! Small per-device preferences persisted as a JSON file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const PREFERENCES_FILE_NAME: &str = "preferences.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalPreferences {
    /// The welcome walkthrough was dismissed on this device
    pub onboarding_completed: bool,
}

/// File-backed [`LocalPreferences`].
#[derive(Debug, Clone)]
pub struct PreferencesStore {
    path: PathBuf,
}

impl PreferencesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store inside `dir` under the default file name.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(PREFERENCES_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the preferences. A missing file yields the defaults.
    pub fn load(&self) -> Result<LocalPreferences> {
        match fs::read_to_string(&self.path) {
            Ok(payload) => Ok(serde_json::from_str(&payload)?),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(LocalPreferences::default()),
            Err(error) => Err(error.into()),
        }
    }

    pub fn save(&self, preferences: &LocalPreferences) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(preferences)?)?;
        Ok(())
    }

    pub fn onboarding_completed(&self) -> Result<bool> {
        Ok(self.load()?.onboarding_completed)
    }

    pub fn set_onboarding_completed(&self, completed: bool) -> Result<()> {
        let mut preferences = self.load()?;
        preferences.onboarding_completed = completed;
        self.save(&preferences)
    }
}
