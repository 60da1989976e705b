//! Persisted user preferences.
//!
//! A single JSON document at `<base>/prefs.json`. Together with the token
//! pair this is the entirety of the client's durable footprint.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Durable display preferences.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub dark_mode: bool,
}

impl Preferences {
    /// Loads preferences, falling back to defaults when the file is missing
    /// or unreadable.
    pub fn load_from(path: &Path) -> Self {
        let Ok(contents) = fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&contents).unwrap_or_default()
    }

    /// Saves preferences.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(self).context("Failed to serialize preferences")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write to {}", path.display()))
    }
}
