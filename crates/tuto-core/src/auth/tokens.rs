//! Bearer token persistence.
//!
//! Stores the access/refresh pair in `<base>/tokens.json` with restricted
//! permissions (0600). Tokens are opaque; no expiry is tracked client-side —
//! validity is whatever the backend says it is.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config;

/// An access/refresh token pair.
///
/// Both tokens are present or the pair does not exist: a half-written or
/// blank pair is treated as "not logged in", never as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer token attached to API requests.
    pub access: String,
    /// Long-lived token (kept for the backend's refresh contract).
    pub refresh: String,
}

/// On-disk shape. Separate from `TokenPair` so a partially populated file
/// deserializes instead of erroring.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredTokens {
    #[serde(default)]
    access: Option<String>,
    #[serde(default)]
    refresh: Option<String>,
}

/// Persistent store for the token pair.
///
/// Constructed with an explicit path so tests and callers can isolate it;
/// nothing in here reads ambient global state.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Creates a store backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store at the default location (${TUTO_HOME}/tokens.json).
    pub fn open_default() -> Self {
        Self::new(config::paths::tokens_path())
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Loads the stored pair.
    ///
    /// Returns `None` when the file is missing, unreadable, malformed, or
    /// when either token is missing or blank. Corruption is indistinguishable
    /// from "not logged in" by design.
    pub fn load(&self) -> Option<TokenPair> {
        let contents = fs::read_to_string(&self.path).ok()?;
        let stored: StoredTokens = match serde_json::from_str(&contents) {
            Ok(stored) => stored,
            Err(err) => {
                tracing::debug!(path = %self.path.display(), error = %err, "unreadable token file");
                return None;
            }
        };

        let access = stored.access.as_deref().map(str::trim).unwrap_or_default();
        let refresh = stored.refresh.as_deref().map(str::trim).unwrap_or_default();
        if access.is_empty() || refresh.is_empty() {
            return None;
        }

        Some(TokenPair {
            access: access.to_string(),
            refresh: refresh.to_string(),
        })
    }

    /// Saves the pair to disk with restricted permissions (0600).
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save(&self, pair: &TokenPair) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let stored = StoredTokens {
            access: Some(pair.access.clone()),
            refresh: Some(pair.refresh.clone()),
        };
        let contents =
            serde_json::to_string_pretty(&stored).context("Failed to serialize tokens")?;

        // Write with restricted permissions
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, contents)
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        Ok(())
    }

    /// Removes the stored pair. Missing file counts as success.
    /// Returns whether credentials existed.
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be removed.
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }

        fs::remove_file(&self.path)
            .with_context(|| format!("Failed to remove {}", self.path.display()))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> TokenStore {
        TokenStore::new(dir.path().join("tokens.json"))
    }

    /// Test: save then load roundtrip.
    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let pair = TokenPair {
            access: "access-token".to_string(),
            refresh: "refresh-token".to_string(),
        };
        store.save(&pair).unwrap();

        assert_eq!(store.load(), Some(pair));
    }

    /// Test: missing file loads as absent.
    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(store_in(&dir).load(), None);
    }

    /// Test: a half pair is absent, never a partial result.
    #[test]
    fn test_load_partial_pair_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        fs::write(store.path(), r#"{"access":"only-access"}"#).unwrap();
        assert_eq!(store.load(), None);

        fs::write(store.path(), r#"{"refresh":"only-refresh"}"#).unwrap();
        assert_eq!(store.load(), None);
    }

    /// Test: blank or whitespace-only tokens count as absent.
    #[test]
    fn test_load_blank_tokens_are_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        fs::write(store.path(), r#"{"access":"   ","refresh":"r"}"#).unwrap();
        assert_eq!(store.load(), None);

        fs::write(store.path(), r#"{"access":"a","refresh":""}"#).unwrap();
        assert_eq!(store.load(), None);
    }

    /// Test: malformed JSON loads as absent, not an error.
    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        fs::write(store.path(), "not json at all {").unwrap();
        assert_eq!(store.load(), None);
    }

    /// Test: clear is idempotent and reports prior existence.
    #[test]
    fn test_clear_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert!(!store.clear().unwrap());

        store
            .save(&TokenPair {
                access: "a".to_string(),
                refresh: "r".to_string(),
            })
            .unwrap();
        assert!(store.clear().unwrap());
        assert!(!store.clear().unwrap());
        assert_eq!(store.load(), None);
    }

    /// Test: loaded tokens come back trimmed.
    #[test]
    fn test_load_trims_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        fs::write(store.path(), r#"{"access":" a ","refresh":" r "}"#).unwrap();
        let pair = store.load().unwrap();
        assert_eq!(pair.access, "a");
        assert_eq!(pair.refresh, "r");
    }
}
