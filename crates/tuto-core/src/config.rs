//! Configuration management for tuto.
//!
//! Loads configuration from ${TUTO_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Development default when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api/";

/// Loopback mapping used by Android emulators to reach the host machine.
/// Kept as the documented convention for on-device development builds.
pub const EMULATOR_BASE_URL: &str = "http://10.0.2.2:8000/api/";

/// Environment variable overriding the backend base URL.
pub const API_URL_ENV: &str = "TUTO_API_URL";

/// Client configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend API base URL. Overridden by the TUTO_API_URL env var.
    pub api_base_url: Option<String>,
}

impl Config {
    /// Loads the configuration from the default path.
    /// A missing file yields the defaults.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads the configuration from an explicit path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Writes a commented starter config file.
    ///
    /// # Errors
    /// Fails if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config already exists at {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let template = format!(
            "# tuto configuration\n\
             #\n\
             # Backend API base URL. The {API_URL_ENV} env var takes precedence.\n\
             # api_base_url = \"{DEFAULT_BASE_URL}\"\n"
        );

        fs::write(path, template)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }
}

/// Resolves the backend base URL.
///
/// Precedence: env override, then configured value, then a URL derived from
/// the serving host when one is known (browser-style deployments), then the
/// development loopback default. The result always ends with a slash so
/// request paths can be appended directly.
pub fn resolve_base_url(
    env_override: Option<&str>,
    configured: Option<&str>,
    host: Option<&str>,
) -> String {
    let chosen = env_override
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
        .or_else(|| {
            configured
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(ToString::to_string)
        })
        .or_else(|| host.map(|h| format!("http://{h}/api/")))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    if chosen.ends_with('/') {
        chosen
    } else {
        format!("{chosen}/")
    }
}

pub mod paths {
    //! Path resolution for tuto configuration and data directories.
    //!
    //! TUTO_HOME resolution order:
    //! 1. TUTO_HOME environment variable (if set)
    //! 2. ~/.config/tuto (default)

    use std::path::PathBuf;

    /// Returns the tuto home directory.
    ///
    /// Checks TUTO_HOME env var first, falls back to ~/.config/tuto
    pub fn tuto_home() -> PathBuf {
        if let Ok(home) = std::env::var("TUTO_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("tuto"))
            .expect("Could not determine home directory")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        tuto_home().join("config.toml")
    }

    /// Returns the path to the persisted token pair.
    pub fn tokens_path() -> PathBuf {
        tuto_home().join("tokens.json")
    }

    /// Returns the path to the persisted preferences.
    pub fn prefs_path() -> PathBuf {
        tuto_home().join("prefs.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: env override wins over everything.
    #[test]
    fn test_resolve_base_url_env_override() {
        let url = resolve_base_url(
            Some("http://staging.example.com/api"),
            Some("http://configured/api/"),
            Some("app.example.com"),
        );
        assert_eq!(url, "http://staging.example.com/api/");
    }

    /// Test: configured value beats host derivation.
    #[test]
    fn test_resolve_base_url_configured() {
        let url = resolve_base_url(None, Some("http://configured/api/"), Some("app.example.com"));
        assert_eq!(url, "http://configured/api/");
    }

    /// Test: a known serving host beats the loopback default.
    #[test]
    fn test_resolve_base_url_host_derivation() {
        let url = resolve_base_url(None, None, Some("app.example.com"));
        assert_eq!(url, "http://app.example.com/api/");
    }

    /// Test: development default when nothing is set.
    #[test]
    fn test_resolve_base_url_default() {
        assert_eq!(resolve_base_url(None, None, None), DEFAULT_BASE_URL);
    }

    /// Test: blank overrides are ignored.
    #[test]
    fn test_resolve_base_url_blank_override() {
        let url = resolve_base_url(Some("   "), None, None);
        assert_eq!(url, DEFAULT_BASE_URL);
    }

    /// Test: missing config file yields defaults.
    #[test]
    fn test_load_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert!(config.api_base_url.is_none());
    }

    /// Test: init then load roundtrip.
    #[test]
    fn test_init_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        Config::init(&path).unwrap();
        assert!(path.exists());

        // Template only has commented keys, so loading yields defaults.
        let config = Config::load_from(&path).unwrap();
        assert!(config.api_base_url.is_none());

        // Second init refuses to clobber.
        assert!(Config::init(&path).is_err());
    }
}
