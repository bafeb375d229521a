use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{KeyTreeError, Result};

/// User-level configuration, loaded from `<config dir>/keytree/config.toml`.
///
/// Every field has a sensible default so KeyTree works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Store file used when neither `--file` nor `KEYTREE_FILE` is given.
    #[serde(default = "default_store_file")]
    pub store_file: PathBuf,

    /// Seconds before a copied secret is wiped from the clipboard (0 = never).
    #[serde(default = "default_clipboard_clear_secs")]
    pub clipboard_clear_secs: u64,

    /// Seconds the interactive shell waits for input before exiting (0 = forever).
    #[serde(default = "default_input_timeout_secs")]
    pub input_timeout_secs: u64,

    /// Default length for generated passwords.
    #[serde(default = "default_generate_length")]
    pub generate_length: usize,

    /// Default character classes for generated passwords.
    #[serde(default = "default_generate_classes")]
    pub generate_classes: String,
}

// ── Serde default helpers ────────────────────────────────────────────

/// Per-user directory holding the config file and default store.
pub fn app_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("keytree")
}

fn default_store_file() -> PathBuf {
    app_dir().join("secrets.ktree")
}

fn default_clipboard_clear_secs() -> u64 {
    15
}

fn default_input_timeout_secs() -> u64 {
    60
}

fn default_generate_length() -> usize {
    20
}

fn default_generate_classes() -> String {
    "aA1!".to_string()
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_file: default_store_file(),
            clipboard_clear_secs: default_clipboard_clear_secs(),
            input_timeout_secs: default_input_timeout_secs(),
            generate_length: default_generate_length(),
            generate_classes: default_generate_classes(),
        }
    }
}

impl Settings {
    /// Name of the config file inside the app directory.
    const FILE_NAME: &'static str = "config.toml";

    /// Load settings from the per-user config directory.
    pub fn load_default() -> Result<Self> {
        Self::load(&app_dir())
    }

    /// Load settings from `<dir>/config.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            KeyTreeError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        if settings.generate_length == 0 {
            return Err(KeyTreeError::ConfigError(
                "generate_length must be at least 1".into(),
            ));
        }

        Ok(settings)
    }

    /// Resolve the store file: explicit flag, then `KEYTREE_FILE`,
    /// then the configured default.
    pub fn resolve_store_path(&self, explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        match std::env::var_os("KEYTREE_FILE") {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => self.store_file.clone(),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
