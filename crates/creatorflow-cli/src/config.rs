//! Configuration file management for creatorflow.
//!
//! Provides a TOML-based config file at `~/.config/creatorflow/config.toml`
//! and a resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use creatorflow_core::clock::DEFAULT_UTC_OFFSET_HOURS;
use creatorflow_core::generate::GeminiConfig;
use creatorflow_store::config::StoreConfig;

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment variable overriding the Gemini model.
pub const MODEL_ENV: &str = "CREATORFLOW_MODEL";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub gemini: GeminiSection,
    #[serde(default)]
    pub calendar: CalendarSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StoreSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GeminiSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CalendarSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset_hours: Option<i32>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the creatorflow config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/creatorflow` or
/// `~/.config/creatorflow`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("creatorflow");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("creatorflow")
}

/// Return the path to the creatorflow config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file at `path`.
pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    toml::from_str(&contents).context("failed to parse config file")
}

/// Load the config file. `None` when there is none; a file that exists but
/// does not parse is an error.
pub fn load_config() -> Result<Option<ConfigFile>> {
    let path = config_path();
    if !path.exists() {
        return Ok(None);
    }
    load_config_from(&path).map(Some)
}

/// Serialize and write the config file to `path`, creating parent dirs as
/// needed. Sets file permissions to 0600 on Unix.
pub fn save_config_to(path: &Path, config: &ConfigFile) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

pub fn save_config(config: &ConfigFile) -> Result<()> {
    save_config_to(&config_path(), config)
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug, Clone)]
pub struct CreatorFlowConfig {
    pub store: StoreConfig,
    pub gemini: GeminiConfig,
    pub utc_offset_hours: i32,
}

impl CreatorFlowConfig {
    /// Resolve configuration from the process environment and the config
    /// file.
    pub fn resolve(cli_data_dir: Option<&Path>) -> Result<Self> {
        let file = load_config()?;
        Ok(Self::resolve_with(
            cli_data_dir,
            |name| std::env::var(name).ok(),
            file.as_ref(),
        ))
    }

    /// Resolve using the chain: CLI flag > env var > config file > default.
    ///
    /// - Data dir: `--data-dir` > `CREATORFLOW_DATA_DIR` > `store.data_dir` > XDG data dir
    /// - API key: `GEMINI_API_KEY` > `gemini.api_key` > empty
    /// - Model: `CREATORFLOW_MODEL` > `gemini.model` > built-in default
    pub fn resolve_with(
        cli_data_dir: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
        file: Option<&ConfigFile>,
    ) -> Self {
        let non_empty = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        let data_dir = cli_data_dir
            .map(Path::to_path_buf)
            .or_else(|| non_empty(StoreConfig::ENV_VAR).map(PathBuf::from))
            .or_else(|| file.and_then(|f| f.store.data_dir.clone()))
            .unwrap_or_else(StoreConfig::default_data_dir);

        let defaults = GeminiConfig::default();
        let section = file.map(|f| &f.gemini);
        let gemini = GeminiConfig {
            api_key: non_empty(API_KEY_ENV)
                .or_else(|| section.and_then(|s| s.api_key.clone()))
                .unwrap_or_default(),
            model: non_empty(MODEL_ENV)
                .or_else(|| section.and_then(|s| s.model.clone()))
                .unwrap_or(defaults.model),
            endpoint: section
                .and_then(|s| s.endpoint.clone())
                .unwrap_or(defaults.endpoint),
            timeout_secs: section
                .and_then(|s| s.timeout_secs)
                .unwrap_or(defaults.timeout_secs),
        };

        let utc_offset_hours = file
            .and_then(|f| f.calendar.utc_offset_hours)
            .unwrap_or(DEFAULT_UTC_OFFSET_HOURS);

        Self {
            store: StoreConfig::new(data_dir),
            gemini,
            utc_offset_hours,
        }
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn file_config() -> ConfigFile {
        ConfigFile {
            store: StoreSection {
                data_dir: Some(PathBuf::from("/srv/file-data")),
            },
            gemini: GeminiSection {
                api_key: Some("file-key".to_owned()),
                model: Some("file-model".to_owned()),
                endpoint: Some("http://localhost:8080/v1beta".to_owned()),
                timeout_secs: Some(5),
            },
            calendar: CalendarSection {
                utc_offset_hours: Some(0),
            },
        }
    }

    #[test]
    fn save_and_load_config_roundtrip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("creatorflow").join("config.toml");

        save_config_to(&path, &file_config()).unwrap();
        let loaded = load_config_from(&path).unwrap();

        assert_eq!(loaded.store.data_dir, Some(PathBuf::from("/srv/file-data")));
        assert_eq!(loaded.gemini.api_key.as_deref(), Some("file-key"));
        assert_eq!(loaded.gemini.timeout_secs, Some(5));
        assert_eq!(loaded.calendar.utc_offset_hours, Some(0));
    }

    #[cfg(unix)]
    #[test]
    fn save_config_sets_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        save_config_to(&path, &ConfigFile::default()).unwrap();

        let meta = std::fs::metadata(&path).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn partial_file_parses_with_defaults() {
        let parsed: ConfigFile = toml::from_str("[gemini]\nmodel = \"m\"\n").unwrap();
        assert_eq!(parsed.gemini.model.as_deref(), Some("m"));
        assert!(parsed.store.data_dir.is_none());
        assert!(parsed.calendar.utc_offset_hours.is_none());
    }

    #[test]
    fn cli_flag_overrides_all() {
        let env = env_of(&[("CREATORFLOW_DATA_DIR", "/env/data")]);
        let file = file_config();
        let config =
            CreatorFlowConfig::resolve_with(Some(Path::new("/cli/data")), env, Some(&file));
        assert_eq!(config.store.data_dir, PathBuf::from("/cli/data"));
    }

    #[test]
    fn env_overrides_config_file() {
        let env = env_of(&[
            ("CREATORFLOW_DATA_DIR", "/env/data"),
            ("GEMINI_API_KEY", "env-key"),
            ("CREATORFLOW_MODEL", "env-model"),
        ]);
        let file = file_config();
        let config = CreatorFlowConfig::resolve_with(None, env, Some(&file));
        assert_eq!(config.store.data_dir, PathBuf::from("/env/data"));
        assert_eq!(config.gemini.api_key, "env-key");
        assert_eq!(config.gemini.model, "env-model");
        assert_eq!(config.gemini.endpoint, "http://localhost:8080/v1beta");
        assert_eq!(config.utc_offset_hours, 0);
    }

    #[test]
    fn blank_env_falls_through_to_file() {
        let env = env_of(&[("GEMINI_API_KEY", "  ")]);
        let file = file_config();
        let config = CreatorFlowConfig::resolve_with(None, env, Some(&file));
        assert_eq!(config.gemini.api_key, "file-key");
        assert_eq!(config.store.data_dir, PathBuf::from("/srv/file-data"));
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = CreatorFlowConfig::resolve_with(None, env_of(&[]), None);
        assert!(config.gemini.api_key.is_empty());
        assert_eq!(config.gemini.model, GeminiConfig::default().model);
        assert_eq!(config.utc_offset_hours, DEFAULT_UTC_OFFSET_HOURS);
        assert!(config.store.data_dir.ends_with("creatorflow"));
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("creatorflow/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
