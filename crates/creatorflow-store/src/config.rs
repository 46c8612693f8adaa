use std::env;
use std::path::{Path, PathBuf};

/// Store configuration.
///
/// Reads the data directory from the `CREATORFLOW_DATA_DIR` environment
/// variable, falling back to the XDG data directory when unset.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding one JSON document per collection.
    pub data_dir: PathBuf,
}

impl StoreConfig {
    /// Environment variable that overrides the data directory.
    pub const ENV_VAR: &str = "CREATORFLOW_DATA_DIR";

    /// Build a config from the environment.
    ///
    /// Priority: `CREATORFLOW_DATA_DIR`, then [`Self::default_data_dir`].
    pub fn from_env() -> Self {
        let data_dir = env::var_os(Self::ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_data_dir);
        Self { data_dir }
    }

    /// Build a config from an explicit directory (useful for tests and CLI flags).
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// `$XDG_DATA_HOME/creatorflow`, or `~/.local/share/creatorflow`.
    pub fn default_data_dir() -> PathBuf {
        if let Some(xdg) = env::var_os("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("creatorflow");
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".local")
            .join("share")
            .join("creatorflow")
    }

    /// Path of the document backing `key`.
    pub fn document_path(&self, key: &str) -> PathBuf {
        document_path(&self.data_dir, key)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

pub(crate) fn document_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_new() {
        let cfg = StoreConfig::new("/tmp/cf-data");
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/cf-data"));
    }

    #[test]
    fn document_path_appends_json_extension() {
        let cfg = StoreConfig::new("/var/lib/cf");
        assert_eq!(
            cfg.document_path("creatorflow_tasks"),
            PathBuf::from("/var/lib/cf/creatorflow_tasks.json")
        );
    }

    #[test]
    fn default_dir_ends_with_app_name() {
        assert!(StoreConfig::default_data_dir().ends_with("creatorflow"));
    }
}
