//! Configuration file loading and parsing.

use crate::errors::Error;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths;

/// Configuration loaded from TOML file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub embedding_model: Option<String>,

    #[serde(default)]
    pub model_cache: Option<PathBuf>,

    #[serde(default)]
    pub search_limit: Option<usize>,

    #[serde(default)]
    pub min_score: Option<f32>,

    #[serde(default)]
    pub chat_model: Option<String>,
}

/// Location of the user config file: `~/.recall/config.toml`.
pub fn config_file_path() -> PathBuf {
    paths::recall_home().join("config.toml")
}

/// Load configuration from the user config file, if it exists.
pub fn load_from_file() -> Result<Option<ConfigFile>, Error> {
    load_from_path(&config_file_path())
}

/// Load configuration from `config_path`. A missing file is not an error.
pub fn load_from_path(config_path: &Path) -> Result<Option<ConfigFile>, Error> {
    if !config_path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(config_path).map_err(|e| {
        Error::Config(format!(
            "Failed to read config file {}: {e}",
            config_path.display()
        ))
    })?;

    let config: ConfigFile = toml::from_str(&content).map_err(|e| {
        Error::Config(format!(
            "Failed to parse config file {}: {e}",
            config_path.display()
        ))
    })?;

    Ok(Some(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_malformed_toml() {
        let content = r#"
This is not valid TOML
 [[unclosed bracket
 "#;

        let result: Result<ConfigFile, _> = toml::from_str(content);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_config_file() {
        let config: ConfigFile = toml::from_str("").unwrap();
        assert!(config.database_path.is_none());
        assert!(config.embedding_model.is_none());
        assert!(config.search_limit.is_none());
        assert!(config.min_score.is_none());
    }

    #[test]
    fn test_config_file_partial_toml() {
        let content = r#"
            database_path = "/test/db.db"
            min_score = 0.5
        "#;

        let config: ConfigFile = toml::from_str(content).unwrap();
        assert_eq!(config.database_path, Some(PathBuf::from("/test/db.db")));
        assert_eq!(config.min_score, Some(0.5));
        assert!(config.chat_model.is_none());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result: Result<ConfigFile, _> = toml::from_str("similarity_threshold = 0.9");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = load_from_path(&dir.path().join("config.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_load_from_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "search_limit = 7\nchat_model = \"other\"\n").unwrap();

        let config = load_from_path(&path).unwrap().unwrap();
        assert_eq!(config.search_limit, Some(7));
        assert_eq!(config.chat_model.as_deref(), Some("other"));
    }

    #[test]
    fn test_load_invalid_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "search_limit = \"many\"").unwrap();

        assert!(matches!(load_from_path(&path), Err(Error::Config(_))));
    }
}
