//! Configuration system for recall.

mod env_parser;
mod loader;
mod overrides;
mod paths;
mod validation;

#[cfg(test)]
mod tests_utils;

use crate::embedding::DEFAULT_EMBEDDING_MODEL;
use crate::errors::Error;
use std::path::{Path, PathBuf};

pub use loader::{config_file_path, ConfigFile};

/// Default Anthropic model used by `recall chat`.
pub const DEFAULT_CHAT_MODEL: &str = "claude-sonnet-4-20250514";

/// Configuration values with priority: defaults < config file < env vars.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Path to the SQLite database.
    pub database_path: PathBuf,

    /// HuggingFace embedding model identifier.
    pub embedding_model: String,

    /// Directory for caching ONNX models.
    pub model_cache: PathBuf,

    /// Default number of search results.
    pub search_limit: usize,

    /// Default minimum cosine similarity for search results.
    pub min_score: f32,

    /// Anthropic model used to answer questions.
    pub chat_model: String,
}

impl Default for Config {
    fn default() -> Self {
        let recall_dir = paths::recall_home();

        Self {
            database_path: recall_dir.join("recall.db"),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            model_cache: recall_dir.join("models"),
            search_limit: 10,
            min_score: 0.3,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration with defaults, file values, and environment overrides.
    pub fn load() -> Result<Self, Error> {
        Self::load_with(loader::load_from_file()?)
    }

    /// Load configuration using the TOML file at `path` instead of the default
    /// location. Environment overrides still apply.
    pub fn load_from(path: &Path) -> Result<Self, Error> {
        Self::load_with(loader::load_from_path(path)?)
    }

    fn load_with(file_config: Option<ConfigFile>) -> Result<Self, Error> {
        let mut config = Config::default();

        if let Some(file) = file_config {
            config.merge_from_file(file);
        }

        overrides::apply_env_overrides(&mut config)?;
        validation::validate(&config)?;

        Ok(config)
    }

    /// Merge configuration from a file into this config.
    fn merge_from_file(&mut self, file: ConfigFile) {
        if let Some(mut path) = file.database_path.filter(|p| !p.as_os_str().is_empty()) {
            paths::expand_tilde(&mut path);
            self.database_path = path;
        }
        if let Some(model) = file.embedding_model {
            self.embedding_model = model;
        }
        if let Some(mut path) = file.model_cache.filter(|p| !p.as_os_str().is_empty()) {
            paths::expand_tilde(&mut path);
            self.model_cache = path;
        }
        if let Some(limit) = file.search_limit {
            self.search_limit = limit;
        }
        if let Some(score) = file.min_score {
            self.min_score = score;
        }
        if let Some(model) = file.chat_model {
            self.chat_model = model;
        }
    }

    /// Ensure parent directories for database and cache paths exist.
    pub fn ensure_directories(&self) -> Result<(), Error> {
        if let Some(parent) = self.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::Config(format!(
                        "Failed to create database directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        if !self.model_cache.as_os_str().is_empty() {
            std::fs::create_dir_all(&self.model_cache).map_err(|e| {
                Error::Config(format!(
                    "Failed to create model cache directory {}: {e}",
                    self.model_cache.display()
                ))
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use super::tests_utils::{cleanup_env_vars, set_env, ENV_MUTEX};

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.database_path.ends_with(".recall/recall.db"));
        assert_eq!(config.embedding_model, DEFAULT_EMBEDDING_MODEL);
        assert!(config.model_cache.ends_with(".recall/models"));
        assert_eq!(config.search_limit, 10);
        assert_eq!(config.min_score, 0.3);
        assert_eq!(config.chat_model, DEFAULT_CHAT_MODEL);
    }

    #[test]
    fn test_config_load_without_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars();

        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("missing.toml")).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "database_path = \"/data/notes.db\"\nsearch_limit = 20\nmin_score = 0.1\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.database_path, PathBuf::from("/data/notes.db"));
        assert_eq!(config.search_limit, 20);
        assert_eq!(config.min_score, 0.1);
        assert_eq!(config.embedding_model, DEFAULT_EMBEDDING_MODEL);
    }

    #[test]
    fn test_env_overrides_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "search_limit = 20\n").unwrap();
        set_env("RECALL_SEARCH_LIMIT", "3");

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.search_limit, 3);

        cleanup_env_vars();
    }

    #[test]
    fn test_file_tilde_expanded() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars();
        let Some(home) = dirs::home_dir() else {
            return;
        };

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "database_path = \"~/elsewhere/recall.db\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.database_path, home.join("elsewhere/recall.db"));
    }

    #[test]
    fn test_invalid_file_value_fails_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "min_score = 2.0\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_ensure_directories() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            database_path: dir.path().join("data/recall.db"),
            model_cache: dir.path().join("cache/models"),
            ..Config::default()
        };

        config.ensure_directories().unwrap();

        assert!(dir.path().join("data").is_dir());
        assert!(dir.path().join("cache/models").is_dir());
    }
}
