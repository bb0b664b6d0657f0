//! Environment variable overrides for configuration.

use crate::errors::Error;

use super::{env_parser, Config};

/// Apply `RECALL_*` environment variable overrides to configuration.
pub fn apply_env_overrides(config: &mut Config) -> Result<(), Error> {
    env_parser::apply_database_path_override(&mut config.database_path)?;
    env_parser::apply_embedding_model_override(&mut config.embedding_model)?;
    env_parser::apply_model_cache_override(&mut config.model_cache)?;
    env_parser::apply_search_limit_override(&mut config.search_limit)?;
    env_parser::apply_min_score_override(&mut config.min_score)?;
    env_parser::apply_chat_model_override(&mut config.chat_model)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests_utils::{cleanup_env_vars, set_env, ENV_MUTEX};
    use std::path::PathBuf;

    fn base_config() -> Config {
        Config {
            database_path: PathBuf::from("/default/recall.db"),
            embedding_model: "default/model".to_string(),
            model_cache: PathBuf::from("/default/cache"),
            search_limit: 10,
            min_score: 0.3,
            chat_model: "default-chat".to_string(),
        }
    }

    #[test]
    fn test_env_var_overrides_config() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars();

        set_env("RECALL_DATABASE_PATH", "/custom/path/db.db");
        set_env("RECALL_EMBEDDING_MODEL", "env/model");
        set_env("RECALL_MODEL_CACHE", "/custom/cache");
        set_env("RECALL_SEARCH_LIMIT", "25");
        set_env("RECALL_MIN_SCORE", "0.55");
        set_env("RECALL_CHAT_MODEL", "env-chat");

        let mut config = base_config();
        apply_env_overrides(&mut config).unwrap();

        assert_eq!(config.database_path, PathBuf::from("/custom/path/db.db"));
        assert_eq!(config.embedding_model, "env/model");
        assert_eq!(config.model_cache, PathBuf::from("/custom/cache"));
        assert_eq!(config.search_limit, 25);
        assert_eq!(config.min_score, 0.55);
        assert_eq!(config.chat_model, "env-chat");

        cleanup_env_vars();
    }

    #[test]
    fn test_unset_env_leaves_config_alone() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars();

        let mut config = base_config();
        apply_env_overrides(&mut config).unwrap();

        assert_eq!(config.database_path, PathBuf::from("/default/recall.db"));
        assert_eq!(config.search_limit, 10);
        assert_eq!(config.chat_model, "default-chat");
    }

    #[test]
    fn test_invalid_min_score() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars();

        set_env("RECALL_MIN_SCORE", "invalid");

        let result = apply_env_overrides(&mut base_config());
        assert!(matches!(result, Err(Error::Config(_))));

        cleanup_env_vars();
    }

    #[test]
    fn test_invalid_search_limit() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars();

        set_env("RECALL_SEARCH_LIMIT", "ten");

        let result = apply_env_overrides(&mut base_config());
        assert!(matches!(result, Err(Error::Config(_))));

        cleanup_env_vars();
    }

    #[test]
    fn test_empty_env_var_rejected() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars();

        set_env("RECALL_DATABASE_PATH", "");

        let result = apply_env_overrides(&mut base_config());
        assert!(matches!(result, Err(Error::Config(_))));

        cleanup_env_vars();
    }

    #[test]
    fn test_whitespace_env_var_rejected() {
        let _guard = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars();

        set_env("RECALL_EMBEDDING_MODEL", "   ");

        let result = apply_env_overrides(&mut base_config());
        assert!(matches!(result, Err(Error::Config(_))));

        cleanup_env_vars();
    }
}
