//! Environment variable parsing utilities for configuration.

use crate::errors::Error;
use std::path::PathBuf;
use std::str::FromStr;

use super::paths;

/// Parse environment variable value or return error if empty/whitespace.
fn parse_env_string(name: &str, value: &str) -> Result<String, Error> {
    if value.trim().is_empty() {
        return Err(Error::Config(format!("{name} cannot be empty")));
    }
    Ok(value.trim().to_string())
}

/// Parse environment variable as a path, expanding tilde.
fn parse_env_path(name: &str, value: &str) -> Result<PathBuf, Error> {
    let value = parse_env_string(name, value)?;
    Ok(paths::expand_tilde_path(&PathBuf::from(value)))
}

/// Parse environment variable as a number. Range checks happen in validation.
fn parse_env_number<T>(name: &str, value: &str) -> Result<T, Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_env_string(name, value)?
        .parse()
        .map_err(|e| Error::Config(format!("Invalid {name} value: {e}")))
}

fn read(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Apply RECALL_DATABASE_PATH environment variable override.
pub fn apply_database_path_override(database_path: &mut PathBuf) -> Result<(), Error> {
    if let Some(val) = read("RECALL_DATABASE_PATH") {
        *database_path = parse_env_path("RECALL_DATABASE_PATH", &val)?;
    }
    Ok(())
}

/// Apply RECALL_EMBEDDING_MODEL environment variable override.
pub fn apply_embedding_model_override(embedding_model: &mut String) -> Result<(), Error> {
    if let Some(val) = read("RECALL_EMBEDDING_MODEL") {
        *embedding_model = parse_env_string("RECALL_EMBEDDING_MODEL", &val)?;
    }
    Ok(())
}

/// Apply RECALL_MODEL_CACHE environment variable override.
pub fn apply_model_cache_override(model_cache: &mut PathBuf) -> Result<(), Error> {
    if let Some(val) = read("RECALL_MODEL_CACHE") {
        *model_cache = parse_env_path("RECALL_MODEL_CACHE", &val)?;
    }
    Ok(())
}

/// Apply RECALL_SEARCH_LIMIT environment variable override.
pub fn apply_search_limit_override(search_limit: &mut usize) -> Result<(), Error> {
    if let Some(val) = read("RECALL_SEARCH_LIMIT") {
        *search_limit = parse_env_number("RECALL_SEARCH_LIMIT", &val)?;
    }
    Ok(())
}

/// Apply RECALL_MIN_SCORE environment variable override.
pub fn apply_min_score_override(min_score: &mut f32) -> Result<(), Error> {
    if let Some(val) = read("RECALL_MIN_SCORE") {
        *min_score = parse_env_number("RECALL_MIN_SCORE", &val)?;
    }
    Ok(())
}

/// Apply RECALL_CHAT_MODEL environment variable override.
pub fn apply_chat_model_override(chat_model: &mut String) -> Result<(), Error> {
    if let Some(val) = read("RECALL_CHAT_MODEL") {
        *chat_model = parse_env_string("RECALL_CHAT_MODEL", &val)?;
    }
    Ok(())
}
