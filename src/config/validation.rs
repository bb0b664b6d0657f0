//! Configuration validation logic.

use crate::errors::Error;
use crate::memory::store::MAX_SEARCH_LIMIT;

use super::Config;

/// Validate all configuration values for correctness and constraints.
///
/// Checks that:
/// - Database path, embedding model and chat model are not empty
/// - Search limit is between 1 and `MAX_SEARCH_LIMIT`
/// - Minimum score is a finite number between -1.0 and 1.0
///
/// # Errors
///
/// Returns `Error::Config` if any validation check fails.
pub fn validate(config: &Config) -> Result<(), Error> {
    validate_database_path(config)?;
    validate_models(config)?;
    validate_search_limit(config.search_limit)?;
    validate_min_score(config.min_score)?;
    Ok(())
}

fn validate_database_path(config: &Config) -> Result<(), Error> {
    if config.database_path.as_os_str().is_empty() {
        return Err(Error::Config("Database path cannot be empty".to_string()));
    }
    Ok(())
}

fn validate_models(config: &Config) -> Result<(), Error> {
    if config.embedding_model.trim().is_empty() {
        return Err(Error::Config("Embedding model cannot be empty".to_string()));
    }
    if config.chat_model.trim().is_empty() {
        return Err(Error::Config("Chat model cannot be empty".to_string()));
    }
    Ok(())
}

fn validate_search_limit(limit: usize) -> Result<(), Error> {
    if limit == 0 || limit > MAX_SEARCH_LIMIT {
        return Err(Error::Config(format!(
            "Invalid search limit: {limit} (must be between 1 and {MAX_SEARCH_LIMIT})"
        )));
    }
    Ok(())
}

fn validate_min_score(min_score: f32) -> Result<(), Error> {
    if !min_score.is_finite() {
        return Err(Error::Config(
            "Invalid minimum score: NaN and infinity are not allowed".into(),
        ));
    }
    if !(-1.0..=1.0).contains(&min_score) {
        return Err(Error::Config(format!(
            "Invalid minimum score: {min_score} (must be between -1.0 and 1.0)"
        )));
    }
    Ok(())
}
