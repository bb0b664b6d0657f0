//! Shared test utilities for config module tests.

use std::sync::Mutex;

/// Mutex to serialize environment variable tests and prevent race conditions.
pub static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Every environment variable the config layer reads.
pub const RECALL_ENV_VARS: [&str; 6] = [
    "RECALL_DATABASE_PATH",
    "RECALL_EMBEDDING_MODEL",
    "RECALL_MODEL_CACHE",
    "RECALL_SEARCH_LIMIT",
    "RECALL_MIN_SCORE",
    "RECALL_CHAT_MODEL",
];

/// Clean up environment variables used by recall config.
pub fn cleanup_env_vars() {
    for var in RECALL_ENV_VARS {
        // SAFETY: callers hold ENV_MUTEX, so no other test touches the environment.
        unsafe { std::env::remove_var(var) };
    }
}

/// Set an environment variable while holding ENV_MUTEX.
pub fn set_env(name: &str, value: &str) {
    // SAFETY: callers hold ENV_MUTEX, so no other test touches the environment.
    unsafe { std::env::set_var(name, value) };
}
