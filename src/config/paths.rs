//! Path expansion utilities for tilde (`~`) substitution.

use std::path::{Path, PathBuf};

/// Root of everything recall keeps on disk: `~/.recall`.
pub fn recall_home() -> PathBuf {
    // Fall back to the working directory on systems without a home
    let home = dirs::home_dir().unwrap_or_else(|| {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
    });
    home.join(".recall")
}

/// Expand `~` to home directory in a PathBuf (in-place).
pub fn expand_tilde(path: &mut PathBuf) {
    *path = expand_tilde_path(path);
}

/// Expand `~` to home directory in a PathBuf (returns new PathBuf).
pub fn expand_tilde_path(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let mut path = PathBuf::from("~/notes/recall.db");
        expand_tilde(&mut path);

        assert!(!path.starts_with("~"));
        assert!(path.starts_with(&home));
        assert!(path.ends_with("notes/recall.db"));
    }

    #[test]
    fn test_expand_tilde_no_tilde() {
        let mut path = PathBuf::from("/absolute/path");
        expand_tilde(&mut path);
        assert_eq!(path, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_tilde_inside_name_untouched() {
        let path = expand_tilde_path(Path::new("~backup/db"));
        assert_eq!(path, PathBuf::from("~backup/db"));
    }

    #[test]
    fn test_recall_home() {
        assert!(recall_home().ends_with(".recall"));
    }
}
