//! Utility helpers — data directory, home expansion, timestamps.

use std::path::{Path, PathBuf};

/// Environment variable that relocates the config root.
pub const CONFIG_ROOT_ENV: &str = "CLAWLESS_CONFIG_ROOT";

/// Get the Clawless data directory (e.g. `~/.clawless/`).
pub fn get_data_path() -> PathBuf {
    let home = dirs_next::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".clawless")
}

/// Config root: `$CLAWLESS_CONFIG_ROOT` if set, else `~/.clawless`.
pub fn get_config_root() -> PathBuf {
    match std::env::var(CONFIG_ROOT_ENV) {
        Ok(val) if !val.trim().is_empty() => absolutize(&expand_home(val.trim())),
        _ => get_data_path(),
    }
}

/// Expand `~` to the home directory in a path string.
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        return dirs_next::home_dir().unwrap_or_else(|| PathBuf::from("."));
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Make a path absolute against the current working directory.
pub fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/// Current Unix time in whole seconds.
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Truncate a string to `max_len` characters, adding "..." if truncated.
/// Unicode-safe.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
