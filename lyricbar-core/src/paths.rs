//! Path constants for configuration, cache and lock files.

use std::path::PathBuf;

/// The name of the configuration directory under ~/.config/
pub const CONFIG_DIR_NAME: &str = "lyricbar";

/// The name of the main configuration file
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// The name of the lyrics cache directory under the user cache dir
pub const LYRICS_CACHE_DIR_NAME: &str = "lyricbar";

/// The name of the advisory lock file shared by all running instances
pub const LOCK_FILE_NAME: &str = "lyricbar.lock";

/// Get the configuration directory path (~/.config/lyricbar/)
#[must_use]
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join(CONFIG_DIR_NAME)
}

/// Get the config file path (~/.config/lyricbar/config.toml)
#[must_use]
pub fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Get the lyrics cache directory (`~/.cache/lyricbar/` on Linux)
#[must_use]
pub fn lyrics_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(LYRICS_CACHE_DIR_NAME)
}

/// Get the advisory lock file path (`$TMPDIR/lyricbar.lock`)
#[must_use]
pub fn lock_path() -> PathBuf {
    std::env::temp_dir().join(LOCK_FILE_NAME)
}
