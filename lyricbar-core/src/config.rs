use crate::error::{CoreError, Result};
use const_format::concatcp;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default heartbeat between forced re-polls of the player
pub const DEFAULT_HEARTBEAT_MS: u64 = 500;

/// Default maximum number of characters shown in the bar
pub const DEFAULT_MAX_LENGTH: usize = 100;

/// Default number of lines in the tooltip before the first lyric starts
pub const DEFAULT_TOOLTIP_LINES: usize = 8;

/// Minimum accepted value for `display.tooltip_lines`
pub const MIN_TOOLTIP_LINES: usize = 4;

/// Lines shown in the tooltip before the active line
pub const DEFAULT_TOOLTIP_BEFORE: usize = 2;

/// Lines shown in the tooltip after the active line
pub const DEFAULT_TOOLTIP_AFTER: usize = 5;

/// Default colour of inactive tooltip lines
pub const DEFAULT_TOOLTIP_COLOR: &str = "#cccccc";

/// Default request timeout for lyrics providers
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default number of retries for transient provider failures
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricbarConfig {
    #[serde(default)]
    pub music: MusicConfig,
    #[serde(default)]
    pub lyrics: LyricsConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicConfig {
    /// Case-insensitive substring of the MPRIS bus name to follow (any player if unset)
    #[serde(default)]
    pub player: Option<String>,
    /// Fallback re-poll interval in milliseconds
    #[serde(default = "default_heartbeat_ms")]
    pub heartbeat_ms: u64,
}

const fn default_heartbeat_ms() -> u64 {
    DEFAULT_HEARTBEAT_MS
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            player: None,
            heartbeat_ms: default_heartbeat_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricsConfig {
    /// Provider priority: providers are tried in order
    #[serde(default = "default_providers")]
    pub providers: Vec<LyricsProviderType>,
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_providers() -> Vec<LyricsProviderType> {
    vec![LyricsProviderType::Lrclib]
}

const fn default_true() -> bool {
    true
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

const fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            cache_enabled: true,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LyricsProviderType {
    Lrclib,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Maximum characters in the bar text (0 disables truncation)
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    /// Lines shown in the tooltip before the first lyric line starts
    #[serde(default = "default_tooltip_lines")]
    pub tooltip_lines: usize,
    #[serde(default = "default_tooltip_before")]
    pub tooltip_before: usize,
    #[serde(default = "default_tooltip_after")]
    pub tooltip_after: usize,
    /// Pango colour of inactive tooltip lines
    #[serde(default = "default_tooltip_color")]
    pub tooltip_color: String,
}

const fn default_max_length() -> usize {
    DEFAULT_MAX_LENGTH
}

const fn default_tooltip_lines() -> usize {
    DEFAULT_TOOLTIP_LINES
}

const fn default_tooltip_before() -> usize {
    DEFAULT_TOOLTIP_BEFORE
}

const fn default_tooltip_after() -> usize {
    DEFAULT_TOOLTIP_AFTER
}

fn default_tooltip_color() -> String {
    DEFAULT_TOOLTIP_COLOR.to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
            tooltip_lines: default_tooltip_lines(),
            tooltip_before: default_tooltip_before(),
            tooltip_after: default_tooltip_after(),
            tooltip_color: default_tooltip_color(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Append logs to this file in addition to stderr
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl LyricbarConfig {
    /// Get the config file path (~/.config/lyricbar/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from `path`, writing the commented template first if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or written, or fails to parse.
    /// Value ranges are not checked; call [`LyricbarConfig::validate`] once
    /// every override has been applied.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|source| CoreError::ConfigWriteFailed {
                    path: path.to_path_buf(),
                    source,
                })?;
            }
            fs::write(path, CONFIG_TEMPLATE).map_err(|source| CoreError::ConfigWriteFailed {
                path: path.to_path_buf(),
                source,
            })?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse config file contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` describing the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.display.tooltip_lines < MIN_TOOLTIP_LINES {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "display.tooltip_lines must be at least {MIN_TOOLTIP_LINES} (got {})",
                    self.display.tooltip_lines
                ),
            });
        }
        if self.music.heartbeat_ms == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "music.heartbeat_ms must be greater than zero".to_string(),
            });
        }
        if self.display.tooltip_color.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "display.tooltip_color must not be empty".to_string(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub const fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.music.heartbeat_ms)
    }

    #[must_use]
    pub const fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.lyrics.timeout_secs)
    }
}

/// Commented template written on first run
pub const CONFIG_TEMPLATE: &str = concatcp!(
    r#"# lyricbar configuration
# ~/.config/lyricbar/config.toml

[music]
# Follow only MPRIS players whose bus name contains this text (case-insensitive)
# player = "spotify"
# Fallback re-poll interval; line changes are scheduled precisely regardless
heartbeat_ms = "#,
    DEFAULT_HEARTBEAT_MS,
    r#"

[lyrics]
# Providers are tried in order; first synced result wins
providers = ["lrclib"]
cache_enabled = true
timeout_secs = "#,
    DEFAULT_TIMEOUT_SECS,
    r#"
max_retries = "#,
    DEFAULT_MAX_RETRIES,
    r#"

[display]
# Characters shown in the bar; 0 disables truncation
max_length = "#,
    DEFAULT_MAX_LENGTH,
    r#"
# Tooltip lines shown before the first lyric line (at least 4)
tooltip_lines = "#,
    DEFAULT_TOOLTIP_LINES,
    r#"
tooltip_before = "#,
    DEFAULT_TOOLTIP_BEFORE,
    r#"
tooltip_after = "#,
    DEFAULT_TOOLTIP_AFTER,
    r#"
tooltip_color = ""#,
    DEFAULT_TOOLTIP_COLOR,
    r#""

[logging]
# file = "/tmp/lyricbar.log"
"#
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_matches_defaults() {
        let config = LyricbarConfig::parse(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config, LyricbarConfig::default());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = LyricbarConfig::parse("").unwrap();
        assert_eq!(config, LyricbarConfig::default());
        assert_eq!(config.heartbeat(), Duration::from_millis(500));
    }

    #[test]
    fn test_partial_file() {
        let config = LyricbarConfig::parse(
            r#"
[music]
player = "spotify"

[display]
max_length = 40
"#,
        )
        .unwrap();
        assert_eq!(config.music.player.as_deref(), Some("spotify"));
        assert_eq!(config.music.heartbeat_ms, DEFAULT_HEARTBEAT_MS);
        assert_eq!(config.display.max_length, 40);
        assert_eq!(config.display.tooltip_lines, DEFAULT_TOOLTIP_LINES);
        assert_eq!(config.lyrics.providers, vec![LyricsProviderType::Lrclib]);
    }

    #[test]
    fn test_tooltip_lines_validated() {
        let config = LyricbarConfig::parse("[display]\ntooltip_lines = 3\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, CoreError::ConfigInvalid { .. }));
    }

    #[test]
    fn test_zero_heartbeat_rejected() {
        let config = LyricbarConfig::parse("[music]\nheartbeat_ms = 0\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, CoreError::ConfigInvalid { .. }));
    }

    #[test]
    fn test_malformed_toml() {
        let err = LyricbarConfig::parse("[display\nmax_length = 1").unwrap_err();
        assert!(matches!(err, CoreError::ConfigParseError(_)));
    }

    #[test]
    fn test_load_or_create_writes_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lyricbar").join("config.toml");

        let config = LyricbarConfig::load_or_create(&path).unwrap();
        assert_eq!(config, LyricbarConfig::default());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), CONFIG_TEMPLATE);

        std::fs::write(&path, "[display]\nmax_length = 12\n").unwrap();
        let config = LyricbarConfig::load_or_create(&path).unwrap();
        assert_eq!(config.display.max_length, 12);
    }
}
