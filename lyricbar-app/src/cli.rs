//! Command-line interface definitions.

use clap::Parser;
use lyricbar_core::LyricbarConfig;
use std::path::PathBuf;

/// Synchronized lyrics for Waybar
#[derive(Parser, Debug)]
#[command(name = "lyricbar", version, about)]
pub struct Cli {
    /// Print a Waybar module configuration and exit
    #[arg(long, conflicts_with_all = ["toggle", "forget"])]
    pub init: bool,

    /// Toggle play/pause on the selected player and exit
    #[arg(long, conflicts_with = "forget")]
    pub toggle: bool,

    /// Remove cached lyrics for the currently playing track and exit
    #[arg(long)]
    pub forget: bool,

    /// Maximum characters shown in the bar (0 disables truncation)
    #[arg(short = 'l', long, value_name = "N")]
    pub max_length: Option<usize>,

    /// Tooltip lines shown before the first lyric line (at least 4)
    #[arg(short = 't', long, value_name = "N")]
    pub tooltip_lines: Option<usize>,

    /// Pango colour of inactive tooltip lines
    #[arg(long, value_name = "COLOR")]
    pub tooltip_color: Option<String>,

    /// Follow only players whose MPRIS bus name contains this text
    #[arg(short = 'p', long, env = "LYRICBAR_PLAYER")]
    pub player: Option<String>,

    /// Fallback re-poll interval in milliseconds
    #[arg(short = 'i', long = "interval", value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Also write logs to this file
    #[arg(long, env = "LYRICBAR_LOG_FILE", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Config file to use instead of ~/.config/lyricbar/config.toml
    #[arg(short = 'c', long, env = "LYRICBAR_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Config file location, honouring `--config`
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(LyricbarConfig::config_path)
    }

    /// Overlay command-line values on top of the file configuration
    pub fn apply(&self, config: &mut LyricbarConfig) {
        if let Some(max_length) = self.max_length {
            config.display.max_length = max_length;
        }
        if let Some(lines) = self.tooltip_lines {
            config.display.tooltip_lines = lines;
        }
        if let Some(color) = &self.tooltip_color {
            config.display.tooltip_color.clone_from(color);
        }
        if let Some(player) = &self.player {
            config.music.player = Some(player.clone());
        }
        if let Some(interval) = self.interval_ms {
            config.music.heartbeat_ms = interval;
        }
        if let Some(path) = &self.log_file {
            config.logging.file = Some(path.clone());
        }
    }
}
