pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod lock;
pub mod lrc;
pub mod output;
pub mod paths;
pub mod playback;
pub mod provider;
pub mod render;
pub mod source;
pub mod sync;
pub mod time;

pub use cache::{CacheLookup, LyricsCache};
pub use config::{
    DisplayConfig, LoggingConfig, LyricbarConfig, LyricsConfig, LyricsProviderType, MusicConfig,
    CONFIG_TEMPLATE,
};
pub use error::{CoreError, Result};
pub use fetcher::{LyricsFetcher, LyricsLoad};
pub use lock::InstanceLock;
pub use lrc::{parse_timestamp, LineCursor, LyricLine, LyricSet};
pub use output::{Class, Emission, JsonLineSink, ModuleOutput, OutputSink};
pub use paths::{
    config_dir, config_path, lock_path, lyrics_cache_dir, CONFIG_DIR_NAME, CONFIG_FILE_NAME,
    LOCK_FILE_NAME, LYRICS_CACHE_DIR_NAME,
};
pub use playback::{PlaybackState, PlaybackStatus, TrackIdentity, TrackMetadata};
pub use provider::{FetchedLyrics, LyricsProvider, LyricsQuery, LyricsResult};
pub use render::Renderer;
pub use source::{ChangeNotifications, PlaybackSource};
pub use sync::SyncEngine;
pub use time::DurationExt;
