use crate::error::{CoreError, Result};
use crate::lrc::{LyricLine, LyricSet};
use crate::playback::TrackIdentity;
use crate::time::DurationExt;
use std::fmt::Write;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, warn};

/// Extension of positive records (`<millis>,<text>` per line)
const LYRICS_EXTENSION: &str = "csv";

/// Extension of negative markers (presence-only)
const NOT_FOUND_EXTENSION: &str = "notfound";

/// Outcome of a cache lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// Lyrics were cached for this track
    Hit(LyricSet),
    /// Nothing usable is cached; the caller may ask a provider
    Miss,
    /// A previous lookup confirmed there are no lyrics; do not ask again
    NotFoundCached,
}

/// File-based lyrics cache, one record per track identity.
///
/// Records never expire; they are only removed by [`LyricsCache::invalidate`].
#[derive(Debug, Clone)]
pub struct LyricsCache {
    dir: PathBuf,
}

impl Default for LyricsCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LyricsCache {
    /// Create a cache at the default location
    #[must_use]
    pub fn new() -> Self {
        Self::open(crate::paths::lyrics_cache_dir())
    }

    /// Use a specific cache directory. The directory is created on first write.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        debug!("Using lyrics cache directory {:?}", dir);
        Self { dir }
    }

    /// Look up lyrics for a track.
    ///
    /// Never fails: unreadable or corrupt records are logged and reported as a miss.
    pub async fn get(&self, identity: &TrackIdentity) -> CacheLookup {
        let marker = self.not_found_path(identity);
        if fs::try_exists(&marker).await.unwrap_or(false) {
            debug!("Negative cache hit for {}", identity);
            return CacheLookup::NotFoundCached;
        }

        let path = self.lyrics_path(identity);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No cached lyrics for {}", identity);
                return CacheLookup::Miss;
            }
            Err(e) => {
                warn!("Failed to read cached lyrics {:?}: {}", path, e);
                return CacheLookup::Miss;
            }
        };

        match decode_record(&content) {
            Ok(lyrics) => {
                debug!(
                    "Using cached lyrics for {} ({} lines)",
                    identity,
                    lyrics.lines().len()
                );
                CacheLookup::Hit(lyrics)
            }
            Err(e) => {
                warn!("Ignoring unusable cache record {:?}: {}", path, e);
                CacheLookup::Miss
            }
        }
    }

    /// Store lyrics for a track, replacing any previous record.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory or record cannot be written.
    pub async fn put(&self, identity: &TrackIdentity, lyrics: &LyricSet) -> Result<()> {
        info!(
            "Storing lyrics in cache: {} ({} lines)",
            identity,
            lyrics.lines().len()
        );
        fs::create_dir_all(&self.dir).await?;

        // Write to a sibling file first so readers never observe a partial record
        let path = self.lyrics_path(identity);
        let staging = path.with_extension(format!("{LYRICS_EXTENSION}.tmp"));
        fs::write(&staging, encode_record(lyrics)).await?;
        fs::rename(&staging, &path).await?;
        Ok(())
    }

    /// Record that no lyrics exist for a track.
    ///
    /// # Errors
    ///
    /// Returns an error if the marker cannot be created.
    pub async fn put_not_found(&self, identity: &TrackIdentity) -> Result<()> {
        info!("Caching lyrics-not-found marker for {}", identity);
        fs::create_dir_all(&self.dir).await?;
        fs::write(self.not_found_path(identity), b"").await?;
        Ok(())
    }

    /// Remove every cached record for a track.
    ///
    /// Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing record cannot be deleted.
    pub async fn invalidate(&self, identity: &TrackIdentity) -> Result<bool> {
        let mut removed = false;
        for path in [self.lyrics_path(identity), self.not_found_path(identity)] {
            match fs::remove_file(&path).await {
                Ok(()) => {
                    info!("Removed cache record {:?}", path);
                    removed = true;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    }

    fn lyrics_path(&self, identity: &TrackIdentity) -> PathBuf {
        self.dir
            .join(format!("{}.{LYRICS_EXTENSION}", identity.as_str()))
    }

    fn not_found_path(&self, identity: &TrackIdentity) -> PathBuf {
        self.dir
            .join(format!("{}.{NOT_FOUND_EXTENSION}", identity.as_str()))
    }
}

/// Serialize lyrics as `<millis>,<text>` lines
fn encode_record(lyrics: &LyricSet) -> String {
    let mut output = String::new();
    for line in lyrics.lines() {
        let _ = writeln!(output, "{},{}", line.timestamp.as_millis_u64(), line.text);
    }
    output
}

/// Parse a positive record. Lines without a comma are skipped.
fn decode_record(content: &str) -> Result<LyricSet> {
    let mut lines = Vec::new();
    for row in content.lines() {
        let Some((millis, text)) = row.split_once(',') else {
            continue;
        };
        let millis: u64 = millis
            .trim()
            .parse()
            .map_err(|_| CoreError::InvalidTimestamp {
                timestamp: millis.to_string(),
            })?;
        lines.push(LyricLine::new(Duration::from_millis(millis), text));
    }
    LyricSet::new(lines)
}
