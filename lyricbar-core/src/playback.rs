use crate::error::{CoreError, Result};
use crate::provider::LyricsQuery;
use crate::time::DurationExt;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Track id MPRIS reserves for "no track loaded"
const NO_TRACK_ID: &str = "NoTrack";

/// Playback status reported by the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    Stopped,
}

impl PlaybackStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Playing => "Playing",
            Self::Paused => "Paused",
            Self::Stopped => "Stopped",
        }
    }
}

impl FromStr for PlaybackStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Playing" => Ok(Self::Playing),
            "Paused" => Ok(Self::Paused),
            "Stopped" => Ok(Self::Stopped),
            other => Err(CoreError::Metadata {
                field: format!("PlaybackStatus ({other:?})"),
            }),
        }
    }
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identity of the current track, used as the lyrics cache key.
///
/// Only contains characters that are safe in a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackIdentity(String);

impl TrackIdentity {
    /// Derive an identity from a player track handle such as
    /// `/com/spotify/track/4uLU6hMCjMI75M1A2tKUQC`.
    ///
    /// Uses the last path segment. Returns `None` for empty handles and for
    /// the MPRIS `NoTrack` placeholder.
    #[must_use]
    pub fn from_track_id(track_id: &str) -> Option<Self> {
        let base = track_id.trim_end_matches('/').rsplit('/').next()?;
        if base == NO_TRACK_ID {
            return None;
        }
        Self::sanitized(base)
    }

    /// Identity for players that expose no usable track handle
    #[must_use]
    pub fn from_title(artist: &str, title: &str) -> Self {
        Self::sanitized(&format!("{artist} - {title}"))
            .unwrap_or_else(|| Self("unknown".to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn sanitized(raw: &str) -> Option<Self> {
        let cleaned: String = raw
            .trim()
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '-'
                }
            })
            .collect();

        if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
            None
        } else {
            Some(Self(cleaned))
        }
    }
}

impl fmt::Display for TrackIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata as reported by a playback source, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    /// Player-specific track handle (`mpris:trackid`)
    pub track_id: Option<String>,
    pub artists: Vec<String>,
    pub title: Option<String>,
    pub album: Option<String>,
    /// Track length (`mpris:length`)
    pub length: Option<Duration>,
}

/// Snapshot of the player taken on every wake of the sync engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackState {
    pub identity: TrackIdentity,
    pub artist: String,
    pub title: String,
    /// Album name, empty if the player does not report one
    pub album: String,
    /// Total track duration, zero if unknown
    pub duration: Duration,
    pub position: Duration,
    pub status: PlaybackStatus,
}

impl PlaybackState {
    /// Validate raw metadata into a playback snapshot.
    ///
    /// # Errors
    ///
    /// Returns `Metadata` if the title or artist is missing or empty.
    pub fn from_metadata(
        metadata: TrackMetadata,
        status: PlaybackStatus,
        position: Duration,
    ) -> Result<Self> {
        let title = metadata
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CoreError::Metadata {
                field: "xesam:title".to_string(),
            })?;

        let artist = metadata
            .artists
            .iter()
            .map(String::as_str)
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        if artist.is_empty() {
            return Err(CoreError::Metadata {
                field: "xesam:artist".to_string(),
            });
        }

        let identity = metadata
            .track_id
            .as_deref()
            .and_then(TrackIdentity::from_track_id)
            .unwrap_or_else(|| TrackIdentity::from_title(&artist, &title));

        Ok(Self {
            identity,
            artist,
            title,
            album: metadata.album.unwrap_or_default(),
            duration: metadata.length.unwrap_or_default(),
            position,
            status,
        })
    }

    /// `Artist - Title`, used whenever no lyric line is shown
    #[must_use]
    pub fn display_title(&self) -> String {
        format!("{} - {}", self.artist, self.title)
    }

    /// Playback progress in whole percent
    #[must_use]
    pub fn percentage(&self) -> u8 {
        self.position.percent_of(self.duration)
    }

    /// Build the lyrics lookup for this track
    #[must_use]
    pub fn lyrics_query(&self) -> LyricsQuery {
        let mut query = LyricsQuery::new(&self.title, &self.artist);
        if !self.album.is_empty() {
            query = query.with_album(&self.album);
        }
        if !self.duration.is_zero() {
            query = query.with_duration(self.duration.as_secs_u32());
        }
        query
    }
}
