//! Playback source trait.

use crate::error::Result;
use crate::playback::{PlaybackState, PlaybackStatus, TrackMetadata};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;

/// Stream of "something changed" wake-ups from a playback source.
///
/// Notifications carry no payload; receivers always re-query the source.
pub type ChangeNotifications = mpsc::Receiver<()>;

/// Trait for media players that supply playback state.
///
/// Implementations may reconnect lazily: every query is allowed to fail while
/// the player is gone and succeed again once it reappears.
#[async_trait]
pub trait PlaybackSource: Send {
    /// Returns a human-readable name for this source.
    fn name(&self) -> &'static str;

    /// Current playback position.
    ///
    /// # Errors
    ///
    /// Returns `PlayerUnavailable` if no player can be reached.
    async fn position(&mut self) -> Result<Duration>;

    /// Metadata of the current track.
    ///
    /// # Errors
    ///
    /// Returns an error if the player cannot be reached or reports malformed metadata.
    async fn metadata(&mut self) -> Result<TrackMetadata>;

    /// Current playback status.
    ///
    /// # Errors
    ///
    /// Returns an error if the player cannot be reached or reports an unknown status.
    async fn playback_status(&mut self) -> Result<PlaybackStatus>;

    /// Subscribe to change notifications (track, status, seeks).
    ///
    /// # Errors
    ///
    /// Returns an error if the notification stream cannot be set up.
    async fn subscribe(&mut self) -> Result<ChangeNotifications>;

    /// Toggle between playing and paused.
    ///
    /// # Errors
    ///
    /// Returns an error if the player cannot be reached.
    async fn play_pause(&mut self) -> Result<()>;

    /// Query position, metadata and status and validate them into one snapshot.
    ///
    /// # Errors
    ///
    /// Returns the first query error, or `Metadata` if required fields are missing.
    async fn snapshot(&mut self) -> Result<PlaybackState> {
        let position = self.position().await?;
        let metadata = self.metadata().await?;
        let status = self.playback_status().await?;
        PlaybackState::from_metadata(metadata, status, position)
    }
}
