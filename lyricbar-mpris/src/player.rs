//! `org.mpris.MediaPlayer2.Player` proxy and player discovery.

use crate::error::Result;
use lyricbar_core::PlaybackStatus;
use std::collections::HashMap;
use zbus::zvariant::OwnedValue;
use zbus::Connection;

/// Bus-name prefix shared by all MPRIS players
pub const MPRIS_PREFIX: &str = "org.mpris.MediaPlayer2.";

/// Object path every MPRIS player exports
pub const MPRIS_PATH: &str = "/org/mpris/MediaPlayer2";

pub const PLAYER_INTERFACE: &str = "org.mpris.MediaPlayer2.Player";

#[zbus::proxy(
    interface = "org.mpris.MediaPlayer2.Player",
    default_path = "/org/mpris/MediaPlayer2",
    gen_blocking = false
)]
pub trait Player {
    fn play_pause(&self) -> zbus::Result<()>;

    #[zbus(property)]
    fn playback_status(&self) -> zbus::Result<String>;

    #[zbus(property)]
    fn metadata(&self) -> zbus::Result<HashMap<String, OwnedValue>>;

    /// Position in microseconds
    #[zbus(property)]
    fn position(&self) -> zbus::Result<i64>;
}

/// List bus names of running MPRIS players, sorted.
///
/// # Errors
///
/// Returns an error if the bus daemon cannot be queried.
pub async fn list_players(connection: &Connection) -> Result<Vec<String>> {
    let dbus = zbus::fdo::DBusProxy::new(connection).await?;
    let mut names: Vec<String> = dbus
        .list_names()
        .await?
        .into_iter()
        .map(|name| name.as_str().to_string())
        .filter(|name| name.starts_with(MPRIS_PREFIX))
        .collect();
    names.sort();
    Ok(names)
}

/// Players whose bus name contains `filter` (case-insensitive), in bus order
#[must_use]
pub fn matching_players<'a>(names: &'a [String], filter: Option<&str>) -> Vec<&'a str> {
    let filter = filter.map(str::to_lowercase);
    names
        .iter()
        .map(String::as_str)
        .filter(|name| {
            filter
                .as_deref()
                .is_none_or(|f| name.to_lowercase().contains(f))
        })
        .collect()
}

/// Pick the first candidate that is playing, falling back to the first one
#[must_use]
pub fn prefer_playing<'a>(candidates: &[(&'a str, Option<PlaybackStatus>)]) -> Option<&'a str> {
    candidates
        .iter()
        .find(|(_, status)| *status == Some(PlaybackStatus::Playing))
        .or_else(|| candidates.first())
        .map(|(name, _)| *name)
}
