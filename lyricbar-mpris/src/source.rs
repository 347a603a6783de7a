//! [`PlaybackSource`] backed by an MPRIS player on the session bus.

use crate::error::{MprisError, Result};
use crate::metadata::{micros_to_duration, parse_metadata};
use crate::player::{
    list_players, matching_players, prefer_playing, PlayerProxy, MPRIS_PATH, MPRIS_PREFIX,
    PLAYER_INTERFACE,
};
use async_trait::async_trait;
use futures::stream::{select_all, StreamExt};
use lyricbar_core::{
    ChangeNotifications, CoreError, PlaybackSource, PlaybackStatus, TrackMetadata,
};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};
use zbus::message::Type as MessageType;
use zbus::proxy::CacheProperties;
use zbus::{Connection, MatchRule, MessageStream};

/// Capacity of the change-notification channel; bursts beyond it are coalesced
const NOTIFICATION_BUFFER: usize = 16;

/// Follows one MPRIS player, rediscovering it whenever it disappears
pub struct MprisSource {
    connection: Connection,
    filter: Option<String>,
    player: Option<PlayerProxy<'static>>,
}

impl MprisSource {
    /// Connect to the session bus.
    ///
    /// `filter` restricts which players are followed (case-insensitive
    /// substring of the bus name).
    ///
    /// # Errors
    ///
    /// Returns an error if the session bus is unreachable.
    pub async fn connect(filter: Option<String>) -> Result<Self> {
        let connection = Connection::session().await?;
        debug!("Connected to session bus");
        Ok(Self {
            connection,
            filter: filter.filter(|f| !f.trim().is_empty()),
            player: None,
        })
    }

    /// Bus name of the player currently followed, if any
    #[must_use]
    pub fn player_name(&self) -> Option<String> {
        self.player
            .as_ref()
            .map(|p| p.inner().destination().to_string())
    }

    async fn proxy(&self, name: &str) -> Result<PlayerProxy<'static>> {
        Ok(PlayerProxy::builder(&self.connection)
            .destination(name.to_string())?
            .cache_properties(CacheProperties::No)
            .build()
            .await?)
    }

    /// Choose among the matching players, preferring one that is playing
    async fn discover(&self) -> Result<PlayerProxy<'static>> {
        let names = list_players(&self.connection).await?;
        let candidates = matching_players(&names, self.filter.as_deref());

        let mut statuses = Vec::with_capacity(candidates.len());
        if candidates.len() > 1 {
            for name in &candidates {
                let status = match self.proxy(name).await?.playback_status().await {
                    Ok(status) => status.parse::<PlaybackStatus>().ok(),
                    Err(e) => {
                        debug!("Skipping status of {}: {}", name, e);
                        None
                    }
                };
                statuses.push((*name, status));
            }
        } else {
            statuses.extend(candidates.iter().map(|name| (*name, None)));
        }

        let name = prefer_playing(&statuses).ok_or_else(|| MprisError::NoPlayer {
            filter: self.filter.clone(),
        })?;
        let proxy = self.proxy(name).await?;
        info!("Following MPRIS player {}", name);
        Ok(proxy)
    }

    async fn player(&mut self) -> Result<&PlayerProxy<'static>> {
        if self.player.is_none() {
            self.player = Some(self.discover().await?);
        }
        self.player.as_ref().ok_or(MprisError::NoPlayer {
            filter: self.filter.clone(),
        })
    }

    /// Drop the current player after a failed call so the next query rediscovers
    fn forget_player(&mut self, err: &zbus::Error) {
        if let Some(name) = self.player_name() {
            debug!("Lost MPRIS player {}: {}", name, err);
        }
        self.player = None;
    }

    async fn signal_streams(&self) -> Result<Vec<MessageStream>> {
        let properties = MatchRule::builder()
            .msg_type(MessageType::Signal)
            .interface("org.freedesktop.DBus.Properties")?
            .member("PropertiesChanged")?
            .path(MPRIS_PATH)?
            .arg(0, PLAYER_INTERFACE)?
            .build();
        let seeked = MatchRule::builder()
            .msg_type(MessageType::Signal)
            .interface(PLAYER_INTERFACE)?
            .member("Seeked")?
            .path(MPRIS_PATH)?
            .build();
        let owners = MatchRule::builder()
            .msg_type(MessageType::Signal)
            .sender("org.freedesktop.DBus")?
            .interface("org.freedesktop.DBus")?
            .member("NameOwnerChanged")?
            .arg0ns(MPRIS_PREFIX.trim_end_matches('.'))?
            .build();

        let mut streams = Vec::with_capacity(3);
        for rule in [properties, seeked, owners] {
            streams.push(
                MessageStream::for_match_rule(rule, &self.connection, Some(NOTIFICATION_BUFFER))
                    .await?,
            );
        }
        Ok(streams)
    }
}

#[async_trait]
impl PlaybackSource for MprisSource {
    fn name(&self) -> &'static str {
        "mpris"
    }

    async fn position(&mut self) -> lyricbar_core::Result<Duration> {
        let result = self.player().await?.position().await;
        match result {
            Ok(micros) => Ok(micros_to_duration(micros)),
            Err(e) => {
                self.forget_player(&e);
                Err(MprisError::from(e).into())
            }
        }
    }

    async fn metadata(&mut self) -> lyricbar_core::Result<TrackMetadata> {
        let result = self.player().await?.metadata().await;
        match result {
            Ok(map) => Ok(parse_metadata(&map)),
            Err(e) => {
                self.forget_player(&e);
                Err(MprisError::from(e).into())
            }
        }
    }

    async fn playback_status(&mut self) -> lyricbar_core::Result<PlaybackStatus> {
        let result = self.player().await?.playback_status().await;
        match result {
            Ok(status) => status.parse(),
            Err(e) => {
                self.forget_player(&e);
                Err(MprisError::from(e).into())
            }
        }
    }

    async fn subscribe(&mut self) -> lyricbar_core::Result<ChangeNotifications> {
        let mut signals = select_all(self.signal_streams().await?.into_iter().map(Box::pin));
        let (tx, rx) = mpsc::channel(NOTIFICATION_BUFFER);

        tokio::spawn(async move {
            while let Some(message) = signals.next().await {
                if let Err(e) = message {
                    warn!("Error on MPRIS signal stream: {}", e);
                    continue;
                }
                match tx.try_send(()) {
                    Ok(()) | Err(TrySendError::Full(())) => {}
                    Err(TrySendError::Closed(())) => break,
                }
            }
            debug!("MPRIS signal forwarding stopped");
        });

        Ok(rx)
    }

    async fn play_pause(&mut self) -> lyricbar_core::Result<()> {
        let result = self.player().await?.play_pause().await;
        result.map_err(|e| {
            self.forget_player(&e);
            CoreError::from(MprisError::from(e))
        })
    }
}
