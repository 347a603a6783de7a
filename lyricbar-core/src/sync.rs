//! The lyric synchronization loop.

use crate::error::{CoreError, Result};
use crate::fetcher::{LyricsFetcher, LyricsLoad};
use crate::lrc::{LineCursor, LyricSet};
use crate::output::{Emission, ModuleOutput, OutputSink};
use crate::playback::{PlaybackState, PlaybackStatus, TrackIdentity};
use crate::render::Renderer;
use crate::source::{ChangeNotifications, PlaybackSource};
use std::future;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Shortest delay until the next scheduled wake
pub const MIN_DEADLINE: Duration = Duration::from_millis(5);

/// Minimum spacing between lyric lookups for a track whose last lookup failed
pub const LYRICS_RETRY_INTERVAL: Duration = Duration::from_secs(15);

/// What the engine last emitted, used to suppress duplicate payloads
#[derive(Debug, Default)]
struct EngineState {
    last_track: Option<TrackIdentity>,
    last_status: Option<PlaybackStatus>,
    last_cursor: Option<LineCursor>,
    lyrics_unavailable: bool,
    blank_emitted: bool,
    /// Set while the current track's lookup failed transiently
    retry_at: Option<Instant>,
}

impl EngineState {
    /// Forget the emission history so the next state is shown again
    fn reset_emissions(&mut self) {
        self.last_cursor = None;
        self.lyrics_unavailable = false;
    }
}

#[derive(Debug, Clone, Copy)]
enum Wake {
    Heartbeat,
    Notification,
    Deadline,
}

/// Tracks a playback source and emits the active lyric line to a sink
pub struct SyncEngine<S, O> {
    source: S,
    sink: O,
    fetcher: LyricsFetcher,
    renderer: Renderer,
    heartbeat: Duration,
    state: EngineState,
    lyrics: Option<LyricSet>,
}

impl<S: PlaybackSource, O: OutputSink> SyncEngine<S, O> {
    #[must_use]
    pub fn new(
        source: S,
        sink: O,
        fetcher: LyricsFetcher,
        renderer: Renderer,
        heartbeat: Duration,
    ) -> Self {
        Self {
            source,
            sink,
            fetcher,
            renderer,
            heartbeat,
            state: EngineState::default(),
            lyrics: None,
        }
    }

    #[must_use]
    pub const fn sink(&self) -> &O {
        &self.sink
    }

    #[must_use]
    pub const fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Run until `cancel` fires.
    ///
    /// Wakes on the heartbeat, on change notifications from the source, and
    /// when the next lyric line is due.
    ///
    /// # Errors
    ///
    /// Returns an error if the output sink fails.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<()> {
        let mut notifications = match self.source.subscribe().await {
            Ok(rx) => Some(rx),
            Err(e) => {
                warn!(
                    "Change notifications from {} unavailable, relying on heartbeat: {}",
                    self.source.name(),
                    e
                );
                None
            }
        };

        let mut heartbeat = time::interval(self.heartbeat);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut deadline: Option<Instant> = None;

        info!(
            "Sync engine started (source: {}, heartbeat: {:?})",
            self.source.name(),
            self.heartbeat
        );

        loop {
            let reason = tokio::select! {
                () = cancel.cancelled() => break,
                received = next_notification(&mut notifications) => {
                    if received.is_none() {
                        warn!("Change notification channel closed, relying on heartbeat");
                        notifications = None;
                        continue;
                    }
                    Wake::Notification
                }
                () = sleep_until(deadline) => {
                    if deadline.is_some_and(|d| Instant::now() < d) {
                        continue;
                    }
                    Wake::Deadline
                }
                _ = heartbeat.tick() => Wake::Heartbeat,
            };

            trace!("Wake: {:?}", reason);
            deadline = self.wake().await?.map(|delay| Instant::now() + delay);
        }

        info!("Sync engine stopped");
        Ok(())
    }

    /// Query the source once, emit if the visible state changed, and return
    /// the delay until the next lyric line starts (if one is pending).
    ///
    /// # Errors
    ///
    /// Returns an error if the output sink fails.
    pub async fn wake(&mut self) -> Result<Option<Duration>> {
        let playback = match self.source.snapshot().await {
            Ok(playback) => playback,
            Err(e) => {
                if matches!(e, CoreError::PlayerUnavailable { .. }) {
                    debug!("No player: {}", e);
                } else {
                    debug!("Unusable player state: {}", e);
                }
                self.state.last_status = None;
                self.state.reset_emissions();
                self.emit_blank()?;
                return Ok(None);
            }
        };

        let track_changed = self.state.last_track.as_ref() != Some(&playback.identity);
        if track_changed {
            info!(
                "Track changed: {} [{}]",
                playback.display_title(),
                playback.identity
            );
            self.load_lyrics(&playback).await;
            self.state.last_track = Some(playback.identity.clone());
            self.state.reset_emissions();
        } else if playback.status == PlaybackStatus::Playing
            && self.state.retry_at.is_some_and(|at| Instant::now() >= at)
        {
            debug!("Retrying lyrics lookup for {}", playback.display_title());
            self.load_lyrics(&playback).await;
        }

        let status_changed = self.state.last_status != Some(playback.status);
        if status_changed {
            info!("Playback status: {}", playback.status);
            self.state.last_status = Some(playback.status);
            self.state.reset_emissions();
        }

        match playback.status {
            PlaybackStatus::Stopped => {
                self.emit_blank()?;
                Ok(None)
            }
            PlaybackStatus::Paused => {
                if track_changed || status_changed {
                    let output = self.renderer.paused(&playback);
                    self.emit(output)?;
                }
                Ok(None)
            }
            PlaybackStatus::Playing => self.sync_playing(&playback),
        }
    }

    async fn load_lyrics(&mut self, playback: &PlaybackState) {
        self.state.retry_at = None;
        self.lyrics = match self.fetcher.load(playback).await {
            LyricsLoad::Found(lyrics) => Some(lyrics),
            LyricsLoad::Missing => None,
            LyricsLoad::Retry => {
                self.state.retry_at = Some(Instant::now() + LYRICS_RETRY_INTERVAL);
                None
            }
        };
    }

    fn sync_playing(&mut self, playback: &PlaybackState) -> Result<Option<Duration>> {
        let Some(lyrics) = self.lyrics.as_ref() else {
            if !self.state.lyrics_unavailable {
                self.state.lyrics_unavailable = true;
                let output = self.renderer.no_lyrics(playback);
                self.emit(output)?;
            }
            return Ok(None);
        };

        let cursor = lyrics.cursor_at(playback.position);
        let delay = lyrics
            .next_timestamp(cursor)
            .map(|next| next.saturating_sub(playback.position).max(MIN_DEADLINE));

        if self.state.last_cursor != Some(cursor) {
            let output = match cursor {
                LineCursor::PreFirst => self.renderer.pre_first(playback, lyrics),
                LineCursor::OnLine(index) => {
                    if let Some(line) = lyrics.get(index) {
                        debug!("Line {}: {}", index, line.text);
                    }
                    self.renderer.on_line(playback, lyrics, index)
                }
            };
            self.state.last_cursor = Some(cursor);
            self.emit(output)?;
        }

        if let Some(delay) = delay {
            trace!("Next line in {:?}", delay);
        }
        Ok(delay)
    }

    fn emit(&mut self, output: ModuleOutput) -> Result<()> {
        self.state.blank_emitted = false;
        self.sink.emit(&Emission::Module(output))
    }

    fn emit_blank(&mut self) -> Result<()> {
        if self.state.blank_emitted {
            return Ok(());
        }
        self.state.blank_emitted = true;
        self.sink.emit(&Emission::Blank)
    }
}

async fn next_notification(notifications: &mut Option<ChangeNotifications>) -> Option<()> {
    match notifications {
        Some(rx) => rx.recv().await,
        None => future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}
