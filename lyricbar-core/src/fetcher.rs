//! Lyrics fetcher that orchestrates the cache and lyrics providers.

use tracing::{info, warn};

use crate::cache::{CacheLookup, LyricsCache};
use crate::lrc::LyricSet;
use crate::playback::PlaybackState;
use crate::provider::{LyricsProvider, LyricsResult};

/// Outcome of resolving lyrics for one track
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LyricsLoad {
    /// Synced lyrics from the cache or a provider
    Found(LyricSet),
    /// The providers settled that there are no synced lyrics for the track
    Missing,
    /// Nothing usable this time, but a later attempt may succeed
    Retry,
}

/// Resolves the lyric set for a track: cache first, then providers in order
pub struct LyricsFetcher {
    cache: Option<LyricsCache>,
    providers: Vec<Box<dyn LyricsProvider>>,
}

impl LyricsFetcher {
    /// Create a new lyrics fetcher
    ///
    /// # Arguments
    /// * `cache` - Lyrics cache, or `None` to always ask the providers
    /// * `providers` - List of lyrics providers to try in order
    #[must_use]
    pub fn new(cache: Option<LyricsCache>, providers: Vec<Box<dyn LyricsProvider>>) -> Self {
        Self { cache, providers }
    }

    #[must_use]
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Load lyrics for the track in `state`.
    ///
    /// Only a unanimous explicit "not found" from the providers is cached.
    /// Provider errors, unparsable transcripts and unsynced lyrics yield
    /// [`LyricsLoad::Retry`] and leave the cache untouched.
    pub async fn load(&self, state: &PlaybackState) -> LyricsLoad {
        if let Some(cache) = &self.cache {
            match cache.get(&state.identity).await {
                CacheLookup::Hit(lyrics) => {
                    info!("Using cached lyrics for {}", state.display_title());
                    return LyricsLoad::Found(lyrics);
                }
                CacheLookup::NotFoundCached => {
                    info!(
                        "Lyrics previously not found for {}, skipping providers",
                        state.display_title()
                    );
                    return LyricsLoad::Missing;
                }
                CacheLookup::Miss => {}
            }
        }

        info!(
            "Fetching lyrics for: {} (providers: {:?})",
            state.display_title(),
            self.provider_names()
        );

        let query = state.lyrics_query();
        let mut confirmed_missing = !self.providers.is_empty();
        let mut transient = false;

        for provider in &self.providers {
            match provider.fetch(&query).await {
                Ok(fetched) => match fetched.result {
                    LyricsResult::Synced(raw) => match LyricSet::parse(&raw) {
                        Ok(lyrics) => {
                            info!(
                                "Found synced lyrics from {} ({} lines, provider_id: {})",
                                provider.name(),
                                lyrics.lines().len(),
                                fetched.provider_id
                            );
                            self.store(state, &lyrics).await;
                            return LyricsLoad::Found(lyrics);
                        }
                        Err(e) => {
                            warn!("Failed to parse lyrics from {}: {}", provider.name(), e);
                            confirmed_missing = false;
                            transient = true;
                        }
                    },
                    LyricsResult::Unsynced(_) => {
                        info!(
                            "Provider {} returned unsynced lyrics (not usable for sync)",
                            provider.name()
                        );
                        confirmed_missing = false;
                        transient = true;
                    }
                    LyricsResult::Empty => {
                        info!(
                            "Provider {} matched the track without lyric text (provider_id: {})",
                            provider.name(),
                            fetched.provider_id
                        );
                        confirmed_missing = false;
                    }
                    LyricsResult::NotFound => {
                        info!("Provider {} returned no lyrics", provider.name());
                    }
                },
                Err(e) => {
                    warn!("Provider {} failed with error: {}", provider.name(), e);
                    confirmed_missing = false;
                    transient = true;
                }
            }
        }

        if confirmed_missing {
            if let Some(cache) = &self.cache {
                if let Err(e) = cache.put_not_found(&state.identity).await {
                    warn!("Failed to cache lyrics-not-found marker: {}", e);
                }
            }
        }

        info!("No synced lyrics found for {}", state.display_title());
        if transient {
            LyricsLoad::Retry
        } else {
            LyricsLoad::Missing
        }
    }

    async fn store(&self, state: &PlaybackState, lyrics: &LyricSet) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(&state.identity, lyrics).await {
                warn!("Failed to cache lyrics: {}", e);
            }
        }
    }
}
