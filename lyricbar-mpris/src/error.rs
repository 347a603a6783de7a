use lyricbar_core::CoreError;
use thiserror::Error;

/// Errors raised while talking to MPRIS players over D-Bus.
#[derive(Debug, Error)]
pub enum MprisError {
    /// No `org.mpris.MediaPlayer2.*` name matching the filter is on the bus.
    #[error("no MPRIS player found{}", filter_suffix(.filter.as_deref()))]
    NoPlayer { filter: Option<String> },

    /// D-Bus connection or method call failed.
    #[error("D-Bus error: {0}")]
    DBus(#[from] zbus::Error),

    /// Standard D-Bus interface error (e.g. the player vanished mid-call).
    #[error("D-Bus error: {0}")]
    Fdo(#[from] zbus::fdo::Error),
}

fn filter_suffix(filter: Option<&str>) -> String {
    filter.map_or_else(String::new, |f| format!(" matching {f:?}"))
}

impl From<MprisError> for CoreError {
    fn from(err: MprisError) -> Self {
        Self::PlayerUnavailable {
            reason: err.to_string(),
        }
    }
}

/// Convenience type alias for Results with `MprisError`.
pub type Result<T> = std::result::Result<T, MprisError>;
