pub mod error;
pub mod metadata;
pub mod player;
pub mod source;

pub use error::MprisError;
pub use metadata::parse_metadata;
pub use player::{list_players, matching_players, prefer_playing, PlayerProxy};
pub use source::MprisSource;
