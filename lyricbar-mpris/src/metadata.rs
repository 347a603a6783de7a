//! Conversion of MPRIS metadata maps into core types.

use lyricbar_core::TrackMetadata;
use std::collections::HashMap;
use std::time::Duration;
use zbus::zvariant::{OwnedValue, Value};

const TRACK_ID: &str = "mpris:trackid";
const LENGTH: &str = "mpris:length";
const ARTIST: &str = "xesam:artist";
const TITLE: &str = "xesam:title";
const ALBUM: &str = "xesam:album";

/// Extract the fields lyricbar uses from an `org.mpris.MediaPlayer2.Player.Metadata` map.
///
/// Missing or mistyped entries are left empty; validation happens when the
/// metadata is turned into a playback state.
#[must_use]
pub fn parse_metadata(map: &HashMap<String, OwnedValue>) -> TrackMetadata {
    TrackMetadata {
        track_id: map.get(TRACK_ID).and_then(|v| as_string(v)),
        artists: map.get(ARTIST).map(|v| as_strings(v)).unwrap_or_default(),
        title: map.get(TITLE).and_then(|v| as_string(v)),
        album: map.get(ALBUM).and_then(|v| as_string(v)),
        length: map.get(LENGTH).and_then(|v| as_micros(v)),
    }
}

/// MPRIS positions and lengths are signed microseconds; negatives clamp to zero
#[must_use]
pub fn micros_to_duration(micros: i64) -> Duration {
    Duration::from_micros(u64::try_from(micros).unwrap_or(0))
}

fn as_string(value: &Value<'_>) -> Option<String> {
    match value {
        Value::Str(s) => Some(s.as_str().to_string()),
        Value::ObjectPath(p) => Some(p.as_str().to_string()),
        Value::Value(inner) => as_string(inner),
        _ => None,
    }
}

fn as_strings(value: &Value<'_>) -> Vec<String> {
    match value {
        Value::Array(array) => array.iter().filter_map(as_string).collect(),
        Value::Value(inner) => as_strings(inner),
        other => as_string(other).into_iter().collect(),
    }
}

fn as_micros(value: &Value<'_>) -> Option<Duration> {
    match value {
        Value::I64(us) => Some(micros_to_duration(*us)),
        Value::U64(us) => Some(Duration::from_micros(*us)),
        Value::I32(us) => Some(micros_to_duration(i64::from(*us))),
        Value::U32(us) => Some(Duration::from_micros(u64::from(*us))),
        Value::Value(inner) => as_micros(inner),
        _ => None,
    }
}
