//! Builds module payloads from playback state and lyrics.

use crate::config::DisplayConfig;
use crate::lrc::{LyricLine, LyricSet};
use crate::output::{Class, ModuleOutput};
use crate::playback::PlaybackState;
use std::fmt::Write;

/// Glyph shown in the tooltip for instrumental gaps and as the pre-first header
pub const MUSIC_GLYPH: &str = "󰝚 ";

const ELLIPSIS: &str = "...";

pub const ALT_PAUSED: &str = "paused";
pub const ALT_PLAYING: &str = "playing";
pub const ALT_LYRIC: &str = "lyric";
pub const ALT_MUSIC: &str = "music";

pub const CLASS_INFO: &str = "info";
pub const CLASS_PLAYING: &str = "playing";
pub const CLASS_LYRIC: &str = "lyric";
pub const CLASS_MUSIC: &str = "music";

/// Formats payloads according to the display settings
#[derive(Debug, Clone)]
pub struct Renderer {
    max_length: usize,
    tooltip_lines: usize,
    before: usize,
    after: usize,
    color: String,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(&DisplayConfig::default())
    }
}

impl Renderer {
    #[must_use]
    pub fn new(display: &DisplayConfig) -> Self {
        Self {
            max_length: display.max_length,
            tooltip_lines: display.tooltip_lines,
            before: display.tooltip_before,
            after: display.tooltip_after,
            color: display.tooltip_color.clone(),
        }
    }

    /// Player is paused: show the track
    #[must_use]
    pub fn paused(&self, state: &PlaybackState) -> ModuleOutput {
        self.info(state, ALT_PAUSED)
    }

    /// Playing, but no synced lyrics are available
    #[must_use]
    pub fn no_lyrics(&self, state: &PlaybackState) -> ModuleOutput {
        self.info(state, ALT_PLAYING)
    }

    /// Playing, before the first lyric line has started
    #[must_use]
    pub fn pre_first(&self, state: &PlaybackState, lyrics: &LyricSet) -> ModuleOutput {
        let mut tooltip = format!("<b><big>{MUSIC_GLYPH}</big></b>\n");
        let _ = write!(tooltip, "<span foreground=\"{}\">", escape_markup(&self.color));
        let body = lyrics
            .leading(self.tooltip_lines)
            .iter()
            .map(tooltip_text)
            .collect::<Vec<_>>()
            .join("\n");
        tooltip.push_str(&body);
        tooltip.push_str("</span>");

        ModuleOutput {
            text: escape_markup(&self.truncate(&state.display_title())),
            alt: ALT_MUSIC.to_string(),
            class: Class::many(&[CLASS_PLAYING, CLASS_MUSIC]),
            tooltip,
            percentage: state.percentage(),
        }
    }

    /// Playing with line `index` active.
    ///
    /// An instrumental gap shows the track title instead of an empty bar.
    #[must_use]
    pub fn on_line(&self, state: &PlaybackState, lyrics: &LyricSet, index: usize) -> ModuleOutput {
        let (start, window) = lyrics.window(index, self.before, self.after);
        let tooltip = window
            .iter()
            .enumerate()
            .map(|(offset, line)| {
                let text = tooltip_text(line);
                if start + offset == index {
                    format!("<b>{text}</b>")
                } else {
                    format!(
                        "<span foreground=\"{}\">{text}</span>",
                        escape_markup(&self.color)
                    )
                }
            })
            .collect::<Vec<_>>()
            .join("\n");

        let active = lyrics.get(index).filter(|line| !line.is_gap());
        let (text, alt, class) = match active {
            Some(line) => (
                self.truncate(&line.text),
                ALT_LYRIC,
                Class::many(&[CLASS_PLAYING, CLASS_LYRIC]),
            ),
            None => (
                self.truncate(&state.display_title()),
                ALT_MUSIC,
                Class::many(&[CLASS_PLAYING, CLASS_MUSIC]),
            ),
        };

        ModuleOutput {
            text: escape_markup(&text),
            alt: alt.to_string(),
            class,
            tooltip,
            percentage: state.percentage(),
        }
    }

    fn info(&self, state: &PlaybackState, alt: &str) -> ModuleOutput {
        ModuleOutput {
            text: escape_markup(&self.truncate(&state.display_title())),
            alt: alt.to_string(),
            class: Class::one(CLASS_INFO),
            tooltip: String::new(),
            percentage: state.percentage(),
        }
    }

    /// Cut `input` to `max_length` characters, marking the cut with `...`
    #[must_use]
    pub fn truncate(&self, input: &str) -> String {
        truncate(input, self.max_length)
    }
}

/// Character-aware truncation. A limit of 0 disables truncation.
#[must_use]
pub fn truncate(input: &str, limit: usize) -> String {
    if limit == 0 || input.chars().count() <= limit {
        return input.to_string();
    }
    if limit > ELLIPSIS.len() {
        let mut cut: String = input.chars().take(limit - ELLIPSIS.len()).collect();
        cut.push_str(ELLIPSIS);
        cut
    } else {
        input.chars().take(limit).collect()
    }
}

/// Escape text for Pango markup
#[must_use]
pub fn escape_markup(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn tooltip_text(line: &LyricLine) -> String {
    if line.is_gap() {
        MUSIC_GLYPH.to_string()
    } else {
        escape_markup(&line.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::{PlaybackStatus, TrackMetadata};
    use std::time::Duration;

    fn state() -> PlaybackState {
        let metadata = TrackMetadata {
            track_id: Some("/track/1".to_string()),
            artists: vec!["Artist".to_string()],
            title: Some("Title".to_string()),
            album: None,
            length: Some(Duration::from_secs(100)),
        };
        PlaybackState::from_metadata(metadata, PlaybackStatus::Playing, Duration::from_secs(25))
            .unwrap()
    }

    fn lyrics(count: u64) -> LyricSet {
        LyricSet::new(
            (0..count)
                .map(|i| LyricLine::new(Duration::from_secs(i * 10), format!("Line {i}")))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
        assert_eq!(truncate("日本語の歌詞です", 6), "日本語...");
        assert_eq!(truncate("abcdef", 2), "ab");
        assert_eq!(truncate("abcdef", 0), "abcdef");
    }

    #[test]
    fn test_escape_markup() {
        assert_eq!(
            escape_markup(r#"Rock & <Roll> "it's""#),
            "Rock &amp; &lt;Roll&gt; &quot;it&#39;s&quot;"
        );
    }

    #[test]
    fn test_paused_payload() {
        let output = Renderer::default().paused(&state());
        assert_eq!(output.text, "Artist - Title");
        assert_eq!(output.alt, ALT_PAUSED);
        assert_eq!(output.class, Class::one(CLASS_INFO));
        assert_eq!(output.percentage, 25);
    }

    #[test]
    fn test_no_lyrics_payload() {
        let output = Renderer::default().no_lyrics(&state());
        assert_eq!(output.text, "Artist - Title");
        assert_eq!(output.alt, ALT_PLAYING);
        assert!(output.class.contains(CLASS_INFO));
    }

    #[test]
    fn test_on_line_tooltip_window() {
        let output = Renderer::default().on_line(&state(), &lyrics(12), 4);
        assert_eq!(output.text, "Line 4");
        assert_eq!(output.alt, ALT_LYRIC);
        assert_eq!(output.class, Class::many(&[CLASS_PLAYING, CLASS_LYRIC]));

        let rows: Vec<_> = output.tooltip.lines().collect();
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[0], "<span foreground=\"#cccccc\">Line 2</span>");
        assert_eq!(rows[2], "<b>Line 4</b>");
        assert_eq!(rows[7], "<span foreground=\"#cccccc\">Line 9</span>");
    }

    #[test]
    fn test_on_line_window_clipped_at_start() {
        let output = Renderer::default().on_line(&state(), &lyrics(3), 0);
        let rows: Vec<_> = output.tooltip.lines().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], "<b>Line 0</b>");
    }

    #[test]
    fn test_gap_line_falls_back_to_title() {
        let set = LyricSet::new(vec![
            LyricLine::new(Duration::from_secs(1), "Sing"),
            LyricLine::new(Duration::from_secs(5), ""),
        ])
        .unwrap();
        let output = Renderer::default().on_line(&state(), &set, 1);
        assert_eq!(output.text, "Artist - Title");
        assert_eq!(output.alt, ALT_MUSIC);
        assert!(output.tooltip.ends_with(&format!("<b>{MUSIC_GLYPH}</b>")));
    }

    #[test]
    fn test_pre_first_tooltip_uses_leading_lines() {
        let output = Renderer::default().pre_first(&state(), &lyrics(20));
        assert_eq!(output.alt, ALT_MUSIC);
        assert_eq!(output.class, Class::many(&[CLASS_PLAYING, CLASS_MUSIC]));
        assert!(output.tooltip.starts_with("<b><big>󰝚 </big></b>\n<span"));
        assert!(output.tooltip.contains("Line 7"));
        assert!(!output.tooltip.contains("Line 8"));
        assert!(output.tooltip.ends_with("</span>"));
    }

    #[test]
    fn test_lyric_text_is_escaped_and_truncated() {
        let display = DisplayConfig {
            max_length: 8,
            ..DisplayConfig::default()
        };
        let set = LyricSet::new(vec![LyricLine::new(Duration::ZERO, "Tom & Jerry forever")])
            .unwrap();
        let output = Renderer::new(&display).on_line(&state(), &set, 0);
        assert_eq!(output.text, "Tom &amp;...");
    }
}
