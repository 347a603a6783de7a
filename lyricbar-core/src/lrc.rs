use crate::error::{CoreError, Result};
use std::time::Duration;

/// Upper bound for a parsed timestamp in milliseconds (well beyond any real track)
const MAX_TIMESTAMP_MILLIS: f64 = 1.0e15;

/// A single line of lyrics with timing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricLine {
    pub timestamp: Duration,
    pub text: String,
}

impl LyricLine {
    pub fn new(timestamp: Duration, text: impl Into<String>) -> Self {
        Self {
            timestamp,
            text: text.into(),
        }
    }

    /// Whether this line is an instrumental gap (no text)
    #[must_use]
    pub fn is_gap(&self) -> bool {
        self.text.is_empty()
    }
}

/// Where the playback position falls within a lyric set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCursor {
    /// Position is before the first line's timestamp
    PreFirst,
    /// Index of the active line
    OnLine(usize),
}

/// Ordered, non-empty sequence of synchronized lines for one track.
///
/// Lines are kept in transcript order; the set never re-sorts them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricSet {
    lines: Vec<LyricLine>,
}

impl LyricSet {
    /// Wrap already-parsed lines.
    ///
    /// # Errors
    ///
    /// Returns `NoLinesFound` if `lines` is empty.
    pub fn new(lines: Vec<LyricLine>) -> Result<Self> {
        if lines.is_empty() {
            return Err(CoreError::NoLinesFound);
        }
        Ok(Self { lines })
    }

    /// Parse a timestamped transcript (`[mm:ss.xx]text` per line).
    ///
    /// Lines without a closing `]` or with an unparsable timestamp are dropped.
    ///
    /// # Errors
    ///
    /// Returns `NoLinesFound` if no line survives parsing.
    pub fn parse(input: &str) -> Result<Self> {
        Self::new(input.lines().filter_map(parse_line).collect())
    }

    #[must_use]
    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&LyricLine> {
        self.lines.get(index)
    }

    /// Find the active line for a playback position.
    ///
    /// A line becomes active once the position has moved past its timestamp.
    #[must_use]
    pub fn cursor_at(&self, position: Duration) -> LineCursor {
        match self.lines.partition_point(|line| line.timestamp < position) {
            0 => LineCursor::PreFirst,
            started => LineCursor::OnLine(started - 1),
        }
    }

    /// Timestamp of the line following `cursor`, if any
    #[must_use]
    pub fn next_timestamp(&self, cursor: LineCursor) -> Option<Duration> {
        let next = match cursor {
            LineCursor::PreFirst => 0,
            LineCursor::OnLine(index) => index + 1,
        };
        self.lines.get(next).map(|line| line.timestamp)
    }

    /// Lines around `index` for display, clipped to the set bounds.
    ///
    /// Returns the index of the first returned line together with the slice.
    #[must_use]
    pub fn window(&self, index: usize, before: usize, after: usize) -> (usize, &[LyricLine]) {
        let index = index.min(self.lines.len() - 1);
        let start = index.saturating_sub(before);
        let end = index
            .saturating_add(after)
            .saturating_add(1)
            .min(self.lines.len());
        (start, &self.lines[start..end])
    }

    /// The first `count` lines
    #[must_use]
    pub fn leading(&self, count: usize) -> &[LyricLine] {
        &self.lines[..count.min(self.lines.len())]
    }
}

/// Parse a timestamp like `mm:ss.xx` or `hh:mm:ss.fff`.
///
/// The rightmost group is seconds; every group to its left is worth 60 times
/// the group after it. The result is rounded to whole milliseconds.
///
/// # Errors
///
/// Returns `InvalidTimestamp` if any group is not a number or the total is
/// negative or out of range.
pub fn parse_timestamp(input: &str) -> Result<Duration> {
    let invalid = || CoreError::InvalidTimestamp {
        timestamp: input.to_string(),
    };

    let mut seconds = 0.0_f64;
    let mut unit = 1.0_f64;
    for group in input.split(':').rev() {
        let value: f64 = group.trim().parse().map_err(|_| invalid())?;
        seconds += value * unit;
        unit *= 60.0;
    }

    let millis = (seconds * 1000.0).round();
    if !millis.is_finite() || !(0.0..=MAX_TIMESTAMP_MILLIS).contains(&millis) {
        return Err(invalid());
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let millis = millis as u64;
    Ok(Duration::from_millis(millis))
}

/// Parse a single `[timestamp]text` line
fn parse_line(line: &str) -> Option<LyricLine> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let (stamp, text) = line.split_once(']')?;
    let stamp = stamp.strip_prefix('[').unwrap_or(stamp);
    let timestamp = parse_timestamp(stamp).ok()?;

    Some(LyricLine::new(timestamp, text.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LyricSet {
        LyricSet::new(vec![
            LyricLine::new(Duration::from_secs(0), "A"),
            LyricLine::new(Duration::from_secs(10), "B"),
            LyricLine::new(Duration::from_secs(20), "C"),
        ])
        .unwrap()
    }

    #[test]
    fn test_parse_simple_transcript() {
        let set = LyricSet::parse("[00:12.50]Hello\n[01:05]World").unwrap();
        assert_eq!(set.lines().len(), 2);
        assert_eq!(set.lines()[0].timestamp, Duration::from_millis(12_500));
        assert_eq!(set.lines()[0].text, "Hello");
        assert_eq!(set.lines()[1].timestamp, Duration::from_secs(65));
        assert_eq!(set.lines()[1].text, "World");
    }

    #[test]
    fn test_line_without_bracket_dropped() {
        let input = r"
[00:05.00]First
no timestamp here
[00:10.00]Second
";
        let set = LyricSet::parse(input).unwrap();
        assert_eq!(set.lines().len(), 2);
        assert_eq!(set.lines()[0].text, "First");
        assert_eq!(set.lines()[1].text, "Second");
    }

    #[test]
    fn test_id_tags_dropped() {
        let input = "[ti:Song Title]\n[ar:Artist]\n[00:01.00]Lyric";
        let set = LyricSet::parse(input).unwrap();
        assert_eq!(set.lines().len(), 1);
        assert_eq!(set.lines()[0].text, "Lyric");
    }

    #[test]
    fn test_empty_input_has_no_lines() {
        assert!(matches!(LyricSet::parse(""), Err(CoreError::NoLinesFound)));
        assert!(matches!(
            LyricSet::parse("just text\nmore text"),
            Err(CoreError::NoLinesFound)
        ));
    }

    #[test]
    fn test_empty_text_kept_as_gap() {
        let set = LyricSet::parse("[00:01.00]Intro\n[00:04.00]\n[00:08.00]Verse").unwrap();
        assert_eq!(set.lines().len(), 3);
        assert!(set.lines()[1].is_gap());
    }

    #[test]
    fn test_parse_cjk_lyrics() {
        let set = LyricSet::parse("[00:05.00]你好世界").unwrap();
        assert_eq!(set.lines()[0].text, "你好世界");
    }

    #[test]
    fn test_transcript_order_preserved() {
        let set = LyricSet::parse("[00:10.00]Later\n[00:05.00]Earlier").unwrap();
        assert_eq!(set.lines()[0].text, "Later");
        assert_eq!(set.lines()[1].text, "Earlier");
    }

    #[test]
    fn test_parse_timestamp_groups() {
        assert_eq!(
            parse_timestamp("01:02:03.4").unwrap(),
            Duration::from_millis(3_723_400)
        );
        assert_eq!(parse_timestamp("02:03").unwrap(), Duration::from_secs(123));
        assert_eq!(parse_timestamp("7.25").unwrap(), Duration::from_millis(7250));
        assert_eq!(parse_timestamp("00:02.30").unwrap(), Duration::from_millis(2300));
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("0a:12").is_err());
        assert!(parse_timestamp("").is_err());
        assert!(parse_timestamp("-5.0").is_err());
        assert!(parse_timestamp("00:-10").is_err());
        assert!(parse_timestamp("inf").is_err());
    }

    #[test]
    fn test_cursor_at() {
        let set = sample();
        assert_eq!(set.cursor_at(Duration::from_secs(15)), LineCursor::OnLine(1));
        assert_eq!(set.cursor_at(Duration::ZERO), LineCursor::PreFirst);
        assert_eq!(set.cursor_at(Duration::from_secs(25)), LineCursor::OnLine(2));
        assert_eq!(set.cursor_at(Duration::from_millis(1)), LineCursor::OnLine(0));
        assert_eq!(set.cursor_at(Duration::from_secs(10)), LineCursor::OnLine(0));
    }

    #[test]
    fn test_next_timestamp() {
        let set = sample();
        assert_eq!(set.next_timestamp(LineCursor::PreFirst), Some(Duration::ZERO));
        assert_eq!(
            set.next_timestamp(LineCursor::OnLine(1)),
            Some(Duration::from_secs(20))
        );
        assert_eq!(set.next_timestamp(LineCursor::OnLine(2)), None);
    }

    #[test]
    fn test_window_clipped() {
        let lines = (0..10)
            .map(|i| LyricLine::new(Duration::from_secs(i), format!("Line {i}")))
            .collect();
        let set = LyricSet::new(lines).unwrap();

        let (start, window) = set.window(1, 2, 5);
        assert_eq!(start, 0);
        assert_eq!(window.len(), 7);

        let (start, window) = set.window(5, 2, 5);
        assert_eq!(start, 3);
        assert_eq!(window.len(), 7);
        assert_eq!(window[0].text, "Line 3");
        assert_eq!(window[6].text, "Line 9");

        let (start, window) = set.window(9, 2, 5);
        assert_eq!(start, 7);
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn test_leading() {
        let set = sample();
        assert_eq!(set.leading(2).len(), 2);
        assert_eq!(set.leading(10).len(), 3);
    }
}
