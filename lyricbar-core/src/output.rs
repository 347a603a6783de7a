//! JSON payloads for status bars and the sinks that receive them.

use crate::error::Result;
use serde::Serialize;
use std::io::{self, Stdout, Write};

/// CSS class(es) attached to the module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Class {
    One(String),
    Many(Vec<String>),
}

impl Class {
    #[must_use]
    pub fn one(class: impl Into<String>) -> Self {
        Self::One(class.into())
    }

    #[must_use]
    pub fn many(classes: &[&str]) -> Self {
        Self::Many(classes.iter().map(ToString::to_string).collect())
    }

    /// Whether `class` is one of the attached classes
    #[must_use]
    pub fn contains(&self, class: &str) -> bool {
        match self {
            Self::One(c) => c == class,
            Self::Many(cs) => cs.iter().any(|c| c == class),
        }
    }
}

/// One Waybar custom-module payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleOutput {
    pub text: String,
    pub alt: String,
    pub class: Class,
    pub tooltip: String,
    /// Playback progress, 0-100
    pub percentage: u8,
}

/// A single write to the output sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    /// Empty object: hides the module
    Blank,
    Module(ModuleOutput),
}

impl Emission {
    /// Serialize as a single JSON line (without trailing newline)
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        match self {
            Self::Blank => Ok("{}".to_string()),
            Self::Module(output) => Ok(serde_json::to_string(output)?),
        }
    }

    #[must_use]
    pub fn module(&self) -> Option<&ModuleOutput> {
        match self {
            Self::Blank => None,
            Self::Module(output) => Some(output),
        }
    }
}

/// Consumer of emissions
pub trait OutputSink: Send {
    /// Deliver one emission.
    ///
    /// # Errors
    ///
    /// Returns an error if the emission cannot be written.
    fn emit(&mut self, emission: &Emission) -> Result<()>;
}

/// Writes one JSON object per line and flushes after each
pub struct JsonLineSink<W> {
    writer: W,
}

impl JsonLineSink<Stdout> {
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonLineSink<W> {
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> OutputSink for JsonLineSink<W> {
    fn emit(&mut self, emission: &Emission) -> Result<()> {
        let line = emission.to_json()?;
        writeln!(self.writer, "{line}")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Collects emissions in memory
impl OutputSink for Vec<Emission> {
    fn emit(&mut self, emission: &Emission) -> Result<()> {
        self.push(emission.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(class: Class) -> ModuleOutput {
        ModuleOutput {
            text: "Line & more".to_string(),
            alt: "lyric".to_string(),
            class,
            tooltip: "<b>Line</b>".to_string(),
            percentage: 42,
        }
    }

    #[test]
    fn test_blank_is_empty_object() {
        assert_eq!(Emission::Blank.to_json().unwrap(), "{}");
    }

    #[test]
    fn test_module_json_with_single_class() {
        let json = Emission::Module(output(Class::one("info"))).to_json().unwrap();
        assert_eq!(
            json,
            r#"{"text":"Line & more","alt":"lyric","class":"info","tooltip":"<b>Line</b>","percentage":42}"#
        );
    }

    #[test]
    fn test_module_json_with_class_list() {
        let json = Emission::Module(output(Class::many(&["playing", "lyric"])))
            .to_json()
            .unwrap();
        assert!(json.contains(r#""class":["playing","lyric"]"#));
    }

    #[test]
    fn test_class_contains() {
        assert!(Class::one("info").contains("info"));
        assert!(Class::many(&["playing", "music"]).contains("music"));
        assert!(!Class::many(&["playing"]).contains("info"));
    }

    #[test]
    fn test_json_line_sink_writes_one_line_per_emission() {
        let mut sink = JsonLineSink::new(Vec::new());
        sink.emit(&Emission::Blank).unwrap();
        sink.emit(&Emission::Module(output(Class::one("info")))).unwrap();

        let written = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<_> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "{}");
        assert!(lines[1].starts_with(r#"{"text":"Line & more""#));
    }
}
