//! Paragraph and text-level types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A paragraph of text content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Paragraph alignment
    #[serde(default)]
    pub alignment: Alignment,

    /// Text runs in the paragraph
    #[serde(default)]
    pub runs: Vec<Run>,
}

impl Paragraph {
    /// Create a new empty paragraph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a paragraph with a single unstyled run.
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut p = Self::new();
        p.add_run(Run::new(text));
        p
    }

    /// Set alignment and return self.
    pub fn align(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Add a run.
    pub fn add_run(&mut self, run: Run) {
        self.runs.push(run);
    }

    /// Add a run and return self.
    pub fn run(mut self, run: Run) -> Self {
        self.runs.push(run);
        self
    }

    /// Derived text: the concatenation of all run texts.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Check if the paragraph has no text.
    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(Run::is_empty)
    }
}

/// A run of text with consistent formatting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// The text content
    pub text: String,

    /// Font name (None = inherited from the style)
    #[serde(default)]
    pub font_name: Option<String>,

    /// Font size in points (None = inherited from the style)
    #[serde(default)]
    pub font_size: Option<f32>,

    /// Bold text
    #[serde(default)]
    pub bold: bool,

    /// Italic text
    #[serde(default)]
    pub italic: bool,
}

impl Run {
    /// Create a new run with inherited formatting.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Set font name and size and return self.
    pub fn font(mut self, name: impl Into<String>, size: f32) -> Self {
        self.font_name = Some(name.into());
        self.font_size = Some(size);
        self
    }

    /// Set bold and return self.
    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    /// Set italic and return self.
    pub fn italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }

    /// Check if this run is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Paragraph alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// No explicit alignment; renders left-aligned
    #[default]
    Unset,
    /// Left alignment
    Left,
    /// Center alignment
    Center,
    /// Right alignment
    Right,
    /// Justified alignment
    Justify,
}

impl Alignment {
    /// The alignment a renderer would actually use.
    pub fn effective(self) -> Self {
        match self {
            Alignment::Unset => Alignment::Left,
            other => other,
        }
    }

    /// Lowercase name as used in rule files.
    pub fn as_str(self) -> &'static str {
        match self {
            Alignment::Unset => "unset",
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Alignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unset" => Ok(Alignment::Unset),
            "left" => Ok(Alignment::Left),
            "center" | "centre" => Ok(Alignment::Center),
            "right" => Ok(Alignment::Right),
            "justify" | "justified" => Ok(Alignment::Justify),
            other => Err(format!("unknown alignment '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_plain_text() {
        let p = Paragraph::new()
            .run(Run::new("Hello "))
            .run(Run::new("world").bold(true))
            .run(Run::new("!"));

        assert_eq!(p.plain_text(), "Hello world!");
        assert!(!p.is_empty());
    }

    #[test]
    fn test_alignment_effective() {
        assert_eq!(Alignment::Unset.effective(), Alignment::Left);
        assert_eq!(Alignment::Center.effective(), Alignment::Center);
    }

    #[test]
    fn test_alignment_parse() {
        assert_eq!("Center".parse::<Alignment>().unwrap(), Alignment::Center);
        assert_eq!("justified".parse::<Alignment>().unwrap(), Alignment::Justify);
        assert!("middle".parse::<Alignment>().is_err());
    }

    #[test]
    fn test_run_deserialize_defaults() {
        let run: Run = serde_json::from_str(r#"{"text": "abc"}"#).unwrap();
        assert_eq!(run.text, "abc");
        assert!(run.font_size.is_none());
        assert!(!run.bold);
    }
}
