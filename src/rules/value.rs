//! Property values and text case transforms.

use crate::model::Alignment;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;

/// A property value as read from a document or declared in a rule.
///
/// Serialized untagged, so reports show plain JSON scalars.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// No value (unset property, or the property does not exist on the element)
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Alignment(Alignment),
    Case(TextCase),
    /// Contained runs or paragraphs disagree; holds the distinct values in order
    Mixed(Vec<Value>),
}

impl Value {
    /// A measurement read from the model, rounded to absorb f32 noise.
    pub fn measure(x: f32) -> Self {
        Value::Number((x as f64 * 10_000.0).round() / 10_000.0)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_alignment(&self) -> Option<Alignment> {
        match self {
            Value::Alignment(a) => Some(*a),
            _ => None,
        }
    }

    pub fn as_case(&self) -> Option<TextCase> {
        match self {
            Value::Case(c) => Some(*c),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("none"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) if n.fract() == 0.0 => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "'{}'", s),
            Value::Alignment(a) => write!(f, "{}", a),
            Value::Case(c) => write!(f, "{}", c),
            Value::Mixed(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "mixed({})", parts.join(", "))
            }
        }
    }
}

/// Case transforms for the `text_case` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextCase {
    Upper,
    Lower,
    Title,
}

impl TextCase {
    pub fn as_str(self) -> &'static str {
        match self {
            TextCase::Upper => "upper",
            TextCase::Lower => "lower",
            TextCase::Title => "title",
        }
    }

    /// Transform a whole string.
    pub fn apply(self, text: &str) -> String {
        self.apply_from(text, true).0
    }

    /// Transform a fragment that may continue a word from a previous fragment.
    ///
    /// `at_word_start` tells whether the fragment begins a new word; the
    /// returned flag is the same state after the fragment, so runs of one
    /// paragraph can be transformed one at a time.
    pub fn apply_from(self, text: &str, at_word_start: bool) -> (String, bool) {
        match self {
            TextCase::Upper => (text.to_uppercase(), ends_at_word_start(text, at_word_start)),
            TextCase::Lower => (text.to_lowercase(), ends_at_word_start(text, at_word_start)),
            TextCase::Title => {
                let mut out = String::with_capacity(text.len());
                let mut word_start = at_word_start;
                for ch in text.chars() {
                    if ch.is_whitespace() {
                        out.push(ch);
                        word_start = true;
                    } else if word_start {
                        out.extend(ch.to_uppercase());
                        word_start = false;
                    } else {
                        out.extend(ch.to_lowercase());
                    }
                }
                (out, word_start)
            }
        }
    }

    /// Whether `text` already has this case.
    ///
    /// Both sides are NFC-normalized first so that decomposed input does not
    /// fail on representation alone.
    pub fn is_satisfied_by(self, text: &str) -> bool {
        let canonical: String = text.nfc().collect();
        let transformed: String = self.apply(&canonical).nfc().collect();
        canonical == transformed
    }
}

fn ends_at_word_start(text: &str, at_word_start: bool) -> bool {
    text.chars()
        .last()
        .map(char::is_whitespace)
        .unwrap_or(at_word_start)
}

impl fmt::Display for TextCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextCase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upper" | "uppercase" => Ok(TextCase::Upper),
            "lower" | "lowercase" => Ok(TextCase::Lower),
            "title" | "titlecase" => Ok(TextCase::Title),
            other => Err(format!("unknown text case '{}'", other)),
        }
    }
}
