//! Element selectors.
//!
//! A selector is a conjunction of predicates over one element type. The
//! predicates themselves are evaluated by [`crate::engine::select`]; this
//! module only holds their compiled form and the per-element tests.

use crate::model::{ElementKind, Located};
use regex::Regex;
use std::ops::RangeInclusive;

/// A compiled element selector.
#[derive(Debug, Clone)]
pub struct Selector {
    /// Element type to match
    pub element: ElementKind,

    /// Case-insensitive substring of the element's derived text (stored lowercased)
    pub text_contains: Option<String>,

    /// Regular expression the derived text must match
    pub text_matches: Option<Regex>,

    /// Positional predicate
    pub position: Option<Position>,

    /// Containment predicate
    pub within: Option<Containment>,
}

impl Selector {
    /// Match every element of a type.
    pub fn new(element: ElementKind) -> Self {
        Self {
            element,
            text_contains: None,
            text_matches: None,
            position: None,
            within: None,
        }
    }

    /// Require the derived text to contain `needle` (case-insensitive).
    pub fn containing(mut self, needle: &str) -> Self {
        self.text_contains = Some(needle.to_lowercase());
        self
    }

    /// Require the derived text to match a regex.
    pub fn matching(mut self, pattern: Regex) -> Self {
        self.text_matches = Some(pattern);
        self
    }

    /// Set the positional predicate.
    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Set the containment predicate.
    pub fn within(mut self, within: Containment) -> Self {
        self.within = Some(within);
        self
    }

    /// Whether the selector has any text predicate.
    pub fn has_text_predicate(&self) -> bool {
        self.text_contains.is_some() || self.text_matches.is_some()
    }

    /// Text predicates against an element's derived text.
    pub fn admits_text(&self, text: &str) -> bool {
        if let Some(ref needle) = self.text_contains {
            if !text.to_lowercase().contains(needle.as_str()) {
                return false;
            }
        }
        if let Some(ref re) = self.text_matches {
            if !re.is_match(text) {
                return false;
            }
        }
        true
    }
}

/// Positional predicates.
///
/// Ordinals count elements of the selected type over the whole document,
/// never over another predicate's result.
#[derive(Debug, Clone, PartialEq)]
pub enum Position {
    /// The first `n` elements (ordinals `0..n`)
    First(usize),
    /// Elements whose ordinal is in the selection
    Ordinals(OrdinalSelection),
    /// Row index within the enclosing table; negative counts from the end
    Row(i64),
    /// Column (cell) index within the row; negative counts from the end
    Column(i64),
}

impl Position {
    /// Whether a located element satisfies the predicate.
    pub fn admits(&self, located: &Located<'_>) -> bool {
        match self {
            Position::First(n) => located.ordinal < *n,
            Position::Ordinals(selection) => selection.includes(located.ordinal),
            Position::Row(k) => match (located.path.row, located.table_shape) {
                (Some(row), Some((rows, _))) => resolve_index(*k, rows) == Some(row),
                _ => false,
            },
            Position::Column(k) => match (located.path.cell, located.table_shape) {
                (Some(cell), Some((_, columns))) => resolve_index(*k, columns) == Some(cell),
                _ => false,
            },
        }
    }
}

fn resolve_index(k: i64, len: usize) -> Option<usize> {
    if k >= 0 {
        let k = k as usize;
        (k < len).then_some(k)
    } else {
        len.checked_sub(k.unsigned_abs() as usize)
    }
}

/// A set of 0-based ordinals.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum OrdinalSelection {
    /// Every ordinal
    #[default]
    All,
    /// An inclusive range
    Range(RangeInclusive<usize>),
    /// Specific ordinals, sorted
    List(Vec<usize>),
}

/// Upper bound on the positions a comma-separated selection may expand to.
pub const MAX_LISTED_ORDINALS: usize = 100_000;

impl OrdinalSelection {
    /// Check if an ordinal is selected.
    pub fn includes(&self, ordinal: usize) -> bool {
        match self {
            OrdinalSelection::All => true,
            OrdinalSelection::Range(range) => range.contains(&ordinal),
            OrdinalSelection::List(list) => list.binary_search(&ordinal).is_ok(),
        }
    }

    /// Parse a 1-based selection string (e.g., "1-18", "1,3,5-7", "all").
    ///
    /// Rule authors count from the top of the document starting at 1; the
    /// result is converted to 0-based ordinals.
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();

        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(OrdinalSelection::All);
        }

        let number = |part: &str| -> Result<usize, String> {
            let n: usize = part
                .trim()
                .parse()
                .map_err(|_| format!("invalid number '{}'", part.trim()))?;
            n.checked_sub(1)
                .ok_or_else(|| "positions are counted from 1".to_string())
        };

        // Simple range (e.g., "1-18")
        if let Some((start, end)) = s.split_once('-') {
            if !start.contains(',') && !end.contains(',') {
                let (start, end) = (number(start)?, number(end)?);
                if start > end {
                    return Err(format!("empty range '{}'", s));
                }
                return Ok(OrdinalSelection::Range(start..=end));
            }
        }

        // Comma-separated list with possible ranges
        let mut ordinals = Vec::new();
        for part in s.split(',') {
            if let Some((start, end)) = part.split_once('-') {
                let (start, end) = (number(start)?, number(end)?);
                if start > end {
                    return Err(format!("empty range '{}'", part.trim()));
                }
                if end - start >= MAX_LISTED_ORDINALS - ordinals.len().min(MAX_LISTED_ORDINALS) {
                    return Err(format!(
                        "selection '{}' lists more than {} positions",
                        s, MAX_LISTED_ORDINALS
                    ));
                }
                ordinals.extend(start..=end);
            } else {
                ordinals.push(number(part)?);
            }
        }

        ordinals.sort_unstable();
        ordinals.dedup();
        Ok(OrdinalSelection::List(ordinals))
    }
}

/// Containment predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    /// Inside a table (tables themselves included)
    Table,
    /// Outside any table
    Body,
    /// Inside the section with this index
    Section(usize),
    /// Inside the table with this ordinal (0 = first table of the document)
    TableIndex(usize),
}

impl Containment {
    /// Whether a located element satisfies the predicate.
    pub fn admits(&self, located: &Located<'_>) -> bool {
        match self {
            Containment::Table => located.path.in_table(),
            Containment::Body => !located.path.in_table(),
            Containment::Section(s) => located.path.section == *s,
            Containment::TableIndex(t) => located.table_ordinal == Some(*t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal_selection_parse() {
        let all = OrdinalSelection::parse("all").unwrap();
        assert_eq!(all, OrdinalSelection::All);

        let range = OrdinalSelection::parse("1-18").unwrap();
        assert_eq!(range, OrdinalSelection::Range(0..=17));
        assert!(range.includes(17));
        assert!(!range.includes(18));

        let mixed = OrdinalSelection::parse("1,3,5-7,10").unwrap();
        assert_eq!(mixed, OrdinalSelection::List(vec![0, 2, 4, 5, 6, 9]));
        assert!(mixed.includes(5));
        assert!(!mixed.includes(1));
    }

    #[test]
    fn test_ordinal_selection_parse_errors() {
        assert!(OrdinalSelection::parse("0-3").is_err());
        assert!(OrdinalSelection::parse("5-2").is_err());
        assert!(OrdinalSelection::parse("a,b").is_err());
        assert_eq!(
            OrdinalSelection::parse("1,7-3"),
            Err("empty range '7-3'".to_string())
        );
        assert!(OrdinalSelection::parse("1,1-4000000000").is_err());
        // A long simple range stays a range
        assert_eq!(
            OrdinalSelection::parse("1-4000000000"),
            Ok(OrdinalSelection::Range(0..=3_999_999_999))
        );
    }

    #[test]
    fn test_resolve_index() {
        assert_eq!(resolve_index(0, 3), Some(0));
        assert_eq!(resolve_index(2, 3), Some(2));
        assert_eq!(resolve_index(3, 3), None);
        assert_eq!(resolve_index(-1, 3), Some(2));
        assert_eq!(resolve_index(-3, 3), Some(0));
        assert_eq!(resolve_index(-4, 3), None);
    }

    #[test]
    fn test_admits_text() {
        let sel = Selector::new(ElementKind::Paragraph).containing("Formerly");
        assert!(sel.admits_text("ABC Corp (formerly XYZ)"));
        assert!(!sel.admits_text("ABC Corp"));

        let sel = Selector::new(ElementKind::Run).matching(Regex::new(r"[0-9$]").unwrap());
        assert!(sel.admits_text("$1,200"));
        assert!(!sel.admits_text("Total"));
    }
}
