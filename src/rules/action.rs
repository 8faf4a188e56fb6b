//! Fix actions.
//!
//! A fix action names a verb and its target values. The corrector never
//! interprets verbs directly: each action decomposes into property
//! assignments that go through the property registry.

use super::{Property, TextCase, Value};
use crate::model::Alignment;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An operation that sets one or more properties to target values.
#[derive(Debug, Clone, PartialEq)]
pub enum FixAction {
    SetAlignment(Alignment),
    SetFont {
        name: Option<String>,
        size: Option<f64>,
    },
    SetBold(bool),
    SetItalic(bool),
    SetRowHeight(f64),
    SetCellMargin {
        side: MarginSide,
        value: f64,
    },
    SetColumnWidth(f64),
    SetTextCase(TextCase),
}

impl FixAction {
    /// Verbs accepted in rule files.
    pub const VERBS: [&'static str; 8] = [
        "set_alignment",
        "set_font",
        "set_bold",
        "set_italic",
        "set_row_height",
        "set_cell_margin",
        "set_column_width",
        "set_text_case",
    ];

    /// The verb of this action.
    pub fn verb(&self) -> &'static str {
        match self {
            FixAction::SetAlignment(_) => "set_alignment",
            FixAction::SetFont { .. } => "set_font",
            FixAction::SetBold(_) => "set_bold",
            FixAction::SetItalic(_) => "set_italic",
            FixAction::SetRowHeight(_) => "set_row_height",
            FixAction::SetCellMargin { .. } => "set_cell_margin",
            FixAction::SetColumnWidth(_) => "set_column_width",
            FixAction::SetTextCase(_) => "set_text_case",
        }
    }

    /// The property assignments this action performs, in application order.
    pub fn assignments(&self) -> Vec<(Property, Value)> {
        match self {
            FixAction::SetAlignment(a) => vec![(Property::Alignment, Value::Alignment(*a))],
            FixAction::SetFont { name, size } => {
                let mut out = Vec::with_capacity(2);
                if let Some(name) = name {
                    out.push((Property::FontName, Value::Text(name.clone())));
                }
                if let Some(size) = size {
                    out.push((Property::FontSize, Value::Number(*size)));
                }
                out
            }
            FixAction::SetBold(b) => vec![(Property::Bold, Value::Bool(*b))],
            FixAction::SetItalic(i) => vec![(Property::Italic, Value::Bool(*i))],
            FixAction::SetRowHeight(h) => vec![(Property::RowHeight, Value::Number(*h))],
            FixAction::SetCellMargin { side, value } => side
                .properties()
                .iter()
                .map(|p| (*p, Value::Number(*value)))
                .collect(),
            FixAction::SetColumnWidth(w) => vec![(Property::ColumnWidth, Value::Number(*w))],
            FixAction::SetTextCase(c) => vec![(Property::TextCase, Value::Case(*c))],
        }
    }

    /// The value this action assigns to `property`, if it targets it.
    pub fn target(&self, property: Property) -> Option<Value> {
        self.assignments()
            .into_iter()
            .find(|(p, _)| *p == property)
            .map(|(_, v)| v)
    }
}

impl fmt::Display for FixAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .assignments()
            .iter()
            .map(|(p, v)| format!("{}={}", p, v))
            .collect();
        write!(f, "{}({})", self.verb(), parts.join(", "))
    }
}

/// Which cell margins a `set_cell_margin` action sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginSide {
    Left,
    Right,
    Top,
    Bottom,
    #[default]
    All,
}

impl MarginSide {
    pub fn properties(self) -> &'static [Property] {
        match self {
            MarginSide::Left => &[Property::CellMarginLeft],
            MarginSide::Right => &[Property::CellMarginRight],
            MarginSide::Top => &[Property::CellMarginTop],
            MarginSide::Bottom => &[Property::CellMarginBottom],
            MarginSide::All => &[
                Property::CellMarginLeft,
                Property::CellMarginRight,
                Property::CellMarginTop,
                Property::CellMarginBottom,
            ],
        }
    }
}

impl FromStr for MarginSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(MarginSide::Left),
            "right" => Ok(MarginSide::Right),
            "top" => Ok(MarginSide::Top),
            "bottom" => Ok(MarginSide::Bottom),
            "all" => Ok(MarginSide::All),
            other => Err(format!("unknown margin side '{}'", other)),
        }
    }
}
