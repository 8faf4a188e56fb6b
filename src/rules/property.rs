//! The closed registry of checkable properties.
//!
//! Every property a rule may check or fix is a [`Property`] variant, and
//! every read or write of a document property goes through
//! [`Property::read`] and [`Property::write`]. Adding a property means
//! adding a variant here; the compiler then points at every match that
//! needs a new arm.

use super::Value;
use crate::model::{Document, Element, ElementKind, ElementMut, ElementPath, Paragraph, Run};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A checkable, fixable document property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    Alignment,
    FontName,
    FontSize,
    Bold,
    Italic,
    RowHeight,
    CellMarginLeft,
    CellMarginRight,
    CellMarginTop,
    CellMarginBottom,
    ColumnWidth,
    TextCase,
}

/// The type of value a property holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Alignment,
    Text,
    Number,
    Bool,
    Case,
}

/// Result of reading a property from an element.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    /// The element has a value for the property
    Value(Value),
    /// The property applies, but the element holds nothing it could be read from
    /// (a font check on a paragraph without runs)
    Vacuous,
    /// The property does not exist on this kind of element
    NotApplicable,
}

/// Why a property could not be written.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WriteError {
    #[error("{property} cannot be set on a {kind} element")]
    NotApplicable { property: Property, kind: ElementKind },

    #[error("{property} expects a {expected:?} value, got {got}")]
    TypeMismatch {
        property: Property,
        expected: ValueKind,
        got: Value,
    },

    #[error("{kind} element has no runs to carry {property}")]
    NoRuns { property: Property, kind: ElementKind },

    #[error("{kind} element has no paragraphs to carry {property}")]
    NoParagraphs { property: Property, kind: ElementKind },

    #[error("column {column} does not exist")]
    MissingColumn { column: usize },
}

impl Property {
    /// All properties, in vocabulary order.
    pub const ALL: [Property; 12] = [
        Property::Alignment,
        Property::FontName,
        Property::FontSize,
        Property::Bold,
        Property::Italic,
        Property::RowHeight,
        Property::CellMarginLeft,
        Property::CellMarginRight,
        Property::CellMarginTop,
        Property::CellMarginBottom,
        Property::ColumnWidth,
        Property::TextCase,
    ];

    /// Name as used in rule files.
    pub fn as_str(self) -> &'static str {
        match self {
            Property::Alignment => "alignment",
            Property::FontName => "font_name",
            Property::FontSize => "font_size",
            Property::Bold => "bold",
            Property::Italic => "italic",
            Property::RowHeight => "row_height",
            Property::CellMarginLeft => "cell_margin_left",
            Property::CellMarginRight => "cell_margin_right",
            Property::CellMarginTop => "cell_margin_top",
            Property::CellMarginBottom => "cell_margin_bottom",
            Property::ColumnWidth => "column_width",
            Property::TextCase => "text_case",
        }
    }

    /// Type of the values this property holds.
    pub fn value_kind(self) -> ValueKind {
        match self {
            Property::Alignment => ValueKind::Alignment,
            Property::FontName => ValueKind::Text,
            Property::FontSize
            | Property::RowHeight
            | Property::CellMarginLeft
            | Property::CellMarginRight
            | Property::CellMarginTop
            | Property::CellMarginBottom
            | Property::ColumnWidth => ValueKind::Number,
            Property::Bold | Property::Italic => ValueKind::Bool,
            Property::TextCase => ValueKind::Case,
        }
    }

    /// Whether the property is a physical measurement compared with tolerance.
    pub fn is_measurement(self) -> bool {
        self.value_kind() == ValueKind::Number
    }

    /// Whether the property exists on elements of `kind`.
    pub fn applies_to(self, kind: ElementKind) -> bool {
        use ElementKind as K;
        match self {
            Property::Alignment => matches!(kind, K::Paragraph | K::Cell),
            Property::FontName | Property::FontSize | Property::Bold | Property::Italic => true,
            Property::RowHeight => matches!(kind, K::Row | K::Cell),
            Property::CellMarginLeft
            | Property::CellMarginRight
            | Property::CellMarginTop
            | Property::CellMarginBottom
            | Property::ColumnWidth => kind == K::Cell,
            Property::TextCase => true,
        }
    }

    /// Where the property of the element at `path` is actually stored.
    ///
    /// Font and case live on runs, alignment on paragraphs, row height on
    /// the row and column width on the table's column, so a rule on a
    /// container and a rule on one of its parts can target the same value.
    /// Empty when the property does not apply or nothing stores it.
    pub fn storage(self, document: &Document, path: &ElementPath) -> Vec<ElementPath> {
        if !self.applies_to(path.kind) {
            return Vec::new();
        }
        match self {
            Property::Alignment => document.contained(path, ElementKind::Paragraph),
            Property::FontName
            | Property::FontSize
            | Property::Bold
            | Property::Italic
            | Property::TextCase => document.contained(path, ElementKind::Run),
            Property::RowHeight => path
                .row
                .map(|row| vec![ElementPath::table(path.section, path.block).row(row)])
                .unwrap_or_default(),
            Property::CellMarginLeft
            | Property::CellMarginRight
            | Property::CellMarginTop
            | Property::CellMarginBottom => vec![*path],
            Property::ColumnWidth => path
                .cell
                .map(|column| {
                    vec![ElementPath::table(path.section, path.block)
                        .row(0)
                        .cell(column)]
                })
                .unwrap_or_default(),
        }
    }

    /// Read the property from an element.
    ///
    /// Run-level properties read on a container aggregate over the
    /// contained runs: a uniform value is returned as is, disagreeing runs
    /// give [`Value::Mixed`].
    pub fn read(self, element: &Element<'_>) -> Reading {
        if !self.applies_to(element.kind()) {
            return Reading::NotApplicable;
        }

        match self {
            Property::Alignment => {
                let paragraphs: Vec<&Paragraph> = match element {
                    Element::Paragraph(p) => vec![*p],
                    _ => element
                        .table_cell()
                        .map(|c| c.paragraphs.iter().collect())
                        .unwrap_or_default(),
                };
                aggregate(
                    paragraphs
                        .iter()
                        .map(|p| Value::Alignment(p.alignment.effective())),
                )
            }
            Property::FontName => aggregate(element.runs().into_iter().map(|r| {
                r.font_name
                    .clone()
                    .map(Value::Text)
                    .unwrap_or(Value::Null)
            })),
            Property::FontSize => aggregate(
                element
                    .runs()
                    .into_iter()
                    .map(|r| r.font_size.map(Value::measure).unwrap_or(Value::Null)),
            ),
            Property::Bold => aggregate(element.runs().into_iter().map(|r| Value::Bool(r.bold))),
            Property::Italic => {
                aggregate(element.runs().into_iter().map(|r| Value::Bool(r.italic)))
            }
            Property::RowHeight => element
                .table_row()
                .map(|r| Reading::Value(r.height.map(Value::measure).unwrap_or(Value::Null)))
                .unwrap_or(Reading::NotApplicable),
            Property::CellMarginLeft
            | Property::CellMarginRight
            | Property::CellMarginTop
            | Property::CellMarginBottom => element
                .table_cell()
                .map(|c| {
                    let m = c.margins;
                    let v = match self {
                        Property::CellMarginLeft => m.left,
                        Property::CellMarginRight => m.right,
                        Property::CellMarginTop => m.top,
                        _ => m.bottom,
                    };
                    Reading::Value(Value::measure(v))
                })
                .unwrap_or(Reading::NotApplicable),
            Property::ColumnWidth => match *element {
                Element::Cell { table, column, .. } => Reading::Value(
                    table
                        .column_width(column)
                        .map(Value::measure)
                        .unwrap_or(Value::Null),
                ),
                _ => Reading::NotApplicable,
            },
            Property::TextCase => Reading::Value(Value::Text(element.plain_text())),
        }
    }

    /// Write `value` to the property of an element.
    ///
    /// Only the targeted property changes; run-level properties written on a
    /// container fan out to every contained run.
    pub fn write(self, element: &mut ElementMut<'_>, value: &Value) -> Result<(), WriteError> {
        self.write_continuing(element, value, true)
    }

    /// Like [`Property::write`], for an element whose text continues
    /// earlier text. `at_word_start` tells a title case whether the first
    /// character begins a word.
    pub fn write_continuing(
        self,
        element: &mut ElementMut<'_>,
        value: &Value,
        at_word_start: bool,
    ) -> Result<(), WriteError> {
        let kind = element.kind();
        if !self.applies_to(kind) {
            return Err(WriteError::NotApplicable {
                property: self,
                kind,
            });
        }
        let mismatch = || WriteError::TypeMismatch {
            property: self,
            expected: self.value_kind(),
            got: value.clone(),
        };

        match self {
            Property::Alignment => {
                let alignment = value.as_alignment().ok_or_else(mismatch)?;
                let mut paragraphs = element.paragraphs_mut();
                if paragraphs.is_empty() {
                    return Err(WriteError::NoParagraphs {
                        property: self,
                        kind,
                    });
                }
                for p in paragraphs.iter_mut() {
                    p.alignment = alignment;
                }
            }
            Property::FontName => {
                let name = value.as_str().ok_or_else(mismatch)?;
                set_runs(self, element, |r| r.font_name = Some(name.to_string()))?;
            }
            Property::FontSize => {
                let size = value.as_f64().ok_or_else(mismatch)? as f32;
                set_runs(self, element, |r| r.font_size = Some(size))?;
            }
            Property::Bold => {
                let bold = value.as_bool().ok_or_else(mismatch)?;
                set_runs(self, element, |r| r.bold = bold)?;
            }
            Property::Italic => {
                let italic = value.as_bool().ok_or_else(mismatch)?;
                set_runs(self, element, |r| r.italic = italic)?;
            }
            Property::RowHeight => {
                let height = value.as_f64().ok_or_else(mismatch)? as f32;
                match element {
                    ElementMut::Row { table, row } | ElementMut::Cell { table, row, .. } => {
                        table.rows[*row].height = Some(height);
                    }
                    _ => {
                        return Err(WriteError::NotApplicable {
                            property: self,
                            kind,
                        })
                    }
                }
            }
            Property::CellMarginLeft
            | Property::CellMarginRight
            | Property::CellMarginTop
            | Property::CellMarginBottom => {
                let margin = value.as_f64().ok_or_else(mismatch)? as f32;
                let ElementMut::Cell { table, row, column } = element else {
                    return Err(WriteError::NotApplicable {
                        property: self,
                        kind,
                    });
                };
                let margins = &mut table.rows[*row].cells[*column].margins;
                match self {
                    Property::CellMarginLeft => margins.left = margin,
                    Property::CellMarginRight => margins.right = margin,
                    Property::CellMarginTop => margins.top = margin,
                    _ => margins.bottom = margin,
                }
            }
            Property::ColumnWidth => {
                let width = value.as_f64().ok_or_else(mismatch)? as f32;
                let ElementMut::Cell { table, column, .. } = element else {
                    return Err(WriteError::NotApplicable {
                        property: self,
                        kind,
                    });
                };
                if !table.set_column_width(*column, width) {
                    return Err(WriteError::MissingColumn { column: *column });
                }
            }
            Property::TextCase => {
                let case = value.as_case().ok_or_else(mismatch)?;
                let mut at_word_start = at_word_start;
                for run in element.runs_mut() {
                    let (text, state) = case.apply_from(&run.text, at_word_start);
                    run.text = text;
                    at_word_start = state;
                }
            }
        }
        Ok(())
    }
}

fn set_runs(
    property: Property,
    element: &mut ElementMut<'_>,
    mut f: impl FnMut(&mut Run),
) -> Result<(), WriteError> {
    let kind = element.kind();
    let mut runs = element.runs_mut();
    if runs.is_empty() {
        return Err(WriteError::NoRuns { property, kind });
    }
    for run in runs.iter_mut() {
        f(run);
    }
    Ok(())
}

fn aggregate(values: impl Iterator<Item = Value>) -> Reading {
    let mut distinct: Vec<Value> = Vec::new();
    for value in values {
        if !distinct.contains(&value) {
            distinct.push(value);
        }
    }
    match distinct.len() {
        0 => Reading::Vacuous,
        1 => Reading::Value(distinct.remove(0)),
        _ => Reading::Value(Value::Mixed(distinct)),
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Property {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Property::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == name)
            .ok_or_else(|| format!("unknown property '{}'", s))
    }
}
