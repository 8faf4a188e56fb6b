//! Positional element references.
//!
//! Rules never hold live handles into a document. An [`ElementPath`] is a
//! plain index tuple that stays valid across validate, correct and
//! re-validate because corrections never insert, remove or reorder
//! paragraphs, tables, rows, cells or runs.

use super::{Paragraph, Run, Table, TableCell, TableRow};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The element types a selector can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Paragraph,
    Run,
    Table,
    Row,
    Cell,
}

impl ElementKind {
    /// Lowercase name as used in rule files.
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Paragraph => "paragraph",
            ElementKind::Run => "run",
            ElementKind::Table => "table",
            ElementKind::Row => "row",
            ElementKind::Cell => "cell",
        }
    }

    /// Whether elements of this kind only exist inside tables.
    pub fn is_tabular(self) -> bool {
        matches!(self, ElementKind::Table | ElementKind::Row | ElementKind::Cell)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paragraph" => Ok(ElementKind::Paragraph),
            "run" => Ok(ElementKind::Run),
            "table" => Ok(ElementKind::Table),
            "row" => Ok(ElementKind::Row),
            "cell" => Ok(ElementKind::Cell),
            other => Err(format!("unknown element type '{}'", other)),
        }
    }
}

/// Stable position of an element within a document.
///
/// Field order gives the derived `Ord` document order: a container sorts
/// before everything it contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementPath {
    /// Section index
    pub section: usize,
    /// Block index within the section
    pub block: usize,
    /// Row index, for elements inside a table
    pub row: Option<usize>,
    /// Cell index within the row
    pub cell: Option<usize>,
    /// Paragraph index within the cell
    pub paragraph: Option<usize>,
    /// Run index within the paragraph
    pub run: Option<usize>,
    /// Kind of the referenced element
    pub kind: ElementKind,
}

impl ElementPath {
    /// Path of a top-level paragraph block.
    pub fn paragraph(section: usize, block: usize) -> Self {
        Self {
            section,
            block,
            row: None,
            cell: None,
            paragraph: None,
            run: None,
            kind: ElementKind::Paragraph,
        }
    }

    /// Path of a table block.
    pub fn table(section: usize, block: usize) -> Self {
        Self {
            kind: ElementKind::Table,
            ..Self::paragraph(section, block)
        }
    }

    /// Path of a row of this table.
    pub fn row(self, row: usize) -> Self {
        Self {
            row: Some(row),
            kind: ElementKind::Row,
            ..self
        }
    }

    /// Path of a cell of this row.
    pub fn cell(self, cell: usize) -> Self {
        Self {
            cell: Some(cell),
            kind: ElementKind::Cell,
            ..self
        }
    }

    /// Path of a paragraph inside this cell.
    pub fn cell_paragraph(self, paragraph: usize) -> Self {
        Self {
            paragraph: Some(paragraph),
            kind: ElementKind::Paragraph,
            ..self
        }
    }

    /// Path of a run of this paragraph.
    pub fn run(self, run: usize) -> Self {
        Self {
            run: Some(run),
            kind: ElementKind::Run,
            ..self
        }
    }

    /// Whether the element sits inside a table (tables themselves included).
    pub fn in_table(&self) -> bool {
        self.row.is_some() || self.kind == ElementKind::Table
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}/b{}", self.section, self.block)?;
        if let Some(row) = self.row {
            write!(f, "/row{}", row)?;
        }
        if let Some(cell) = self.cell {
            write!(f, "/cell{}", cell)?;
        }
        if let Some(paragraph) = self.paragraph {
            write!(f, "/p{}", paragraph)?;
        }
        if let Some(run) = self.run {
            write!(f, "/run{}", run)?;
        }
        Ok(())
    }
}

impl Serialize for ElementPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Read-only view of a resolved element.
///
/// Rows and cells carry their table so that table-level properties
/// (column widths) and row-level properties (heights) are reachable.
#[derive(Debug, Clone, Copy)]
pub enum Element<'a> {
    Paragraph(&'a Paragraph),
    Run(&'a Run),
    Table(&'a Table),
    Row {
        table: &'a Table,
        row: usize,
    },
    Cell {
        table: &'a Table,
        row: usize,
        column: usize,
    },
}

impl<'a> Element<'a> {
    /// Kind of this element.
    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Paragraph(_) => ElementKind::Paragraph,
            Element::Run(_) => ElementKind::Run,
            Element::Table(_) => ElementKind::Table,
            Element::Row { .. } => ElementKind::Row,
            Element::Cell { .. } => ElementKind::Cell,
        }
    }

    /// The row, for rows and cells.
    pub fn table_row(&self) -> Option<&'a TableRow> {
        match *self {
            Element::Row { table, row } | Element::Cell { table, row, .. } => table.rows.get(row),
            _ => None,
        }
    }

    /// The cell, for cells.
    pub fn table_cell(&self) -> Option<&'a TableCell> {
        match *self {
            Element::Cell { table, row, column } => {
                table.rows.get(row).and_then(|r| r.cells.get(column))
            }
            _ => None,
        }
    }

    /// Derived text of the element.
    pub fn plain_text(&self) -> String {
        match self {
            Element::Paragraph(p) => p.plain_text(),
            Element::Run(r) => r.text.clone(),
            Element::Table(t) => t.plain_text(),
            Element::Row { .. } => self.table_row().map(|r| r.plain_text()).unwrap_or_default(),
            Element::Cell { .. } => self.table_cell().map(|c| c.plain_text()).unwrap_or_default(),
        }
    }

    /// Every run contained in the element, in document order.
    pub fn runs(&self) -> Vec<&'a Run> {
        fn from_paragraphs<'p>(paragraphs: &'p [Paragraph]) -> impl Iterator<Item = &'p Run> {
            paragraphs.iter().flat_map(|p| p.runs.iter())
        }

        match *self {
            Element::Paragraph(p) => p.runs.iter().collect(),
            Element::Run(r) => vec![r],
            Element::Table(t) => t
                .rows
                .iter()
                .flat_map(|r| r.cells.iter())
                .flat_map(|c| from_paragraphs(&c.paragraphs))
                .collect(),
            Element::Row { .. } => self
                .table_row()
                .map(|r| {
                    r.cells
                        .iter()
                        .flat_map(|c| from_paragraphs(&c.paragraphs))
                        .collect()
                })
                .unwrap_or_default(),
            Element::Cell { .. } => self
                .table_cell()
                .map(|c| from_paragraphs(&c.paragraphs).collect())
                .unwrap_or_default(),
        }
    }
}

/// Mutable view of a resolved element.
///
/// Row and cell variants hold the whole table plus indices, which have been
/// bounds-checked during resolution.
#[derive(Debug)]
pub enum ElementMut<'a> {
    Paragraph(&'a mut Paragraph),
    Run(&'a mut Run),
    Table(&'a mut Table),
    Row {
        table: &'a mut Table,
        row: usize,
    },
    Cell {
        table: &'a mut Table,
        row: usize,
        column: usize,
    },
}

impl<'a> ElementMut<'a> {
    /// Kind of this element.
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementMut::Paragraph(_) => ElementKind::Paragraph,
            ElementMut::Run(_) => ElementKind::Run,
            ElementMut::Table(_) => ElementKind::Table,
            ElementMut::Row { .. } => ElementKind::Row,
            ElementMut::Cell { .. } => ElementKind::Cell,
        }
    }

    /// Every paragraph contained in the element (none for a run).
    pub fn paragraphs_mut(&mut self) -> Vec<&mut Paragraph> {
        match self {
            ElementMut::Paragraph(p) => vec![&mut **p],
            ElementMut::Run(_) => Vec::new(),
            ElementMut::Table(t) => t
                .rows
                .iter_mut()
                .flat_map(|r| r.cells.iter_mut())
                .flat_map(|c| c.paragraphs.iter_mut())
                .collect(),
            ElementMut::Row { table, row } => table
                .rows
                .get_mut(*row)
                .map(|r| {
                    r.cells
                        .iter_mut()
                        .flat_map(|c| c.paragraphs.iter_mut())
                        .collect()
                })
                .unwrap_or_default(),
            ElementMut::Cell { table, row, column } => table
                .rows
                .get_mut(*row)
                .and_then(|r| r.cells.get_mut(*column))
                .map(|c| c.paragraphs.iter_mut().collect())
                .unwrap_or_default(),
        }
    }

    /// Every run contained in the element, in document order.
    pub fn runs_mut(&mut self) -> Vec<&mut Run> {
        if let ElementMut::Run(r) = self {
            return vec![&mut **r];
        }
        self.paragraphs_mut()
            .into_iter()
            .flat_map(|p| p.runs.iter_mut())
            .collect()
    }
}
