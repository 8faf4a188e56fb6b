//! Document-level types.

use super::{Element, ElementKind, ElementMut, ElementPath, Paragraph, Table};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A parsed document.
///
/// Built once per processing pass by an external parser; the engine reads
/// and corrects it only through this model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document metadata
    #[serde(default)]
    pub metadata: Metadata,

    /// Sections in document order
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a section to the document.
    pub fn add_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Add a section and return self.
    pub fn section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Check if the document has no content blocks.
    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.blocks.is_empty())
    }

    /// Get plain text content of the entire document.
    pub fn plain_text(&self) -> String {
        self.sections
            .iter()
            .map(|section| section.plain_text())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Verify structural invariants (equal column count per table).
    pub fn check_invariants(&self) -> Result<(), String> {
        for located in self.walk(ElementKind::Table) {
            if let Element::Table(table) = located.element {
                table
                    .validate_shape()
                    .map_err(|e| format!("table at {}: {}", located.path, e))?;
            }
        }
        Ok(())
    }

    /// Number of elements of the given kind.
    pub fn element_count(&self, kind: ElementKind) -> usize {
        self.walk(kind).len()
    }

    /// Enumerate every element of `kind` in depth-first document order.
    ///
    /// Containers are visited before their contents, and paragraphs inside
    /// table cells are part of the same ordinal sequence as body paragraphs.
    pub fn walk(&self, kind: ElementKind) -> Vec<Located<'_>> {
        let mut walker = Walker {
            kind,
            out: Vec::new(),
            table_ordinal: None,
            tables_seen: 0,
        };

        for (s, section) in self.sections.iter().enumerate() {
            for (b, block) in section.blocks.iter().enumerate() {
                match block {
                    Block::Paragraph(p) => {
                        walker.table_ordinal = None;
                        walker.paragraph(p, ElementPath::paragraph(s, b), None);
                    }
                    Block::Table(t) => {
                        walker.table_ordinal = Some(walker.tables_seen);
                        walker.tables_seen += 1;
                        walker.table(t, ElementPath::table(s, b));
                    }
                }
            }
        }

        walker.out
    }

    /// Paths of the elements of `kind` inside the element at `path`, in
    /// document order. An element of that kind yields only itself.
    pub fn contained(&self, path: &ElementPath, kind: ElementKind) -> Vec<ElementPath> {
        let mut out = Vec::new();
        if let Some(element) = self.resolve(path) {
            collect_contained(element, *path, kind, &mut out);
        }
        out
    }

    /// Resolve a path to a read-only element view.
    pub fn resolve(&self, path: &ElementPath) -> Option<Element<'_>> {
        let block = self.sections.get(path.section)?.blocks.get(path.block)?;

        let element = match (block, path.row) {
            (Block::Paragraph(p), None) => paragraph_element(p, path.run)?,
            (Block::Table(t), None) => Element::Table(t),
            (Block::Table(t), Some(row)) => {
                let r = t.rows.get(row)?;
                match path.cell {
                    None => Element::Row { table: t, row },
                    Some(column) => {
                        let cell = r.cells.get(column)?;
                        match path.paragraph {
                            None => Element::Cell {
                                table: t,
                                row,
                                column,
                            },
                            Some(pi) => paragraph_element(cell.paragraphs.get(pi)?, path.run)?,
                        }
                    }
                }
            }
            (Block::Paragraph(_), Some(_)) => return None,
        };

        (element.kind() == path.kind).then_some(element)
    }

    /// Resolve a path to a mutable element view.
    pub fn resolve_mut(&mut self, path: &ElementPath) -> Option<ElementMut<'_>> {
        let block = self
            .sections
            .get_mut(path.section)?
            .blocks
            .get_mut(path.block)?;

        let element = match (block, path.row) {
            (Block::Paragraph(p), None) => paragraph_element_mut(p, path.run)?,
            (Block::Table(t), None) => ElementMut::Table(t),
            (Block::Table(t), Some(row)) => {
                let cells = t.rows.get(row)?.cells.len();
                match path.cell {
                    None => ElementMut::Row { table: t, row },
                    Some(column) if column >= cells => return None,
                    Some(column) => match path.paragraph {
                        None => ElementMut::Cell {
                            table: t,
                            row,
                            column,
                        },
                        Some(pi) => {
                            let p = t.rows[row].cells[column].paragraphs.get_mut(pi)?;
                            paragraph_element_mut(p, path.run)?
                        }
                    },
                }
            }
            (Block::Paragraph(_), Some(_)) => return None,
        };

        (element.kind() == path.kind).then_some(element)
    }
}

fn collect_contained(
    element: Element<'_>,
    path: ElementPath,
    kind: ElementKind,
    out: &mut Vec<ElementPath>,
) {
    if element.kind() == kind {
        out.push(path);
        return;
    }
    match element {
        Element::Run(_) => {}
        Element::Paragraph(p) => {
            if kind == ElementKind::Run {
                out.extend((0..p.runs.len()).map(|ri| path.run(ri)));
            }
        }
        Element::Table(table) => {
            for row in 0..table.rows.len() {
                collect_contained(Element::Row { table, row }, path.row(row), kind, out);
            }
        }
        Element::Row { table, row } => {
            let columns = table.rows.get(row).map_or(0, |r| r.cells.len());
            for column in 0..columns {
                let cell = Element::Cell { table, row, column };
                collect_contained(cell, path.cell(column), kind, out);
            }
        }
        Element::Cell { .. } => {
            let paragraphs = element.table_cell().map(|c| c.paragraphs.as_slice());
            for (pi, p) in paragraphs.unwrap_or_default().iter().enumerate() {
                collect_contained(Element::Paragraph(p), path.cell_paragraph(pi), kind, out);
            }
        }
    }
}

fn paragraph_element(p: &Paragraph, run: Option<usize>) -> Option<Element<'_>> {
    match run {
        None => Some(Element::Paragraph(p)),
        Some(ri) => p.runs.get(ri).map(Element::Run),
    }
}

fn paragraph_element_mut(p: &mut Paragraph, run: Option<usize>) -> Option<ElementMut<'_>> {
    match run {
        None => Some(ElementMut::Paragraph(p)),
        Some(ri) => p.runs.get_mut(ri).map(ElementMut::Run),
    }
}

/// An element found while walking a document.
#[derive(Debug, Clone, Copy)]
pub struct Located<'a> {
    /// Stable position
    pub path: ElementPath,

    /// Index among all elements of the same kind, in document order
    pub ordinal: usize,

    /// Ordinal of the enclosing table (the table itself for table elements)
    pub table_ordinal: Option<usize>,

    /// Row and column count of the enclosing table
    pub table_shape: Option<(usize, usize)>,

    /// The element
    pub element: Element<'a>,
}

struct Walker<'a> {
    kind: ElementKind,
    out: Vec<Located<'a>>,
    table_ordinal: Option<usize>,
    tables_seen: usize,
}

impl<'a> Walker<'a> {
    fn emit(
        &mut self,
        path: ElementPath,
        table_shape: Option<(usize, usize)>,
        element: Element<'a>,
    ) {
        if path.kind == self.kind {
            let ordinal = self.out.len();
            self.out.push(Located {
                path,
                ordinal,
                table_ordinal: self.table_ordinal,
                table_shape,
                element,
            });
        }
    }

    fn paragraph(&mut self, p: &'a Paragraph, path: ElementPath, shape: Option<(usize, usize)>) {
        self.emit(path, shape, Element::Paragraph(p));
        if self.kind == ElementKind::Run {
            for (ri, run) in p.runs.iter().enumerate() {
                self.emit(path.run(ri), shape, Element::Run(run));
            }
        }
    }

    fn table(&mut self, t: &'a Table, path: ElementPath) {
        let shape = Some((t.row_count(), t.column_count()));
        self.emit(path, shape, Element::Table(t));
        if self.kind == ElementKind::Table {
            return;
        }

        for (r, row) in t.rows.iter().enumerate() {
            let row_path = path.row(r);
            self.emit(row_path, shape, Element::Row { table: t, row: r });
            for (c, cell) in row.cells.iter().enumerate() {
                let cell_path = row_path.cell(c);
                self.emit(
                    cell_path,
                    shape,
                    Element::Cell {
                        table: t,
                        row: r,
                        column: c,
                    },
                );
                for (pi, p) in cell.paragraphs.iter().enumerate() {
                    self.paragraph(p, cell_path.cell_paragraph(pi), shape);
                }
            }
        }
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    #[serde(default)]
    pub title: Option<String>,

    /// Where the document came from (file name, job reference)
    #[serde(default)]
    pub source: Option<String>,

    /// Creation date
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

/// A document section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Content blocks in order
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Section {
    /// Create a new empty section.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a paragraph to the section.
    pub fn add_paragraph(&mut self, paragraph: Paragraph) {
        self.blocks.push(Block::Paragraph(paragraph));
    }

    /// Add a table to the section.
    pub fn add_table(&mut self, table: Table) {
        self.blocks.push(Block::Table(table));
    }

    /// Add a paragraph and return self.
    pub fn paragraph(mut self, paragraph: Paragraph) -> Self {
        self.add_paragraph(paragraph);
        self
    }

    /// Add a table and return self.
    pub fn table(mut self, table: Table) -> Self {
        self.add_table(table);
        self
    }

    /// Get plain text content of the section.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(|block| match block {
                Block::Paragraph(p) => p.plain_text(),
                Block::Table(t) => t.plain_text(),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// A content block in a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// A paragraph of text
    Paragraph(Paragraph),

    /// A table
    Table(Table),
}

impl Block {
    /// Check if this block is a paragraph.
    pub fn is_paragraph(&self) -> bool {
        matches!(self, Block::Paragraph(_))
    }

    /// Check if this block is a table.
    pub fn is_table(&self) -> bool {
        matches!(self, Block::Table(_))
    }

    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Block::Table(t) => Some(t),
            Block::Paragraph(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Run, TableCell, TableRow};

    fn sample() -> Document {
        let table = Table::new()
            .row(TableRow::from_strings(["Item", "2024"]))
            .row(TableRow::from_strings(["Cash", "$100"]));
        Document::new().section(
            Section::new()
                .paragraph(Paragraph::with_text("Title"))
                .table(table)
                .paragraph(Paragraph::new().run(Run::new("a")).run(Run::new("b"))),
        )
    }

    #[test]
    fn test_walk_paragraph_ordinals_include_cells() {
        let doc = sample();
        let paragraphs = doc.walk(ElementKind::Paragraph);

        // 1 body + 4 cell paragraphs + 1 body
        assert_eq!(paragraphs.len(), 6);
        assert_eq!(paragraphs[0].path, ElementPath::paragraph(0, 0));
        assert_eq!(paragraphs[5].path, ElementPath::paragraph(0, 2));
        assert_eq!(paragraphs[5].ordinal, 5);
        assert_eq!(paragraphs[1].table_ordinal, Some(0));
        assert_eq!(paragraphs[5].table_ordinal, None);
    }

    #[test]
    fn test_walk_cells() {
        let doc = sample();
        let cells = doc.walk(ElementKind::Cell);
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[3].path, ElementPath::table(0, 1).row(1).cell(1));
        assert_eq!(cells[3].table_shape, Some((2, 2)));
    }

    #[test]
    fn test_resolve_round_trip() {
        let doc = sample();
        for kind in [
            ElementKind::Paragraph,
            ElementKind::Run,
            ElementKind::Table,
            ElementKind::Row,
            ElementKind::Cell,
        ] {
            for located in doc.walk(kind) {
                let resolved = doc.resolve(&located.path).expect("path resolves");
                assert_eq!(resolved.kind(), kind);
                assert_eq!(resolved.plain_text(), located.element.plain_text());
            }
        }
    }

    #[test]
    fn test_resolve_rejects_kind_mismatch() {
        let doc = sample();
        // Block 1 is a table, not a paragraph
        assert!(doc.resolve(&ElementPath::paragraph(0, 1)).is_none());
        assert!(doc.resolve(&ElementPath::paragraph(0, 9)).is_none());
    }

    #[test]
    fn test_resolve_mut_cell() {
        let mut doc = sample();
        let path = ElementPath::table(0, 1).row(1).cell(1);
        match doc.resolve_mut(&path) {
            Some(mut el) => {
                for run in el.runs_mut() {
                    run.bold = true;
                }
            }
            None => panic!("cell should resolve"),
        }
        let cell = doc.resolve(&path).and_then(|e| e.table_cell()).unwrap();
        assert!(cell.paragraphs[0].runs[0].bold);
    }

    #[test]
    fn test_contained_elements() {
        let doc = sample();

        let cells = doc.contained(&ElementPath::table(0, 1), ElementKind::Cell);
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[3], ElementPath::table(0, 1).row(1).cell(1));

        let runs = doc.contained(&ElementPath::paragraph(0, 2), ElementKind::Run);
        assert_eq!(
            runs,
            vec![
                ElementPath::paragraph(0, 2).run(0),
                ElementPath::paragraph(0, 2).run(1)
            ]
        );

        let row = ElementPath::table(0, 1).row(0);
        assert_eq!(doc.contained(&row, ElementKind::Row), vec![row]);
        assert!(doc.contained(&ElementPath::paragraph(0, 9), ElementKind::Run).is_empty());
    }

    #[test]
    fn test_check_invariants() {
        let mut doc = sample();
        assert!(doc.check_invariants().is_ok());

        if let Block::Table(t) = &mut doc.sections[0].blocks[1] {
            t.rows[1].cells.push(TableCell::empty());
        }
        assert!(doc.check_invariants().is_err());
    }

    #[test]
    fn test_document_json() {
        let doc = sample();
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"type\":\"table\""));
        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }
}
