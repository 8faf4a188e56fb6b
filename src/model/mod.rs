//! Document model types.
//!
//! This module defines the in-memory representation the rule engine works
//! on: sections of paragraphs and tables, with the formatting properties
//! rules can check and correct. An external parser builds it from the
//! source container; an external exporter writes the corrected model back.

mod document;
mod paragraph;
mod path;
mod table;

pub use document::{Block, Document, Located, Metadata, Section};
pub use paragraph::{Alignment, Paragraph, Run};
pub use path::{Element, ElementKind, ElementMut, ElementPath};
pub use table::{CellMargins, Table, TableCell, TableRow};
