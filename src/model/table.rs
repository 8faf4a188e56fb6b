//! Table types.
//!
//! All lengths are in centimeters.

use super::Paragraph;
use serde::{Deserialize, Serialize};

/// A table structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Rows in the table
    #[serde(default)]
    pub rows: Vec<TableRow>,

    /// Column widths (empty when the source did not declare a grid)
    #[serde(default)]
    pub column_widths: Vec<f32>,
}

impl Table {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row to the table.
    pub fn add_row(&mut self, row: TableRow) {
        self.rows.push(row);
    }

    /// Add a row and return self.
    pub fn row(mut self, row: TableRow) -> Self {
        self.rows.push(row);
        self
    }

    /// Set the column grid and return self.
    pub fn with_column_widths(mut self, widths: Vec<f32>) -> Self {
        self.column_widths = widths;
        self
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns (based on first row).
    pub fn column_count(&self) -> usize {
        self.rows.first().map(|r| r.cells.len()).unwrap_or(0)
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Width of a column: the declared grid width, else the first cell width found.
    pub fn column_width(&self, column: usize) -> Option<f32> {
        self.column_widths.get(column).copied().or_else(|| {
            self.rows
                .iter()
                .filter_map(|r| r.cells.get(column))
                .find_map(|c| c.width)
        })
    }

    /// Set a column width on the grid and on every cell of that column.
    ///
    /// Returns false when the column does not exist.
    pub fn set_column_width(&mut self, column: usize, width: f32) -> bool {
        let columns = self.column_count().max(self.column_widths.len());
        if column >= columns {
            return false;
        }
        if self.column_widths.len() < columns {
            // Materialize the grid so the declared width survives export.
            let known: Vec<f32> = (0..columns)
                .map(|c| self.column_width(c).unwrap_or(0.0))
                .collect();
            self.column_widths = known;
        }
        self.column_widths[column] = width;
        for row in &mut self.rows {
            if let Some(cell) = row.cells.get_mut(column) {
                cell.width = Some(width);
            }
        }
        true
    }

    /// Verify that every row has the same column count.
    pub fn validate_shape(&self) -> Result<(), String> {
        let expected = self.column_count();
        for (idx, row) in self.rows.iter().enumerate() {
            if row.cells.len() != expected {
                return Err(format!(
                    "row {} has {} cells, expected {}",
                    idx,
                    row.cells.len(),
                    expected
                ));
            }
        }
        Ok(())
    }

    /// Get plain text representation of the table.
    pub fn plain_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A table row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    /// Row height (None = automatic)
    #[serde(default)]
    pub height: Option<f32>,

    /// Cells in the row
    #[serde(default)]
    pub cells: Vec<TableCell>,
}

impl TableRow {
    /// Create a new row with cells.
    pub fn new(cells: Vec<TableCell>) -> Self {
        Self {
            height: None,
            cells,
        }
    }

    /// Create a row from text values.
    pub fn from_strings<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::new(values.into_iter().map(TableCell::text).collect())
    }

    /// Set height and return self.
    pub fn height(mut self, height: f32) -> Self {
        self.height = Some(height);
        self
    }

    /// Get plain text representation.
    pub fn plain_text(&self) -> String {
        self.cells
            .iter()
            .map(|c| c.plain_text())
            .collect::<Vec<_>>()
            .join("\t")
    }
}

/// A table cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    /// Cell margins
    #[serde(default)]
    pub margins: CellMargins,

    /// Cell width (None = taken from the grid)
    #[serde(default)]
    pub width: Option<f32>,

    /// Cell content
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
}

impl TableCell {
    /// Create a new cell with text content.
    pub fn text(text: impl Into<String>) -> Self {
        Self::with_content(vec![Paragraph::with_text(text)])
    }

    /// Create an empty cell.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a cell with multiple paragraphs.
    pub fn with_content(paragraphs: Vec<Paragraph>) -> Self {
        Self {
            paragraphs,
            ..Default::default()
        }
    }

    /// Set margins and return self.
    pub fn margins(mut self, margins: CellMargins) -> Self {
        self.margins = margins;
        self
    }

    /// Get plain text content.
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.plain_text())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Check if the cell is empty.
    pub fn is_empty(&self) -> bool {
        self.paragraphs.iter().all(Paragraph::is_empty)
    }
}

/// Cell margins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CellMargins {
    #[serde(default)]
    pub left: f32,
    #[serde(default)]
    pub right: f32,
    #[serde(default)]
    pub top: f32,
    #[serde(default)]
    pub bottom: f32,
}

impl CellMargins {
    /// Same margin on all four sides.
    pub fn uniform(value: f32) -> Self {
        Self {
            left: value,
            right: value,
            top: value,
            bottom: value,
        }
    }
}
