//! Shared fixtures for integration tests.

#![allow(dead_code)]

use docrule::{Alignment, Document, Paragraph, Run, Section, Table, TableCell, TableRow};

/// Cover page of an annual report with a "formerly" line that breaks
/// every formatting rule of the cover.
pub fn cover_page() -> Document {
    Document::new().section(
        Section::new()
            .paragraph(
                Paragraph::new()
                    .align(Alignment::Center)
                    .run(Run::new("ABC Holdings Inc.").font("Arial", 14.0).bold(true)),
            )
            .paragraph(
                Paragraph::new()
                    .align(Alignment::Left)
                    .run(Run::new("(formerly ABC Corp)").font("Times New Roman", 11.0)),
            )
            .paragraph(Paragraph::new().run(Run::new("Annual Report 2024").font("Arial", 12.0))),
    )
}

/// Document with `n` body paragraphs of 11pt text.
pub fn paragraphs(n: usize) -> Document {
    let mut section = Section::new();
    for i in 0..n {
        section.add_paragraph(
            Paragraph::new().run(Run::new(format!("Paragraph {}", i + 1)).font("Arial", 11.0)),
        );
    }
    Document::new().section(section)
}

/// Financial statement table with the given row heights.
pub fn statement(heights: &[f32]) -> Document {
    let mut table = Table::new().with_column_widths(vec![3.0, 1.2, 1.2]);
    for (i, height) in heights.iter().enumerate() {
        table.add_row(
            TableRow::new(vec![
                TableCell::text(format!("Item {}", i + 1)),
                TableCell::text("1,000"),
                TableCell::text("2,000"),
            ])
            .height(*height),
        );
    }
    Document::new().section(Section::new().table(table))
}

/// Single paragraph holding `text`.
pub fn single(text: &str) -> Document {
    Document::new().section(
        Section::new().paragraph(Paragraph::new().run(Run::new(text).font("Arial", 11.0))),
    )
}

pub const COVER_RULES: &str = r#"{
    "version": "2024.1",
    "name": "Annual report cover",
    "rules": [{
        "id": "FORMERLY_LINE",
        "scope": "cover",
        "priority": 10,
        "selector": {"element": "paragraph", "text_contains": "formerly"},
        "checks": [
            {"property": "alignment", "expected": "center"},
            {"property": "font_name", "expected": "Arial"},
            {"property": "font_size", "expected": 14},
            {"property": "bold", "expected": true}
        ],
        "fix_actions": [
            {"action": "set_alignment", "value": "center"},
            {"action": "set_font", "name": "Arial", "size": 14},
            {"action": "set_bold", "value": true}
        ]
    }]
}"#;
