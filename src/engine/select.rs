//! Selector engine.

use crate::model::{Document, ElementPath, Located};
use crate::rules::Selector;

/// Find the elements a selector matches, in document order.
///
/// An empty result is a normal outcome, not an error.
pub fn select(document: &Document, selector: &Selector) -> Vec<ElementPath> {
    select_located(document, selector)
        .into_iter()
        .map(|l| l.path)
        .collect()
}

/// Like [`select`], keeping the located element views.
pub fn select_located<'a>(document: &'a Document, selector: &Selector) -> Vec<Located<'a>> {
    // Walking by kind is the element-type filter; ordinals come from the
    // full walk, so positional predicates never see another predicate's result.
    document
        .walk(selector.element)
        .into_iter()
        .filter(|located| admits(selector, located))
        .collect()
}

fn admits(selector: &Selector, located: &Located<'_>) -> bool {
    if selector.has_text_predicate() && !selector.admits_text(&located.element.plain_text()) {
        return false;
    }
    if let Some(ref position) = selector.position {
        if !position.admits(located) {
            return false;
        }
    }
    if let Some(within) = selector.within {
        if !within.admits(located) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ElementKind, Paragraph, Section, Table, TableCell, TableRow};
    use crate::rules::{Containment, OrdinalSelection, Position};
    use regex::Regex;

    fn doc() -> Document {
        let table = Table::new()
            .row(TableRow::from_strings(["Item", "2023", "2024"]))
            .row(TableRow::from_strings(["Cash", "$100", "$120"]))
            .row(TableRow::from_strings(["Total", "$100", "$120"]));
        Document::new()
            .section(
                Section::new()
                    .paragraph(Paragraph::with_text("ABC Corp"))
                    .paragraph(Paragraph::with_text("(formerly XYZ Ltd)"))
                    .table(table),
            )
            .section(Section::new().paragraph(Paragraph::with_text("Notes")))
    }

    #[test]
    fn test_select_by_type_and_text() {
        let doc = doc();
        let sel = Selector::new(ElementKind::Paragraph).containing("FORMERLY");
        assert_eq!(select(&doc, &sel), vec![ElementPath::paragraph(0, 1)]);

        let all = Selector::new(ElementKind::Paragraph);
        // 2 body + 9 cell paragraphs + 1 in the second section
        assert_eq!(select(&doc, &all).len(), 12);
    }

    #[test]
    fn test_first_n_uses_document_ordinals() {
        let doc = doc();
        let sel = Selector::new(ElementKind::Paragraph)
            .containing("notes")
            .at(Position::First(2));
        assert!(select(&doc, &sel).is_empty());

        let sel = Selector::new(ElementKind::Paragraph).at(Position::Ordinals(
            OrdinalSelection::parse("2").unwrap(),
        ));
        assert_eq!(select(&doc, &sel), vec![ElementPath::paragraph(0, 1)]);
    }

    #[test]
    fn test_last_column_and_row() {
        let doc = doc();
        let sel = Selector::new(ElementKind::Cell).at(Position::Column(-1));
        let cells = select(&doc, &sel);
        assert_eq!(cells.len(), 3);
        assert!(cells.iter().all(|p| p.cell == Some(2)));

        let sel = Selector::new(ElementKind::Row).at(Position::Row(-1));
        assert_eq!(select(&doc, &sel), vec![ElementPath::table(0, 2).row(2)]);
    }

    #[test]
    fn test_containment() {
        let doc = doc();
        let body = Selector::new(ElementKind::Paragraph).within(Containment::Body);
        assert_eq!(select(&doc, &body).len(), 3);

        let in_table = Selector::new(ElementKind::Paragraph).within(Containment::Table);
        assert_eq!(select(&doc, &in_table).len(), 9);

        let second = Selector::new(ElementKind::Paragraph).within(Containment::Section(1));
        assert_eq!(select(&doc, &second), vec![ElementPath::paragraph(1, 0)]);

        let none = Selector::new(ElementKind::Cell).within(Containment::TableIndex(1));
        assert!(select(&doc, &none).is_empty());
    }

    #[test]
    fn test_regex_predicate() {
        let doc = doc();
        let sel = Selector::new(ElementKind::Cell).matching(Regex::new(r"^\$[0-9]+$").unwrap());
        assert_eq!(select(&doc, &sel).len(), 4);
    }

    #[test]
    fn test_empty_document() {
        let doc = Document::new();
        let sel = Selector::new(ElementKind::Paragraph).at(Position::First(20));
        assert!(select(&doc, &sel).is_empty());
    }

    #[test]
    fn test_deterministic() {
        let doc = doc();
        let sel = Selector::new(ElementKind::Run).within(Containment::Table);
        assert_eq!(select(&doc, &sel), select(&doc, &sel));
    }

    #[test]
    fn test_table_cell_text() {
        let doc = Document::new().section(Section::new().table(
            Table::new().row(TableRow::new(vec![TableCell::text("Revenue")])),
        ));
        let sel = Selector::new(ElementKind::Cell).containing("revenue");
        assert_eq!(select(&doc, &sel).len(), 1);
    }
}
