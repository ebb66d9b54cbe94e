//! Text block walker.
//!
//! Produces every paragraph of a document in document order:
//!
//! ```text
//! body item 0 (paragraph)               -> block "0"
//! body item 1 (table)
//!   row 0, cell 0: paragraphs           -> "1/r0c0/p0", "1/r0c0/p1"
//!                  nested table 0       -> "1/r0c0/t0/r0c0/p0", ...
//!   row 0, cell 1: ...
//! body item 2 (paragraph)               -> block "2"
//! ```
//!
//! Within a cell the cell's own paragraphs come first, then its nested tables.
//! Empty paragraphs are yielded like any other; callers decide what to skip.
//!
//! Real documents are trees, so there is no cycle check. Tables nested deeper
//! than `max_depth` are skipped with a warning.

use crate::document::{BlockPath, BodyItem, Document, Paragraph, Step, Table};

/// One paragraph's text plus where it lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub path: BlockPath,
    pub text: String,
}

/// Flatten `document` into its ordered list of text blocks.
pub fn blocks(document: &Document, max_depth: usize) -> Vec<TextBlock> {
    let mut out = Vec::new();
    let mut path = Vec::new();

    for (idx, item) in document.body.iter().enumerate() {
        path.push(Step::Body(idx));
        match item {
            BodyItem::Paragraph(p) => out.push(TextBlock { path: BlockPath::new(path.clone()), text: p.text() }),
            BodyItem::Table(t) => collect_table(t, &mut path, 1, max_depth, &mut out),
        }
        path.pop();
    }

    out
}

fn collect_table(table: &Table, path: &mut Vec<Step>, depth: usize, max_depth: usize, out: &mut Vec<TextBlock>) {
    if depth > max_depth {
        tracing::warn!(path = %BlockPath::new(path.clone()), depth, "table nesting too deep, skipped");
        return;
    }

    for (r, row) in table.rows.iter().enumerate() {
        for (c, cell) in row.cells.iter().enumerate() {
            path.push(Step::Cell { row: r, col: c });

            for (p, paragraph) in cell.paragraphs.iter().enumerate() {
                path.push(Step::Paragraph(p));
                out.push(TextBlock { path: BlockPath::new(path.clone()), text: paragraph.text() });
                path.pop();
            }
            for (t, nested) in cell.tables.iter().enumerate() {
                path.push(Step::Table(t));
                collect_table(nested, path, depth + 1, max_depth, out);
                path.pop();
            }

            path.pop();
        }
    }
}

/// Visit every paragraph of `document` mutably, in the same order as
/// [`blocks`]. A cell's paragraphs are visited (and possibly rewritten)
/// before its nested tables are entered.
pub fn for_each_paragraph_mut<F>(document: &mut Document, max_depth: usize, mut f: F)
where
    F: FnMut(&BlockPath, &mut Paragraph),
{
    let mut path = Vec::new();

    for (idx, item) in document.body.iter_mut().enumerate() {
        path.push(Step::Body(idx));
        match item {
            BodyItem::Paragraph(p) => f(&BlockPath::new(path.clone()), p),
            BodyItem::Table(t) => visit_table_mut(t, &mut path, 1, max_depth, &mut f),
        }
        path.pop();
    }
}

fn visit_table_mut<F>(table: &mut Table, path: &mut Vec<Step>, depth: usize, max_depth: usize, f: &mut F)
where
    F: FnMut(&BlockPath, &mut Paragraph),
{
    if depth > max_depth {
        tracing::warn!(path = %BlockPath::new(path.clone()), depth, "table nesting too deep, skipped");
        return;
    }

    for (r, row) in table.rows.iter_mut().enumerate() {
        for (c, cell) in row.cells.iter_mut().enumerate() {
            path.push(Step::Cell { row: r, col: c });

            for (p, paragraph) in cell.paragraphs.iter_mut().enumerate() {
                path.push(Step::Paragraph(p));
                f(&BlockPath::new(path.clone()), paragraph);
                path.pop();
            }
            for (t, nested) in cell.tables.iter_mut().enumerate() {
                path.push(Step::Table(t));
                visit_table_mut(nested, path, depth + 1, max_depth, f);
                path.pop();
            }

            path.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Cell, Table};

    fn nested_form() -> Document {
        let level2 = Table::new(vec![vec![Cell::text("deep")]]);
        let level1 = Table::new(vec![vec![Cell::text("inner a").with_tables(vec![level2]), Cell::text("inner b")]]);
        Document::new(vec![
            BodyItem::Paragraph(Paragraph::new("intro")),
            BodyItem::Table(Table::new(vec![
                vec![Cell::text("a\nb"), Cell::text("").with_tables(vec![level1])],
                vec![Cell::text("c"), Cell::text("d")],
            ])),
            BodyItem::Paragraph(Paragraph::new("")),
        ])
    }

    #[test]
    fn blocks_are_in_document_order_including_empty_ones() {
        let got: Vec<(String, String)> =
            blocks(&nested_form(), 64).into_iter().map(|b| (b.path.to_string(), b.text)).collect();

        let expected = vec![
            ("0", "intro"),
            ("1/r0c0/p0", "a"),
            ("1/r0c0/p1", "b"),
            ("1/r0c1/p0", ""),
            ("1/r0c1/t0/r0c0/p0", "inner a"),
            ("1/r0c1/t0/r0c0/t0/r0c0/p0", "deep"),
            ("1/r0c1/t0/r0c1/p0", "inner b"),
            ("1/r1c0/p0", "c"),
            ("1/r1c1/p0", "d"),
            ("2", ""),
        ];
        let expected: Vec<(String, String)> =
            expected.into_iter().map(|(p, t)| (p.to_string(), t.to_string())).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn mutable_walk_visits_the_same_paths() {
        let mut doc = nested_form();
        let read: Vec<BlockPath> = blocks(&doc, 64).into_iter().map(|b| b.path).collect();

        let mut visited = Vec::new();
        for_each_paragraph_mut(&mut doc, 64, |path, p| {
            visited.push(path.clone());
            p.set_text(format!("#{}", visited.len()));
        });

        assert_eq!(visited, read);
        let deep: BlockPath = "1/r0c1/t0/r0c0/t0/r0c0/p0".parse().unwrap();
        assert_eq!(doc.paragraph(&deep).unwrap().text(), "#6");
    }

    #[test]
    fn depth_limit_skips_deeper_tables() {
        let texts: Vec<String> = blocks(&nested_form(), 1).into_iter().map(|b| b.text).collect();
        assert!(texts.contains(&"a".to_string()));
        assert!(!texts.contains(&"inner a".to_string()));
        assert!(!texts.contains(&"deep".to_string()));
    }
}
