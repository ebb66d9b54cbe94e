//! Document tree model.
//!
//! A document is a body of paragraphs and tables. A table is rows of cells,
//! and each cell holds its own paragraphs followed by any number of nested
//! tables, to arbitrary depth:
//!
//! ```text
//! Document
//!  └─ body: [Paragraph | Table]
//!                         └─ rows ─ cells ─┬─ paragraphs
//!                                          └─ tables (recursive)
//! ```
//!
//! A paragraph's text is the concatenation of its runs. Runs carry the only
//! formatting this model knows about; rewriting a paragraph's text collapses
//! it to its first run (see [`Paragraph::set_text`]).
//!
//! The on-disk form is JSON. Loading rejects anything that does not fit the
//! model as [`Error::MalformedDocument`]; no partial recovery is attempted.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub body: Vec<BodyItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BodyItem {
    Paragraph(Paragraph),
    Table(Table),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub runs: Vec<Run>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    #[serde(default, skip_serializing_if = "RunProps::is_plain")]
    pub props: RunProps,
}

/// Character formatting carried by a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunProps {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<Table>,
}

impl RunProps {
    fn is_plain(&self) -> bool {
        *self == RunProps::default()
    }
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Run { text: text.into(), props: RunProps::default() }
    }
}

impl Paragraph {
    /// A paragraph with a single plain run (or no run at all for `""`).
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() { Paragraph::default() } else { Paragraph { runs: vec![Run::new(text)] } }
    }

    pub fn from_runs(runs: Vec<Run>) -> Self {
        Paragraph { runs }
    }

    /// Full text: every run's text, in order.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Replace the displayed text, collapsing the paragraph to one run.
    ///
    /// The first run keeps its formatting and receives all of `text`; every
    /// later run is dropped. A paragraph without runs gets a new plain run.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.runs.truncate(1);
        match self.runs.first_mut() {
            Some(run) => run.text = text,
            None => self.runs.push(Run::new(text)),
        }
    }

    /// Drop every run and start over with one plain run holding `text`.
    pub fn replace_with(&mut self, text: impl Into<String>) {
        self.runs.clear();
        self.runs.push(Run::new(text));
    }
}

impl Table {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Table { rows: rows.into_iter().map(|cells| Row { cells }).collect() }
    }

    fn paragraph(&self, steps: &[Step]) -> Option<&Paragraph> {
        let (Step::Cell { row, col }, rest) = steps.split_first()? else {
            return None;
        };
        let cell = self.rows.get(*row)?.cells.get(*col)?;
        match rest.split_first()? {
            (Step::Paragraph(idx), []) => cell.paragraphs.get(*idx),
            (Step::Table(idx), rest) => cell.tables.get(*idx)?.paragraph(rest),
            _ => None,
        }
    }

    fn paragraph_mut(&mut self, steps: &[Step]) -> Option<&mut Paragraph> {
        let (Step::Cell { row, col }, rest) = steps.split_first()? else {
            return None;
        };
        let cell = self.rows.get_mut(*row)?.cells.get_mut(*col)?;
        match rest.split_first()? {
            (Step::Paragraph(idx), []) => cell.paragraphs.get_mut(*idx),
            (Step::Table(idx), rest) => cell.tables.get_mut(*idx)?.paragraph_mut(rest),
            _ => None,
        }
    }
}

impl Cell {
    /// A cell with one paragraph per line of `text`.
    pub fn text(text: &str) -> Self {
        Cell { paragraphs: text.split('\n').map(Paragraph::new).collect(), tables: Vec::new() }
    }

    pub fn with_tables(mut self, tables: Vec<Table>) -> Self {
        self.tables = tables;
        self
    }
}

impl Document {
    pub fn new(body: Vec<BodyItem>) -> Self {
        Document { body }
    }

    /// A document made only of plain paragraphs.
    pub fn from_paragraphs<S: AsRef<str>>(texts: &[S]) -> Self {
        Document { body: texts.iter().map(|t| BodyItem::Paragraph(Paragraph::new(t.as_ref()))).collect() }
    }

    /// Parse a document from raw bytes (an upload, a pipe, a file's contents).
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(Error::MalformedDocument)
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        Self::from_slice(&bytes)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|source| Error::Encode { what: "document", source })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| Error::io(path, e))
    }

    pub fn paragraph(&self, path: &BlockPath) -> Option<&Paragraph> {
        let (Step::Body(idx), rest) = path.steps().split_first()? else {
            return None;
        };
        match (self.body.get(*idx)?, rest) {
            (BodyItem::Paragraph(p), []) => Some(p),
            (BodyItem::Table(t), rest) => t.paragraph(rest),
            _ => None,
        }
    }

    pub fn paragraph_mut(&mut self, path: &BlockPath) -> Option<&mut Paragraph> {
        let (Step::Body(idx), rest) = path.steps().split_first()? else {
            return None;
        };
        match (self.body.get_mut(*idx)?, rest) {
            (BodyItem::Paragraph(p), []) => Some(p),
            (BodyItem::Table(t), rest) => t.paragraph_mut(rest),
            _ => None,
        }
    }
}

// --- Block paths -------------------------------------------------------------

/// One hop from a container to a child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Step {
    /// Item `n` of the document body.
    Body(usize),
    /// Cell at `row`, `col` of the current table.
    Cell { row: usize, col: usize },
    /// Paragraph `n` of the current cell.
    Paragraph(usize),
    /// Nested table `n` of the current cell.
    Table(usize),
}

/// Location of a paragraph inside a [`Document`].
///
/// Written as `/`-separated steps: `3` is body item 3, `1/r0c2/p0` is the
/// first paragraph of cell (0, 2) of the table at body item 1, and
/// `1/r0c2/t0/r1c1/p0` goes one nested table deeper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPath(Vec<Step>);

impl BlockPath {
    pub fn new(steps: Vec<Step>) -> Self {
        BlockPath(steps)
    }

    pub fn steps(&self) -> &[Step] {
        &self.0
    }

    /// Number of tables between the body and this paragraph.
    pub fn table_depth(&self) -> usize {
        self.0.iter().filter(|s| matches!(s, Step::Cell { .. })).count()
    }
}

impl fmt::Display for BlockPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            match step {
                Step::Body(n) => write!(f, "{n}")?,
                Step::Cell { row, col } => write!(f, "r{row}c{col}")?,
                Step::Paragraph(n) => write!(f, "p{n}")?,
                Step::Table(n) => write!(f, "t{n}")?,
            }
        }
        Ok(())
    }
}

impl FromStr for BlockPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidBlockPath(s.to_string());
        let mut parts = s.trim().split('/');
        let first = parts.next().ok_or_else(invalid)?;
        let mut steps = vec![Step::Body(first.parse().map_err(|_| invalid())?)];

        for part in parts {
            let step = if let Some(caps) = regex!(r"^r(\d+)c(\d+)$").captures(part) {
                Step::Cell { row: caps[1].parse().map_err(|_| invalid())?, col: caps[2].parse().map_err(|_| invalid())? }
            } else if let Some(n) = part.strip_prefix('p') {
                Step::Paragraph(n.parse().map_err(|_| invalid())?)
            } else if let Some(n) = part.strip_prefix('t') {
                Step::Table(n.parse().map_err(|_| invalid())?)
            } else {
                return Err(invalid());
            };
            steps.push(step);
        }

        Ok(BlockPath(steps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> Document {
        let inner = Table::new(vec![vec![Cell::text("DNI:"), Cell::text("")]]);
        Document::new(vec![
            BodyItem::Paragraph(Paragraph::new("Solicitud")),
            BodyItem::Table(Table::new(vec![vec![Cell::text("Nombre"), Cell::text("").with_tables(vec![inner])]])),
        ])
    }

    #[test]
    fn set_text_collapses_to_first_run() {
        let mut bold = Run::new("Hola ");
        bold.props.bold = true;
        let mut p = Paragraph::from_runs(vec![bold, Run::new("{{Nombre}}"), Run::new(", bienvenida")]);

        assert_eq!(p.text(), "Hola {{Nombre}}, bienvenida");
        p.set_text("Hola Ana, bienvenida");

        assert_eq!(p.runs.len(), 1);
        assert_eq!(p.runs[0].text, "Hola Ana, bienvenida");
        assert!(p.runs[0].props.bold);
    }

    #[test]
    fn set_text_on_empty_paragraph_creates_run() {
        let mut p = Paragraph::default();
        p.set_text("x");
        assert_eq!(p.runs, vec![Run::new("x")]);
    }

    #[test]
    fn block_path_round_trips_through_display() {
        let path: BlockPath = "1/r0c1/t0/r0c0/p0".parse().unwrap();
        assert_eq!(path.to_string(), "1/r0c1/t0/r0c0/p0");
        assert_eq!(path.table_depth(), 2);
        assert!("1/x3".parse::<BlockPath>().is_err());
        assert!("".parse::<BlockPath>().is_err());
    }

    #[test]
    fn paragraph_lookup_follows_nested_tables() {
        let doc = form();
        let nested: BlockPath = "1/r0c1/t0/r0c0/p0".parse().unwrap();
        assert_eq!(doc.paragraph(&nested).map(Paragraph::text).as_deref(), Some("DNI:"));

        let top: BlockPath = "0".parse().unwrap();
        assert_eq!(doc.paragraph(&top).map(Paragraph::text).as_deref(), Some("Solicitud"));

        let missing: BlockPath = "1/r3c0/p0".parse().unwrap();
        assert!(doc.paragraph(&missing).is_none());
        let table_itself: BlockPath = "1".parse().unwrap();
        assert!(doc.paragraph(&table_itself).is_none());
    }

    #[test]
    fn json_round_trip_and_malformed_input() {
        let doc = form();
        let json = doc.to_json().unwrap();
        assert_eq!(Document::from_slice(json.as_bytes()).unwrap(), doc);

        let err = Document::from_slice(b"{\"body\": [{\"type\": \"picture\"}]}").unwrap_err();
        assert!(matches!(err, Error::MalformedDocument(_)));
    }
}
