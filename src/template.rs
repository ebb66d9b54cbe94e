//! Turning a filled-in form into a reusable template.
//!
//! Two ways in:
//!
//! - [`templatize`] rewrites every paragraph that mentions a detected label
//!   `L` so it reads `L: {{K}}`, with `K` the key the user mapped it to.
//! - [`insert_placeholder`] puts a `{{K}}` token into one paragraph picked
//!   by [`BlockPath`].
//!
//! Both collapse the paragraphs they change to a single run.

use crate::document::{BlockPath, Document};
use crate::engine::for_each_paragraph_mut;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use regex::{Captures, Regex};
use std::fmt;

/// The substitution token for `field`.
pub fn placeholder_for(field: &str) -> String {
    format!("{{{{{field}}}}}")
}

/// Rewrite every occurrence of each label in `mapping` to `label: {{key}}`,
/// in every paragraph at any depth up to `max_depth`. Returns the number of
/// paragraphs changed.
///
/// Labels are matched longest first in a single pass, so the text a
/// replacement inserts is never matched again. Empty labels and empty keys
/// are ignored.
pub fn templatize(document: &mut Document, mapping: &IndexMap<String, String>, max_depth: usize) -> usize {
    let mut labels: Vec<&str> =
        mapping.iter().filter(|(l, k)| !l.is_empty() && !k.trim().is_empty()).map(|(l, _)| l.as_str()).collect();
    if labels.is_empty() {
        return 0;
    }
    labels.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let alternation: Vec<String> = labels.iter().map(|l| regex::escape(l)).collect();
    let pattern = match Regex::new(&alternation.join("|")) {
        Ok(re) => re,
        Err(err) => {
            tracing::warn!(%err, labels = labels.len(), "label pattern rejected");
            return 0;
        }
    };

    let mut changed = 0;
    for_each_paragraph_mut(document, max_depth, |path, paragraph| {
        let text = paragraph.text();
        let out = pattern.replace_all(&text, |caps: &Captures<'_>| {
            let label = &caps[0];
            let key = mapping.get(label).map(|k| k.trim()).unwrap_or_default();
            format!("{label}: {}", placeholder_for(key))
        });
        if out != text {
            tracing::debug!(block = %path, "labels templatized");
            paragraph.set_text(out.into_owned());
            changed += 1;
        }
    });
    changed
}

/// Where [`insert_placeholder`] puts the token relative to the existing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// `{{K}} text`
    Start,
    /// `text {{K}}`
    End,
    /// `{{K}}`, the text is dropped.
    Replace,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Position::Start => "start",
            Position::End => "end",
            Position::Replace => "replace",
        })
    }
}

/// Insert `{{key}}` into the paragraph at `path`.
///
/// The paragraph's trimmed text is combined with the token per `position`
/// and the paragraph is rebuilt as one plain run. Fails with
/// [`Error::NoSuchBlock`] when `path` does not name a paragraph.
pub fn insert_placeholder(document: &mut Document, path: &BlockPath, position: Position, key: &str) -> Result<()> {
    let paragraph = document.paragraph_mut(path).ok_or_else(|| Error::NoSuchBlock(path.to_string()))?;
    let text = paragraph.text();
    let text = text.trim();
    let token = placeholder_for(key);
    let new_text = match position {
        Position::Start => format!("{token} {text}"),
        Position::End => format!("{text} {token}"),
        Position::Replace => token,
    };
    paragraph.replace_with(new_text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{BodyItem, Cell, Paragraph, Run, Table};

    fn mapping(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs.iter().map(|(l, k)| (l.to_string(), k.to_string())).collect()
    }

    #[test]
    fn placeholder_token_shape() {
        assert_eq!(placeholder_for("DNI"), "{{DNI}}");
        assert_eq!(placeholder_for("Código postal"), "{{Código postal}}");
    }

    #[test]
    fn templatize_rewrites_labels_everywhere() {
        let inner = Table::new(vec![vec![Cell::text("D.N.I.")]]);
        let mut doc = Document::new(vec![
            BodyItem::Paragraph(Paragraph::new("Nombre")),
            BodyItem::Table(Table::new(vec![vec![Cell::text("Provincia").with_tables(vec![inner])]])),
            BodyItem::Paragraph(Paragraph::new("Sin etiquetas")),
        ]);
        let m = mapping(&[("Nombre", "Nombre"), ("D.N.I.", "DNI"), ("Provincia", " ")]);

        assert_eq!(templatize(&mut doc, &m, 64), 2);
        assert_eq!(doc.paragraph(&"0".parse().unwrap()).unwrap().text(), "Nombre: {{Nombre}}");
        assert_eq!(doc.paragraph(&"1/r0c0/t0/r0c0/p0".parse().unwrap()).unwrap().text(), "D.N.I.: {{DNI}}");
        assert_eq!(doc.paragraph(&"1/r0c0/p0".parse().unwrap()).unwrap().text(), "Provincia");
    }

    #[test]
    fn templatize_is_single_pass_and_prefers_longer_labels() {
        let mut doc = Document::from_paragraphs(&["Nombre del representante y Nombre"]);
        let m = mapping(&[("Nombre", "Nombre"), ("Nombre del representante", "Representante")]);

        templatize(&mut doc, &m, 64);
        assert_eq!(
            doc.paragraph(&"0".parse().unwrap()).unwrap().text(),
            "Nombre del representante: {{Representante}} y Nombre: {{Nombre}}"
        );
    }

    #[test]
    fn insert_positions() {
        let cases = [
            (Position::Start, "{{DNI}} D.N.I."),
            (Position::End, "D.N.I. {{DNI}}"),
            (Position::Replace, "{{DNI}}"),
        ];
        for (position, want) in cases {
            let mut bold = Run::new("  D.N.I. ");
            bold.props.bold = true;
            let mut doc = Document::new(vec![BodyItem::Paragraph(Paragraph::from_runs(vec![bold]))]);
            let path = "0".parse().unwrap();

            insert_placeholder(&mut doc, &path, position, "DNI").unwrap();
            let p = doc.paragraph(&path).unwrap();
            assert_eq!(p.runs, vec![Run::new(want)], "{position}");
        }
    }

    #[test]
    fn insert_into_missing_block_fails() {
        let mut doc = Document::from_paragraphs(&["x"]);
        let err = insert_placeholder(&mut doc, &"4".parse().unwrap(), Position::End, "DNI").unwrap_err();
        assert!(matches!(err, Error::NoSuchBlock(p) if p == "4"));
    }
}
