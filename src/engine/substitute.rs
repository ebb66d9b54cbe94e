//! Placeholder substitution.
//!
//! A placeholder is the literal token `{{field}}`, with no padding
//! whitespace inside the braces. Substitution is one left-to-right pass over
//! a paragraph's full text with a single alternation of every known token:
//!
//! ```text
//! fields {Nombre, Nombre2}  ─▶  \{\{(?P<field>Nombre2|Nombre)\}\}
//! "{{Nombre2}} y {{Nombre}}" ─▶ value(Nombre2) + " y " + value(Nombre)
//! ```
//!
//! Each match is a whole token, so a field that is a prefix of another never
//! eats part of the longer token, the order fields are listed in cannot
//! change the result, and inserted values are never rescanned for further
//! tokens.
//!
//! A token whose field the current row lacks is left verbatim. A paragraph
//! whose text comes out unchanged is not touched at all; one that changes is
//! collapsed to its first run (see [`Paragraph::set_text`]).

use super::walker::for_each_paragraph_mut;
use crate::data::DataRow;
use crate::document::{Document, Paragraph};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::BTreeSet;

/// A compiled set of substitutable field names.
#[derive(Debug, Clone)]
pub struct Placeholders {
    pattern: Option<Regex>,
}

impl Placeholders {
    /// Compile the token alternation for `fields`.
    pub fn for_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = fields.into_iter().map(|f| regex::escape(f.as_ref())).collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        names.dedup();

        if names.is_empty() {
            return Placeholders { pattern: None };
        }

        let source = format!(r"\{{\{{(?P<field>{})\}}\}}", names.join("|"));
        // Every name is escaped, so the alternation always compiles unless it
        // blows the size limit; in that case nothing is substituted.
        let pattern = match Regex::new(&source) {
            Ok(re) => Some(re),
            Err(err) => {
                tracing::warn!(%err, fields = names.len(), "placeholder pattern rejected");
                None
            }
        };
        Placeholders { pattern }
    }

    /// Placeholders for exactly the fields present in `row`.
    pub fn for_row(row: &DataRow) -> Self {
        Self::for_fields(row.fields())
    }

    /// Substitute `row` into `text`. `None` when the text would not change.
    pub fn apply(&self, text: &str, row: &DataRow) -> Option<String> {
        let pattern = self.pattern.as_ref()?;
        let replaced = pattern.replace_all(text, |caps: &Captures<'_>| match row.get(&caps["field"]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        });
        match replaced {
            Cow::Borrowed(_) => None,
            Cow::Owned(s) if s == text => None,
            Cow::Owned(s) => Some(s),
        }
    }

    /// Rewrite one paragraph in place. Returns whether it changed.
    pub fn fill_paragraph(&self, paragraph: &mut Paragraph, row: &DataRow) -> bool {
        match self.apply(&paragraph.text(), row) {
            Some(new_text) => {
                paragraph.set_text(new_text);
                true
            }
            None => false,
        }
    }

    /// Rewrite every paragraph of `document`, nested tables included.
    /// Returns how many paragraphs changed.
    pub fn fill_document(&self, document: &mut Document, row: &DataRow, max_depth: usize) -> usize {
        let mut changed = 0;
        for_each_paragraph_mut(document, max_depth, |path, paragraph| {
            if self.fill_paragraph(paragraph, row) {
                tracing::debug!(block = %path, "placeholders substituted");
                changed += 1;
            }
        });
        changed
    }
}

/// Field names of every `{{field}}` token still present in `text`.
///
/// For auditing output after a fill; substitution itself never reports
/// unbound tokens.
///
/// Names may contain inner spaces (`{{Código postal}}`); a name with
/// whitespace at either end is not a token.
pub fn remaining_placeholders(text: &str) -> BTreeSet<String> {
    regex!(r"\{\{([^{}]+)\}\}")
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .filter(|name| name.trim() == name.as_str())
        .collect()
}
