extern crate self as formwright;

#[macro_use]
mod macros;
mod api;
mod data;
mod dictionary;
mod document;
mod engine;
mod error;
mod rules;
mod similarity;
mod template;

pub use api::{
    Decision, DetectionReport, FilledDocument, NamedTemplate, Naming, Options, Proposal, ReviewItem, apply_review,
    detect_fields, detect_fields_verbose, fill_batch, fill_document, review_candidates,
};
pub use data::{CellValue, DataRow, DataSet, RowSource};
pub use dictionary::{Dictionary, DictionaryStore, JsonDictionaryStore};
pub use document::{BlockPath, BodyItem, Cell, Document, Paragraph, Row, Run, RunProps, Step, Table};
pub use engine::{
    BucketMask, Candidate, DetectionMetrics, Placeholders, Resolution, RuleMetrics, Scored, SynonymResolver, TextBlock,
    blocks, for_each_paragraph_mut, remaining_placeholders,
};
pub use error::{Error, Result};
pub use rules::keywords::DEFAULT_KEYWORDS;
pub use similarity::{Embedder, EmbeddingSimilarity, HashingEmbedder, Similarity, cosine};
pub use template::{Position, insert_placeholder, placeholder_for, templatize};

// --- Internal types ---------------------------------------------------------

bitflags::bitflags! {
    /// Which detection rules produced a candidate.
    ///
    /// A candidate found by several rules (for example `"Nombre:"` with
    /// `"Nombre"` in the keyword list) carries several bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
    pub struct RuleMask: u8 {
        const KEYWORD        = 1 << 0;
        const SEPARATOR      = 1 << 1;
        const TRAILING_COLON = 1 << 2;
        const ADJACENT_BLANK = 1 << 3;
    }
}

/// What a detection rule gets to look at: one trimmed block, the trimmed
/// block that follows it (if any) and the caller's settings.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BlockView<'a> {
    pub text: &'a str,
    pub next: Option<&'a str>,
    pub keywords: &'a [String],
    /// Next blocks shorter than this (in chars) count as a blank answer area.
    pub blank_len: usize,
}

pub(crate) type Production = Box<dyn Fn(&BlockView<'_>) -> Vec<String> + Send + Sync>;

/// A detection rule: a name, the rule bit it reports, the coarse buckets a
/// block must show for the rule to be worth running, and a `production`
/// that emits raw candidate strings for one block.
///
/// An empty `buckets` mask means the rule runs on every block.
pub(crate) struct Rule {
    pub name: &'static str,
    pub kind: RuleMask,
    pub buckets: BucketMask,
    pub production: Production,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("production", &"<function>")
            .field("buckets", &self.buckets)
            .finish()
    }
}
