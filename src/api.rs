use crate::data::{DataRow, RowSource};
use crate::dictionary::Dictionary;
use crate::document::Document;
use crate::engine::{self, Candidate, DetectionMetrics, Placeholders, Resolution, Scored, SynonymResolver};
use crate::rules::keywords::DEFAULT_KEYWORDS;
use crate::similarity::Similarity;
use crate::Rule;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static DEFAULT_RULES: Lazy<Vec<Rule>> = Lazy::new(crate::rules::detection::get);

/// Knobs for detection, resolution and filling.
///
/// The defaults are the ones the dictionary in the wild was built with;
/// changing the length bounds or the blank limit changes which candidates a
/// given form yields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Seed vocabulary for keyword containment. Matched case-insensitively,
    /// emitted as written here.
    pub keywords: Vec<String>,
    /// Candidates must be longer than this, in chars.
    pub min_len: usize,
    /// Candidates must be shorter than this, in chars.
    pub max_len: usize,
    /// A following block shorter than this (trimmed, in chars) is a blank
    /// answer area.
    pub blank_len: usize,
    /// Synonym suggestions need a similarity strictly above this. Read by
    /// [`SynonymResolver::from_options`].
    pub threshold: f32,
    /// Tables nested deeper than this are not walked.
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            min_len: 2,
            max_len: 60,
            blank_len: 5,
            threshold: 0.8,
            max_depth: 64,
        }
    }
}

/// Result of [`detect_fields_verbose`].
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    /// Candidates sorted by name, with the rules and blocks behind each.
    pub candidates: Vec<Candidate>,
    pub metrics: DetectionMetrics,
    /// Names of the rules that ran, in evaluation order.
    pub active_rules: Vec<String>,
}

impl DetectionReport {
    pub fn names(&self) -> Vec<String> {
        self.candidates.iter().map(|c| c.name.clone()).collect()
    }
}

/// Candidate field names found in `document`, deduplicated and sorted.
///
/// # Example
/// ```
/// use formwright::{Document, Options, detect_fields};
///
/// let doc = Document::from_paragraphs(&["Nombre:", "Ana García López"]);
/// assert_eq!(detect_fields(&doc, &Options::default()), vec!["Nombre"]);
/// ```
pub fn detect_fields(document: &Document, options: &Options) -> Vec<String> {
    detect_fields_verbose(document, options).names()
}

/// Like [`detect_fields`], but keeps per-candidate evidence and run metrics.
pub fn detect_fields_verbose(document: &Document, options: &Options) -> DetectionReport {
    let blocks = engine::blocks(document, options.max_depth);
    let detector = engine::Detector::new(
        &DEFAULT_RULES,
        &options.keywords,
        options.min_len,
        options.max_len,
        options.blank_len,
    );
    let (candidates, metrics) = detector.detect(&blocks);

    tracing::info!(blocks = metrics.blocks, candidates = candidates.len(), "fields detected");

    DetectionReport {
        candidates,
        metrics,
        active_rules: DEFAULT_RULES.iter().map(|r| r.name.to_string()).collect(),
    }
}

// --- Review -----------------------------------------------------------------

/// What the dictionary suggests doing with one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Proposal {
    /// Already a canonical key or a listed synonym.
    Known { canonical: String },
    /// Close enough to an existing key to be recorded as its synonym.
    SynonymOf { canonical: String, score: f32 },
    /// Nothing close; offer it as a new canonical field.
    NewField { best: Option<Scored> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewItem {
    pub candidate: String,
    pub proposal: Proposal,
}

impl ReviewItem {
    /// The dictionary change this item proposes, if any.
    pub fn accept(&self) -> Option<Decision> {
        match &self.proposal {
            Proposal::Known { .. } => None,
            Proposal::SynonymOf { canonical, .. } => {
                Some(Decision::AddSynonym { canonical: canonical.clone(), synonym: self.candidate.clone() })
            }
            Proposal::NewField { .. } => Some(Decision::AddField { name: self.candidate.clone() }),
        }
    }
}

/// A dictionary change the user confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    AddSynonym { canonical: String, synonym: String },
    AddField { name: String },
}

/// Classify each candidate against `dictionary`. Nothing is written.
pub fn review_candidates<S, I>(candidates: I, dictionary: &Dictionary, resolver: &SynonymResolver<S>) -> Vec<ReviewItem>
where
    S: Similarity,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    candidates
        .into_iter()
        .map(|c| {
            let candidate = c.as_ref().to_string();
            let proposal = match dictionary.canonical_for(&candidate) {
                Some(canonical) => Proposal::Known { canonical: canonical.to_string() },
                None => match resolver.resolve(&candidate, dictionary) {
                    Resolution::Match(Scored { canonical, score }) => Proposal::SynonymOf { canonical, score },
                    Resolution::NoMatch { best } => Proposal::NewField { best },
                },
            };
            ReviewItem { candidate, proposal }
        })
        .collect()
}

/// Apply confirmed decisions. Returns the updated dictionary and whether
/// anything changed; callers persist only in the latter case.
pub fn apply_review<I>(mut dictionary: Dictionary, decisions: I) -> (Dictionary, bool)
where
    I: IntoIterator<Item = Decision>,
{
    let mut changed = false;
    for decision in decisions {
        changed |= match decision {
            Decision::AddSynonym { canonical, synonym } => dictionary.add_synonym(canonical, synonym),
            Decision::AddField { name } => dictionary.insert_field(name),
        };
    }
    (dictionary, changed)
}

// --- Fill -------------------------------------------------------------------

/// A fresh copy of `template` with `row` substituted into every paragraph.
pub fn fill_document(template: &Document, row: &DataRow, options: &Options) -> Document {
    let mut document = template.clone();
    let changed = Placeholders::for_row(row).fill_document(&mut document, row, options.max_depth);
    tracing::debug!(changed, "template filled");
    document
}

/// A template and the file name it was loaded from.
#[derive(Debug, Clone)]
pub struct NamedTemplate {
    pub name: String,
    pub document: Document,
}

/// How filled documents are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Naming {
    /// Column whose value goes into each output name.
    pub name_column: String,
}

impl Default for Naming {
    fn default() -> Self {
        Naming { name_column: "Nombre".to_string() }
    }
}

impl Naming {
    /// `documento_<name>_<i+1>_<template>`, or `documento_<i+1>_<template>`
    /// when the row has no usable name. Path separators in the name become
    /// `_`.
    pub fn file_name(&self, row: &DataRow, row_index: usize, template: &str) -> String {
        let name = row.get(&self.name_column).map(|v| v.to_string()).unwrap_or_default();
        let name = name.trim().replace(['/', '\\'], "_");
        if name.is_empty() {
            format!("documento_{}_{template}", row_index + 1)
        } else {
            format!("documento_{name}_{}_{template}", row_index + 1)
        }
    }
}

/// One output of [`fill_batch`].
#[derive(Debug, Clone)]
pub struct FilledDocument {
    pub file_name: String,
    pub document: Document,
    pub row_index: usize,
    pub template: String,
}

/// Fill every template once per row, rows outermost.
pub fn fill_batch<R: RowSource + ?Sized>(
    templates: &[NamedTemplate],
    rows: &R,
    naming: &Naming,
    options: &Options,
) -> Vec<FilledDocument> {
    let mut out = Vec::with_capacity(templates.len() * rows.rows().len());
    for (row_index, row) in rows.rows().iter().enumerate() {
        let placeholders = Placeholders::for_row(row);
        for template in templates {
            let mut document = template.document.clone();
            placeholders.fill_document(&mut document, row, options.max_depth);
            out.push(FilledDocument {
                file_name: naming.file_name(row, row_index, &template.name),
                document,
                row_index,
                template: template.name.clone(),
            });
        }
    }
    tracing::info!(rows = rows.rows().len(), templates = templates.len(), documents = out.len(), "batch filled");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CellValue, DataSet};
    use crate::document::{BodyItem, Cell, Paragraph, Table};
    use crate::similarity::{EmbeddingSimilarity, HashingEmbedder};

    fn resolver() -> SynonymResolver<EmbeddingSimilarity<HashingEmbedder>> {
        SynonymResolver::from_options(EmbeddingSimilarity::new(HashingEmbedder::default()), &Options::default())
    }

    #[test]
    fn verbose_report_lists_rules_and_evidence() {
        let doc = Document::from_paragraphs(&["Nombre:", "Ana García López"]);
        let report = detect_fields_verbose(&doc, &Options::default());
        assert_eq!(report.active_rules, vec!["keyword_containment", "separator_run", "trailing_colon", "adjacent_blank"]);
        assert_eq!(report.names(), vec!["Nombre"]);
        assert_eq!(report.metrics.blocks, 2);
    }

    #[test]
    fn review_classifies_known_synonym_and_new() {
        let mut dict = Dictionary::new();
        dict.add_synonym("Teléfono", "Tfno.");
        dict.insert_field("D.N.I.");

        let items = review_candidates(["Tfno.", "Telefono", "Firma del solicitante"], &dict, &resolver());
        assert_eq!(items[0].proposal, Proposal::Known { canonical: "Teléfono".into() });
        assert!(matches!(&items[1].proposal, Proposal::SynonymOf { canonical, .. } if canonical == "Teléfono"));
        assert!(matches!(items[2].proposal, Proposal::NewField { .. }));
    }

    #[test]
    fn review_follows_options_threshold() {
        let mut dict = Dictionary::new();
        dict.insert_field("Teléfono");

        let options = Options { threshold: 1.0, ..Options::default() };
        let strict = SynonymResolver::from_options(EmbeddingSimilarity::new(HashingEmbedder::default()), &options);
        let items = review_candidates(["Telefono"], &dict, &strict);
        assert!(matches!(items[0].proposal, Proposal::NewField { best: Some(_) }));

        let items = review_candidates(["Telefono"], &dict, &resolver());
        assert!(matches!(&items[0].proposal, Proposal::SynonymOf { canonical, .. } if canonical == "Teléfono"));
    }

    #[test]
    fn review_on_empty_dictionary_proposes_new_fields() {
        let items = review_candidates(vec!["DNI".to_string()], &Dictionary::new(), &resolver());
        assert_eq!(items[0].proposal, Proposal::NewField { best: None });
        assert_eq!(items[0].accept(), Some(Decision::AddField { name: "DNI".into() }));
    }

    #[test]
    fn apply_review_reports_changes() {
        let mut dict = Dictionary::new();
        dict.add_synonym("Nombre", "Nombre completo");

        let decisions = vec![
            Decision::AddField { name: "Nombre".into() },
            Decision::AddSynonym { canonical: "Nombre".into(), synonym: "Nombre completo".into() },
        ];
        let (dict, changed) = apply_review(dict, decisions);
        assert!(!changed);
        assert_eq!(dict.synonyms("Nombre").map(<[String]>::len), Some(1));

        let (dict, changed) = apply_review(dict, [Decision::AddField { name: "Provincia".into() }]);
        assert!(changed);
        assert_eq!(dict.fields().collect::<Vec<_>>(), vec!["Nombre", "Provincia"]);
    }

    #[test]
    fn fill_document_leaves_template_alone() {
        let template = Document::from_paragraphs(&["Hola {{Nombre}}"]);
        let row: DataRow = [("Nombre", "Ana")].into_iter().collect();
        let filled = fill_document(&template, &row, &Options::default());
        assert_eq!(filled, Document::from_paragraphs(&["Hola Ana"]));
        assert_eq!(template, Document::from_paragraphs(&["Hola {{Nombre}}"]));
    }

    #[test]
    fn fill_batch_names_and_orders_outputs() {
        let cell = Table::new(vec![vec![Cell::text("DNI: {{DNI}}")]]);
        let templates = vec![
            NamedTemplate { name: "carta.json".into(), document: Document::from_paragraphs(&["{{Nombre}}"]) },
            NamedTemplate {
                name: "ficha.json".into(),
                document: Document::new(vec![BodyItem::Table(cell), BodyItem::Paragraph(Paragraph::new("fin"))]),
            },
        ];
        let mut second = DataRow::new();
        second.insert("DNI", CellValue::Int(42));
        let data = DataSet {
            columns: vec!["Nombre".into(), "DNI".into()],
            rows: vec![[("Nombre", "Ana"), ("DNI", "1Z")].into_iter().collect(), second],
        };

        let out = fill_batch(&templates, &data, &Naming::default(), &Options::default());
        let names: Vec<&str> = out.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["documento_Ana_1_carta.json", "documento_Ana_1_ficha.json", "documento_2_carta.json", "documento_2_ficha.json"]
        );
        assert_eq!(out[3].document.paragraph(&"0/r0c0/p0".parse().unwrap()).unwrap().text(), "DNI: 42");
        assert_eq!(out[2].document, Document::from_paragraphs(&["{{Nombre}}"]));
    }
}
