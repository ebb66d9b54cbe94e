//! Synonym resolution.
//!
//! Maps a raw candidate onto the canonical field it most resembles:
//!
//! ```text
//! candidate ──┬─ dictionary empty? ──▶ NoMatch (similarity never called)
//!             └─ score against every canonical key (one batch call)
//!                  └─ max score > threshold ? Match : NoMatch
//! ```
//!
//! Only canonical keys are scored, not their synonyms. Resolution never
//! mutates the dictionary; confirming a suggestion is the caller's job.
//!
//! Ties: when several keys share the maximum score, the first one in
//! dictionary order wins. That is an artifact of the scan, not a contract.

use crate::api::Options;
use crate::dictionary::Dictionary;
use crate::similarity::Similarity;
use serde::Serialize;

/// A canonical key and its similarity to the candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scored {
    pub canonical: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    /// Best key scored strictly above the threshold.
    Match(Scored),
    /// Nothing cleared the threshold; `best` is the runner-up for display,
    /// absent when the dictionary was empty.
    NoMatch { best: Option<Scored> },
}

impl Resolution {
    pub fn canonical(&self) -> Option<&str> {
        match self {
            Resolution::Match(s) => Some(&s.canonical),
            Resolution::NoMatch { .. } => None,
        }
    }
}

/// Resolves candidates against a [`Dictionary`] with a pluggable
/// [`Similarity`].
#[derive(Debug, Clone)]
pub struct SynonymResolver<S> {
    similarity: S,
    threshold: f32,
}

impl<S: Similarity> SynonymResolver<S> {
    pub const DEFAULT_THRESHOLD: f32 = 0.8;

    pub fn new(similarity: S) -> Self {
        Self::with_threshold(similarity, Self::DEFAULT_THRESHOLD)
    }

    pub fn with_threshold(similarity: S, threshold: f32) -> Self {
        SynonymResolver { similarity, threshold }
    }

    /// A resolver using `options.threshold`.
    pub fn from_options(similarity: S, options: &Options) -> Self {
        Self::with_threshold(similarity, options.threshold)
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn resolve(&self, candidate: &str, dictionary: &Dictionary) -> Resolution {
        if dictionary.is_empty() {
            return Resolution::NoMatch { best: None };
        }

        let keys: Vec<&str> = dictionary.fields().collect();
        let scores = self.similarity.similarities(candidate, &keys);

        let mut best: Option<Scored> = None;
        for (key, score) in keys.iter().zip(scores) {
            if best.as_ref().is_none_or(|b| score > b.score) {
                best = Some(Scored { canonical: key.to_string(), score });
            }
        }

        tracing::debug!(candidate, best = ?best, threshold = self.threshold, "resolved candidate");

        match best {
            Some(b) if b.score > self.threshold => Resolution::Match(b),
            best => Resolution::NoMatch { best },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::{EmbeddingSimilarity, HashingEmbedder};
    use std::cell::Cell;

    /// Fixed scores by key; counts calls.
    struct Table {
        scores: Vec<(&'static str, f32)>,
        calls: Cell<usize>,
    }

    impl Similarity for Table {
        fn similarity(&self, _a: &str, b: &str) -> f32 {
            self.calls.set(self.calls.get() + 1);
            self.scores.iter().find(|(k, _)| *k == b).map(|(_, s)| *s).unwrap_or(-1.0)
        }
    }

    fn dict(keys: &[&str]) -> Dictionary {
        let mut d = Dictionary::new();
        for k in keys {
            d.insert_field(*k);
        }
        d
    }

    #[test]
    fn empty_dictionary_never_scores() {
        let table = Table { scores: vec![], calls: Cell::new(0) };
        let resolver = SynonymResolver::new(&table);
        for x in ["", "Nombre", "D.N.I."] {
            assert_eq!(resolver.resolve(x, &Dictionary::new()), Resolution::NoMatch { best: None });
        }
        assert_eq!(table.calls.get(), 0);
    }

    #[test]
    fn picks_max_above_threshold() {
        let table = Table { scores: vec![("Nombre", 0.5), ("D.N.I.", 0.93), ("Firma", 0.81)], calls: Cell::new(0) };
        let resolver = SynonymResolver::new(&table);
        let got = resolver.resolve("DNI", &dict(&["Nombre", "D.N.I.", "Firma"]));
        assert_eq!(got, Resolution::Match(Scored { canonical: "D.N.I.".into(), score: 0.93 }));
        assert_eq!(table.calls.get(), 3);
    }

    #[test]
    fn threshold_is_strict() {
        let table = Table { scores: vec![("Nombre", 0.8)], calls: Cell::new(0) };
        let got = SynonymResolver::new(&table).resolve("Nombre completo", &dict(&["Nombre"]));
        assert_eq!(got, Resolution::NoMatch { best: Some(Scored { canonical: "Nombre".into(), score: 0.8 }) });
        assert_eq!(got.canonical(), None);
    }

    #[test]
    fn options_threshold_is_honoured() {
        let table = Table { scores: vec![("Teléfono", 0.9)], calls: Cell::new(0) };
        let d = dict(&["Teléfono"]);

        let strict = SynonymResolver::from_options(&table, &Options { threshold: 0.95, ..Options::default() });
        assert_eq!(strict.threshold(), 0.95);
        assert_eq!(strict.resolve("Telefono", &d).canonical(), None);

        let default = SynonymResolver::from_options(&table, &Options::default());
        assert_eq!(default.resolve("Telefono", &d).canonical(), Some("Teléfono"));
    }

    #[test]
    fn exact_key_wins_over_neighbours() {
        let resolver = SynonymResolver::new(EmbeddingSimilarity::new(HashingEmbedder::default()));
        let d = dict(&["Nombre del representante", "Nombre", "Correo electrónico", "Número de expediente"]);
        for key in d.fields() {
            match resolver.resolve(key, &d) {
                Resolution::Match(s) => {
                    assert_eq!(s.canonical, key);
                    assert_eq!(s.score, 1.0);
                }
                other => panic!("{key}: expected a match, got {other:?}"),
            }
        }
    }
}
