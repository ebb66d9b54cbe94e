//! Text similarity.
//!
//! The resolver only needs `similarity(a, b) -> [-1, 1]`, symmetric and
//! deterministic. Anything satisfying that can plug in through
//! [`Similarity`]: an edit distance, a bag of words, a sentence-embedding
//! model behind an [`Embedder`].
//!
//! [`EmbeddingSimilarity`] turns an embedder into a similarity by cosine, and
//! batches: when scoring one candidate against many dictionary keys it embeds
//! the candidate once and the keys in one call.
//!
//! [`HashingEmbedder`] is the built-in embedder. It needs no model files:
//! accent-folded lowercase words plus character trigrams of the letters-only
//! form, hashed into a fixed-size vector and L2-normalized. `"D.N.I."` and
//! `"DNI"` share their trigrams; `"Teléfono"` and `"telefono"` embed
//! identically.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;
use xxhash_rust::xxh3::xxh3_64;

pub trait Similarity {
    /// Symmetric, deterministic score in `[-1, 1]`.
    fn similarity(&self, a: &str, b: &str) -> f32;

    /// Score `query` against each of `others`, in order.
    fn similarities(&self, query: &str, others: &[&str]) -> Vec<f32> {
        others.iter().map(|o| self.similarity(query, o)).collect()
    }
}

impl<S: Similarity + ?Sized> Similarity for &S {
    fn similarity(&self, a: &str, b: &str) -> f32 {
        (**self).similarity(a, b)
    }

    fn similarities(&self, query: &str, others: &[&str]) -> Vec<f32> {
        (**self).similarities(query, others)
    }
}

/// Maps text to a dense vector.
pub trait Embedder {
    fn embed(&self, text: &str) -> Vec<f32>;

    fn embed_batch(&self, texts: &[&str]) -> Vec<Vec<f32>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Cosine similarity, clamped to `[-1, 1]`. Zero vectors score 0.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0f64;
    let mut na = 0f64;
    let mut nb = 0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    (dot / (na.sqrt() * nb.sqrt())).clamp(-1.0, 1.0) as f32
}

/// Cosine similarity over an [`Embedder`]. Identical strings score exactly 1.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingSimilarity<E> {
    embedder: E,
}

impl<E: Embedder> EmbeddingSimilarity<E> {
    pub fn new(embedder: E) -> Self {
        EmbeddingSimilarity { embedder }
    }
}

impl<E: Embedder> Similarity for EmbeddingSimilarity<E> {
    fn similarity(&self, a: &str, b: &str) -> f32 {
        if a == b {
            return 1.0;
        }
        cosine(&self.embedder.embed(a), &self.embedder.embed(b))
    }

    fn similarities(&self, query: &str, others: &[&str]) -> Vec<f32> {
        let q = self.embedder.embed(query);
        let embedded = self.embedder.embed_batch(others);
        others.iter().zip(&embedded).map(|(o, e)| if *o == query { 1.0 } else { cosine(&q, e) }).collect()
    }
}

/// Feature-hashing embedder: character trigrams of the letters-only form,
/// plus whole words of two or more characters at half weight.
#[derive(Debug, Clone, Copy)]
pub struct HashingEmbedder {
    dims: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        HashingEmbedder { dims: 512 }
    }
}

impl HashingEmbedder {
    const WORD_WEIGHT: f32 = 0.5;
    const TRIGRAM_WEIGHT: f32 = 1.0;

    pub fn with_dims(dims: usize) -> Self {
        HashingEmbedder { dims: dims.max(1) }
    }

    fn bump(&self, v: &mut [f32], feature: &str, weight: f32) {
        let idx = (xxh3_64(feature.as_bytes()) % self.dims as u64) as usize;
        v[idx] += weight;
    }
}

/// Decompose, drop combining marks, lowercase.
fn fold(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).flat_map(char::to_lowercase).collect()
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dims];
        let folded = fold(text);
        let words: Vec<&str> = folded.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()).collect();

        // Single letters are initials ("D.N.I."); the trigrams already cover them.
        for w in words.iter().filter(|w| w.chars().nth(1).is_some()) {
            self.bump(&mut v, &format!("w:{w}"), Self::WORD_WEIGHT);
        }

        let padded: Vec<char> = std::iter::once(' ').chain(words.concat().chars()).chain(std::iter::once(' ')).collect();
        if padded.len() > 2 {
            for tri in padded.windows(3) {
                let tri: String = tri.iter().collect();
                self.bump(&mut v, &format!("t:{tri}"), Self::TRIGRAM_WEIGHT);
            }
        }

        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim() -> EmbeddingSimilarity<HashingEmbedder> {
        EmbeddingSimilarity::new(HashingEmbedder::default())
    }

    #[test]
    fn fold_strips_accents_and_case() {
        assert_eq!(fold("Teléfono"), "telefono");
        assert_eq!(fold("DON/DOÑA"), "don/dona");
    }

    #[test]
    fn scores_are_symmetric_and_bounded() {
        let s = sim();
        let pairs = [("D.N.I.", "DNI"), ("Nombre", "Nombre del representante"), ("Firma", "Provincia"), ("", "x")];
        for (a, b) in pairs {
            let ab = s.similarity(a, b);
            assert_eq!(ab, s.similarity(b, a));
            assert!((-1.0..=1.0).contains(&ab), "{a} / {b}: {ab}");
        }
    }

    #[test]
    fn punctuation_and_accents_do_not_matter_much() {
        let s = sim();
        assert!(s.similarity("Teléfono", "telefono") > 0.99);
        assert!(s.similarity("D.N.I.", "DNI") > 0.8);
        assert!(s.similarity("Firma", "Código postal") < 0.5);
    }

    #[test]
    fn batch_matches_pairwise() {
        let s = sim();
        let keys = ["Nombre", "Teléfono", "Nombre"];
        let batch = s.similarities("Nombre completo", &keys);
        let single: Vec<f32> = keys.iter().map(|k| s.similarity("Nombre completo", k)).collect();
        assert_eq!(batch, single);
    }

    #[test]
    fn cosine_handles_zero_vectors() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine(&[1.0, 0.0], &[-2.0, 0.0]), -1.0);
    }
}
