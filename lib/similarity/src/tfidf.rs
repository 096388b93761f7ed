//! TF-IDF text model
//!
//! Fits a vocabulary and inverse document frequencies on a small corpus and
//! projects text into the same sparse space.
//!
//! ```text
//! tf(t, d)  = count of t in d
//! idf(t)    = ln((1 + n) / (1 + df(t))) + 1
//! w(t, d)   = tf(t, d) * idf(t), rows L2-normalized
//! ```
//!
//! Because every row is unit length, cosine similarity between two rows is
//! their dot product.

use ahash::AHashMap;
use std::collections::BTreeSet;

use crate::tokenize::Tokenizer;

/// Sparse vector of `(dimension, weight)` pairs sorted by dimension
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f32)>,
}

impl SparseVector {
    /// Build from unsorted entries; duplicate dimensions are summed
    pub fn new(mut entries: Vec<(usize, f32)>) -> Self {
        entries.sort_by_key(|(dim, _)| *dim);
        let mut merged: Vec<(usize, f32)> = Vec::with_capacity(entries.len());
        for (dim, weight) in entries {
            match merged.last_mut() {
                Some((last, w)) if *last == dim => *w += weight,
                _ => merged.push((dim, weight)),
            }
        }
        Self { entries: merged }
    }

    #[inline]
    pub fn entries(&self) -> &[(usize, f32)] {
        &self.entries
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, dim: usize) -> f32 {
        self.entries
            .binary_search_by_key(&dim, |(d, _)| *d)
            .map(|i| self.entries[i].1)
            .unwrap_or(0.0)
    }

    pub fn norm(&self) -> f32 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt()
    }

    /// Scale to unit length; the zero vector stays zero
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > f32::EPSILON {
            let inv_norm = 1.0 / norm;
            for (_, w) in &mut self.entries {
                *w *= inv_norm;
            }
        }
    }

    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (a_dim, a_w) = self.entries[i];
            let (b_dim, b_w) = other.entries[j];
            match a_dim.cmp(&b_dim) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a_w * b_w;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Cosine similarity in [0, 1] for non-negative vectors; 0 if either is zero
    pub fn cosine_similarity(&self, other: &SparseVector) -> f32 {
        let norm_a = self.norm();
        let norm_b = other.norm();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        (self.dot(other) / (norm_a * norm_b)).clamp(0.0, 1.0)
    }
}

/// TF-IDF model fitted on one corpus
#[derive(Debug, Clone)]
pub struct TfidfModel {
    tokenizer: Tokenizer,
    vocabulary: AHashMap<String, usize>,
    terms: Vec<String>,
    idf: Vec<f32>,
    rows: Vec<SparseVector>,
}

impl TfidfModel {
    /// Fit on `docs`; dimensions are assigned to terms in sorted order
    pub fn fit<'a, I>(docs: I, tokenizer: Tokenizer) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let tokenized: Vec<Vec<String>> = docs.into_iter().map(|d| tokenizer.tokenize(d)).collect();

        let terms: Vec<String> = tokenized
            .iter()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let vocabulary: AHashMap<String, usize> = terms
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx))
            .collect();

        let mut df = vec![0u32; terms.len()];
        for doc in &tokenized {
            let distinct: BTreeSet<usize> = doc.iter().map(|t| vocabulary[t.as_str()]).collect();
            for dim in distinct {
                df[dim] += 1;
            }
        }

        let n = tokenized.len() as f32;
        let idf = df
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f32)).ln() + 1.0)
            .collect();

        let mut model = Self {
            tokenizer,
            vocabulary,
            terms,
            idf,
            rows: Vec::new(),
        };
        let rows = tokenized.iter().map(|doc| model.weigh(doc)).collect();
        model.rows = rows;
        model
    }

    fn weigh(&self, tokens: &[String]) -> SparseVector {
        let entries = tokens
            .iter()
            .filter_map(|t| self.vocabulary.get(t.as_str()))
            .map(|&dim| (dim, self.idf[dim]))
            .collect();
        let mut vector = SparseVector::new(entries);
        vector.normalize();
        vector
    }

    /// Project text into the fitted space; unseen terms are dropped
    pub fn transform(&self, text: &str) -> SparseVector {
        self.weigh(&self.tokenizer.tokenize(text))
    }

    /// Cosine similarity of `query` against every fitted document, in corpus order
    pub fn similarities(&self, query: &SparseVector) -> Vec<f32> {
        self.rows.iter().map(|row| row.cosine_similarity(query)).collect()
    }

    #[inline]
    pub fn n_docs(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn vocabulary_len(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    pub fn row(&self, doc: usize) -> Option<&SparseVector> {
        self.rows.get(doc)
    }

    #[inline]
    pub fn term(&self, dim: usize) -> Option<&str> {
        self.terms.get(dim).map(String::as_str)
    }

    pub fn idf(&self, term: &str) -> Option<f32> {
        self.vocabulary.get(term).map(|&dim| self.idf[dim])
    }
}
