//! TF-IDF vectorization over one film's review set.

use rustc_hash::{FxHashMap, FxHashSet};

/// Vocabulary and inverse document frequencies fitted on one corpus.
/// Terms are held in lexicographic order, which fixes component indices
/// and therefore every downstream tie-break.
#[derive(Debug, Clone)]
pub(crate) struct TfIdfModel {
    terms: Vec<String>,
    index: FxHashMap<String, usize>,
    idf: Vec<f32>,
}

impl TfIdfModel {
    /// Fit on tokenized documents, keeping terms with document frequency
    /// of at least `min_df`.
    pub(crate) fn fit(docs: &[Vec<String>], min_df: usize) -> Self {
        let mut df: FxHashMap<&str, usize> = FxHashMap::default();
        for doc in docs {
            let unique: FxHashSet<&str> = doc.iter().map(String::as_str).collect();
            for term in unique {
                *df.entry(term).or_insert(0) += 1;
            }
        }

        let mut terms: Vec<String> = df
            .iter()
            .filter(|(_, count)| **count >= min_df.max(1))
            .map(|(term, _)| (*term).to_string())
            .collect();
        terms.sort();

        let index: FxHashMap<String, usize> = terms
            .iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i))
            .collect();

        let doc_count = docs.len() as f32;
        let idf = terms
            .iter()
            .map(|term| {
                let freq = df.get(term.as_str()).copied().unwrap_or(0) as f32;
                ((1.0 + doc_count) / (1.0 + freq)).ln() + 1.0
            })
            .collect();

        Self { terms, index, idf }
    }

    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.terms.len()
    }

    #[must_use]
    pub(crate) fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    #[must_use]
    pub(crate) fn term(&self, index: usize) -> &str {
        &self.terms[index]
    }

    /// L2-normalized TF-IDF vector for one document. All-zero when no
    /// token survived the vocabulary cut.
    #[must_use]
    pub(crate) fn vectorize(&self, tokens: &[String]) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.terms.len()];
        if tokens.is_empty() {
            return vector;
        }

        for token in tokens {
            if let Some(&i) = self.index.get(token) {
                vector[i] += 1.0;
            }
        }

        let inv_len = 1.0 / tokens.len() as f32;
        for (component, idf) in vector.iter_mut().zip(&self.idf) {
            *component *= inv_len * idf;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for component in &mut vector {
                *component /= norm;
            }
        }

        vector
    }
}
