//! TF-IDF text vectorizer.
//!
//! Tokens are runs of two or more word characters, combined into word
//! n-grams. Combining marks (`\p{M}`) are not word characters here: a vowel
//! sign or virama ends a token, matching how the fitted vocabularies split
//! Devanagari and decomposed accents. Term counts are optionally sublinear,
//! weighted by the fitted idf and normalized per document.

use super::error::{ArtifactError, PipelineError};
use lazy_static::lazy_static;
use ndarray::{Array1, ArrayView1};
use regex::Regex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

lazy_static! {
    static ref TOKEN_PATTERN: Regex = Regex::new(r"(?u)[\w--\p{M}]{2,}").unwrap();
}

/// Maps raw text into the feature space of a classifier.
pub trait TextVectorizer: Send + Sync {
    fn n_features(&self) -> usize;

    fn transform(&self, text: &str) -> Result<Array1<f64>, PipelineError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    #[default]
    L2,
    L1,
    None,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    #[serde(default = "default_ngram_range")]
    ngram_range: (usize, usize),
    #[serde(default)]
    sublinear_tf: bool,
    #[serde(default)]
    norm: Norm,
    #[serde(default = "default_lowercase")]
    lowercase: bool,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_lowercase() -> bool {
    true
}

impl TfidfVectorizer {
    pub fn from_json(raw: &str) -> Result<Self, ArtifactError> {
        let vectorizer: TfidfVectorizer = serde_json::from_str(raw)?;
        vectorizer.validate()?;
        Ok(vectorizer)
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        if self.vocabulary.is_empty() {
            return Err(ArtifactError::Invalid("vectorizer vocabulary is empty".into()));
        }
        if self.idf.len() != self.vocabulary.len() {
            return Err(ArtifactError::Invalid(format!(
                "vectorizer has {} idf weights for {} terms",
                self.idf.len(),
                self.vocabulary.len()
            )));
        }

        let mut seen = HashSet::with_capacity(self.vocabulary.len());
        for (term, &column) in &self.vocabulary {
            if column >= self.idf.len() || !seen.insert(column) {
                return Err(ArtifactError::Invalid(format!(
                    "term '{}' maps to invalid column {}",
                    term, column
                )));
            }
        }

        if let Some(weight) = self.idf.iter().find(|w| !w.is_finite() || **w <= 0.0) {
            return Err(ArtifactError::Invalid(format!(
                "idf weight {} is not a positive finite number",
                weight
            )));
        }

        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ArtifactError::Invalid(format!(
                "invalid ngram range ({}, {})",
                min_n, max_n
            )));
        }

        Ok(())
    }

    /// Splits text into the n-gram terms looked up in the vocabulary.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        let words: Vec<&str> = TOKEN_PATTERN.find_iter(&text).map(|m| m.as_str()).collect();

        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n.min(words.len()) {
            terms.extend(words.windows(n).map(|window| window.join(" ")));
        }
        terms
    }

    fn normalize(&self, features: &mut Array1<f64>) {
        let norm = match self.norm {
            Norm::L2 => features.iter().map(|v| v * v).sum::<f64>().sqrt(),
            Norm::L1 => features.iter().map(|v| v.abs()).sum(),
            Norm::None => return,
        };
        if norm > 0.0 {
            features.mapv_inplace(|v| v / norm);
        }
    }
}

impl TextVectorizer for TfidfVectorizer {
    fn n_features(&self) -> usize {
        self.idf.len()
    }

    fn transform(&self, text: &str) -> Result<Array1<f64>, PipelineError> {
        let mut features = Array1::<f64>::zeros(self.idf.len());
        for term in self.analyze(text) {
            if let Some(&column) = self.vocabulary.get(&term) {
                features[column] += 1.0;
            }
        }

        if self.sublinear_tf {
            features.mapv_inplace(|tf| if tf > 0.0 { tf.ln() + 1.0 } else { 0.0 });
        }

        let idf = ArrayView1::from(&self.idf[..]);
        features.zip_mut_with(&idf, |tf, weight| *tf *= *weight);
        self.normalize(&mut features);

        Ok(features)
    }
}
