//! TF-IDF bag-of-words classifier.
//!
//! Every example sentence is a document. Term frequencies are scaled by
//! `ln(documents / documents containing the term)`, and an input is answered
//! with the label of the most similar document (squared cosine similarity).
//! When the input shares no word with the corpus, the first label answers.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::Classifier;
use crate::config::load_json;
use crate::error::ConfigError;

/// One labeled group of example sentences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// Text handed back to the brain when this intent wins.
    pub label: String,
    pub examples: Vec<String>,
}

impl Intent {
    pub fn new<S: Into<String>>(label: impl Into<String>, examples: impl IntoIterator<Item = S>) -> Self {
        Self {
            label: label.into(),
            examples: examples.into_iter().map(Into::into).collect(),
        }
    }
}

type Bag = HashMap<usize, f64>;

#[derive(Debug, Clone, Default)]
pub struct BagOfWords {
    word_indices: HashMap<String, usize>,
    labels: Vec<String>,
    /// Label index per document.
    document_labels: Vec<usize>,
    bags: Vec<Bag>,
    idf: Vec<f64>,
}

fn words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| c.is_ascii_punctuation()).to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

fn similarity_sq(a: &Bag, b: &Bag) -> f64 {
    let dot: f64 = a.iter().map(|(i, x)| x * b.get(i).copied().unwrap_or(0.0)).sum();
    let sq_a: f64 = a.values().map(|x| x * x).sum();
    let sq_b: f64 = b.values().map(|x| x * x).sum();
    let denominator = sq_a * sq_b;
    if denominator == 0.0 {
        0.0
    } else {
        dot * dot / denominator
    }
}

impl BagOfWords {
    /// Build a classifier from labeled examples.
    pub fn new(intents: impl IntoIterator<Item = Intent>) -> Self {
        let mut model = Self::default();
        let mut document_frequency: Vec<usize> = Vec::new();

        for intent in intents {
            let label = model.labels.len();
            model.labels.push(intent.label);
            for example in &intent.examples {
                let words = words(example);
                if words.is_empty() {
                    continue;
                }
                let delta = 1.0 / words.len() as f64;
                let mut bag = Bag::new();
                let mut seen = HashSet::new();
                for word in words {
                    let next = model.word_indices.len();
                    let index = *model.word_indices.entry(word).or_insert(next);
                    if index == document_frequency.len() {
                        document_frequency.push(0);
                    }
                    if seen.insert(index) {
                        document_frequency[index] += 1;
                    }
                    *bag.entry(index).or_insert(0.0) += delta;
                }
                model.document_labels.push(label);
                model.bags.push(bag);
            }
        }

        let documents = model.bags.len() as f64;
        model.idf = document_frequency
            .iter()
            .map(|&df| (documents / df as f64).ln())
            .collect();
        for bag in &mut model.bags {
            for (index, weight) in bag.iter_mut() {
                *weight *= model.idf[*index];
            }
        }
        model
    }

    /// Load `[{"label": ..., "examples": [...]}, ...]` from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let intents: Vec<Intent> = load_json(path.as_ref())?;
        Ok(Self::new(intents))
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// The label closest to `text`, or `None` for an empty corpus.
    pub fn best_match(&self, text: &str) -> Option<&str> {
        let words = words(text);
        let mut bag_in = Bag::new();
        if !words.is_empty() {
            let delta = 1.0 / words.len() as f64;
            for word in &words {
                if let Some(&index) = self.word_indices.get(word) {
                    *bag_in.entry(index).or_insert(0.0) += delta * self.idf[index];
                }
            }
        }
        if bag_in.is_empty() {
            return self.labels.first().map(String::as_str);
        }

        let mut best: Option<(f64, usize)> = None;
        for (document, bag) in self.bags.iter().enumerate() {
            let score = similarity_sq(&bag_in, bag);
            if best.map_or(true, |(top, _)| score > top) {
                best = Some((score, document));
            }
        }
        best.map(|(_, document)| self.labels[self.document_labels[document]].as_str())
    }
}

impl Classifier for BagOfWords {
    fn classify(&self, text: &str) -> Option<String> {
        self.best_match(text).map(str::to_string)
    }
}
