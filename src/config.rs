//! Brain configuration.
//!
//! Every field has a default, so a config file only needs to name what it
//! changes. Resource paths are resolved by
//! [`BrainBuilder::from_config`](crate::brain::BrainBuilder::from_config).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::learn::UnlearnPolicy;
use crate::pattern::PunctuationPolicy;
use crate::utilities::substitutions::SubstitutionKind;

/// Configuration used to build a [`Brain`](crate::brain::Brain).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrainConfig {
    /// Maximum nesting of `srai` / `sr` redirections within one turn.
    pub max_srai_depth: usize,
    /// Maximum number of `loop` re-evaluations within one turn.
    pub max_loop_iterations: usize,
    /// Which categories `unlearn` removes.
    pub unlearn_policy: UnlearnPolicy,
    /// How punctuation inside words is treated when matching.
    pub punctuation: PunctuationPolicy,
    /// Match words case-sensitively.
    pub case_sensitive: bool,
    /// Value read for a predicate that was never set.
    pub default_predicate: String,
    /// Word fed to the matcher when there is no previous utterance or no topic.
    pub default_context: String,
    /// Split input on sentence punctuation and answer each sentence.
    pub split_sentences: bool,
    /// Seed for `random`; `None` seeds from entropy.
    pub random_seed: Option<u64>,

    /// JSON files holding arrays of category definitions.
    pub category_files: Vec<PathBuf>,
    /// JSON object of bot properties.
    pub bot_file: Option<PathBuf>,
    /// JSON object of initial predicate values.
    pub predicates_file: Option<PathBuf>,
    /// JSON arrays of words; the file stem names the set.
    pub set_files: Vec<PathBuf>,
    /// JSON objects of key/value pairs; the file stem names the map.
    pub map_files: Vec<PathBuf>,
    /// JSON objects of word substitutions, per table.
    pub substitution_files: HashMap<SubstitutionKind, PathBuf>,
    /// JSON labeled corpus for the bag-of-words classifier.
    pub classifier_file: Option<PathBuf>,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            max_srai_depth: 30,
            max_loop_iterations: 100,
            unlearn_policy: UnlearnPolicy::default(),
            punctuation: PunctuationPolicy::default(),
            case_sensitive: false,
            default_predicate: String::new(),
            default_context: "unknown".to_string(),
            split_sentences: true,
            random_seed: None,
            category_files: Vec::new(),
            bot_file: None,
            predicates_file: None,
            set_files: Vec::new(),
            map_files: Vec::new(),
            substitution_files: HashMap::new(),
            classifier_file: None,
        }
    }
}

impl BrainConfig {
    /// Create a config with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        load_json(path.as_ref())
    }

    /// Set the `random` seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Set the srai depth bound.
    pub fn with_max_srai_depth(mut self, depth: usize) -> Self {
        self.max_srai_depth = depth;
        self
    }

    /// Set the loop iteration bound.
    pub fn with_max_loop_iterations(mut self, iterations: usize) -> Self {
        self.max_loop_iterations = iterations;
        self
    }

    /// Set the unlearn scope.
    pub fn with_unlearn_policy(mut self, policy: UnlearnPolicy) -> Self {
        self.unlearn_policy = policy;
        self
    }

    /// Set the punctuation policy.
    pub fn with_punctuation(mut self, policy: PunctuationPolicy) -> Self {
        self.punctuation = policy;
        self
    }
}

/// Read and deserialize a JSON file.
pub(crate) fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let value = serde_json::from_str(&content)?;
    log::info!("Loaded {}", path.display());
    Ok(value)
}

/// Lower-cased file stem, used to name sets and maps.
pub(crate) fn resource_name(path: &Path) -> Result<String, ConfigError> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_lowercase)
        .ok_or_else(|| ConfigError::Resource {
            path: path.display().to_string(),
            message: "file name has no usable stem".to_string(),
        })
}
