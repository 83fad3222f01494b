//! Brain construction.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::state::BrainCore;
use super::Brain;
use crate::classifier::{BagOfWords, Classifier};
use crate::config::{load_json, resource_name, BrainConfig};
use crate::error::ConfigError;
use crate::memory::{History, PredicateStore};
use crate::pattern::{CategoryDef, Matcher, Normalizer, Origin};
use crate::utilities::{
    BotProfile, ChronoDateFormatter, DateFormatter, MapRegistry, SubstitutionKind, Substitutions,
    WordSets,
};

/// Builder for [`Brain`].
///
/// # Example
///
/// ```
/// use aiml_brain::{Brain, BrainConfig, CategoryDef, TemplateNode};
///
/// let brain = Brain::builder()
///     .with_config(BrainConfig::new().with_random_seed(1))
///     .with_bot_property("name", "Ada")
///     .with_category(CategoryDef::new(
///         "what is your name",
///         TemplateNode::seq(["I am ".into(), TemplateNode::bot("name")]),
///     ))
///     .build();
/// assert_eq!(brain.process("What is your name?").unwrap(), "I am Ada");
/// ```
pub struct BrainBuilder {
    config: BrainConfig,
    categories: Vec<CategoryDef>,
    profile: Vec<(String, String)>,
    predicates: Vec<(String, String)>,
    sets: Vec<(String, Vec<String>)>,
    functions: MapRegistry,
    substitutions: Substitutions,
    date_formatter: Option<Box<dyn DateFormatter>>,
    classifier: Option<Box<dyn Classifier>>,
}

impl Default for BrainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BrainBuilder {
    pub fn new() -> Self {
        Self {
            config: BrainConfig::default(),
            categories: Vec::new(),
            profile: Vec::new(),
            predicates: Vec::new(),
            sets: Vec::new(),
            functions: MapRegistry::new(),
            substitutions: Substitutions::new(),
            date_formatter: None,
            classifier: None,
        }
    }

    /// Start from a config and load every resource file it names.
    pub fn from_config(config: BrainConfig) -> Result<Self, ConfigError> {
        let mut builder = Self::new();

        for path in &config.category_files {
            let defs: Vec<CategoryDef> = load_json(path)?;
            builder = builder.with_categories(defs);
        }
        if let Some(path) = &config.bot_file {
            let properties: HashMap<String, String> = load_json(path)?;
            builder.profile.extend(properties);
        }
        if let Some(path) = &config.predicates_file {
            let predicates: HashMap<String, String> = load_json(path)?;
            builder.predicates.extend(predicates);
        }
        for path in &config.set_files {
            let members: Vec<String> = load_json(path)?;
            builder = builder.with_set(&resource_name(path)?, members);
        }
        for path in &config.map_files {
            let table: HashMap<String, String> = load_json(path)?;
            builder = builder.with_map_table(&resource_name(path)?, table);
        }
        for (kind, path) in &config.substitution_files {
            let table: HashMap<String, String> = load_json(path)?;
            builder = builder.with_substitutions(*kind, table);
        }
        if let Some(path) = &config.classifier_file {
            builder = builder.with_classifier(BagOfWords::from_json_file(path)?);
        }

        Ok(builder.with_config(config))
    }

    pub fn with_config(mut self, config: BrainConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_category(mut self, def: CategoryDef) -> Self {
        self.categories.push(def);
        self
    }

    pub fn with_categories(mut self, defs: impl IntoIterator<Item = CategoryDef>) -> Self {
        self.categories.extend(defs);
        self
    }

    pub fn with_bot_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.profile.push((name.into(), value.into()));
        self
    }

    /// Initial predicate value. Set before any subscriber exists.
    pub fn with_predicate(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.predicates.push((name.into(), value.into()));
        self
    }

    pub fn with_set<S: Into<String>>(mut self, name: &str, members: impl IntoIterator<Item = S>) -> Self {
        self.sets
            .push((name.to_string(), members.into_iter().map(Into::into).collect()));
        self
    }

    pub fn with_map_function(
        mut self,
        name: &str,
        function: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.functions.register(name, function);
        self
    }

    pub fn with_map_table<K, V>(mut self, name: &str, table: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        self.functions.register_table(name, table);
        self
    }

    pub fn with_substitutions<K, V>(
        mut self,
        kind: SubstitutionKind,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        self.substitutions.extend(kind, entries);
        self
    }

    pub fn with_date_formatter(mut self, formatter: impl DateFormatter + 'static) -> Self {
        self.date_formatter = Some(Box::new(formatter));
        self
    }

    pub fn with_classifier(mut self, classifier: impl Classifier + 'static) -> Self {
        self.classifier = Some(Box::new(classifier));
        self
    }

    pub(crate) fn build_core(self) -> BrainCore {
        let config = self.config;
        let normalizer = Normalizer::new(config.punctuation, config.case_sensitive);

        let mut matcher = Matcher::new();
        for def in &self.categories {
            match def.compile(&normalizer, Origin::Loaded) {
                Ok(category) => {
                    if let Some(previous) = matcher.insert(category) {
                        log::debug!("Category {} redefined", previous.key);
                    }
                }
                Err(err) => log::warn!("Skipping category: {}", err),
            }
        }

        let mut sets = WordSets::new();
        for (name, members) in &self.sets {
            sets.extend(name, members, |word| normalizer.key(word));
        }

        let mut predicates = PredicateStore::new(config.default_predicate.clone());
        for (name, value) in self.predicates {
            predicates.set(&name, value);
        }

        let rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        log::debug!(
            "Built brain with {} categories, {} sets",
            matcher.len(),
            sets.len()
        );

        BrainCore {
            normalizer,
            matcher,
            predicates,
            history: History::new(),
            profile: BotProfile::new(self.profile),
            sets,
            functions: self.functions,
            substitutions: self.substitutions,
            date_formatter: self
                .date_formatter
                .unwrap_or_else(|| Box::new(ChronoDateFormatter::new())),
            classifier: self.classifier,
            rng,
            shadowed: HashMap::new(),
            config,
        }
    }

    pub fn build(self) -> Brain {
        Brain::from_core(self.build_core())
    }
}
