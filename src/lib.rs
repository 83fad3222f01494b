//! # aiml-brain
//!
//! A pattern-matching dialogue interpreter in the AIML tradition.
//!
//! A [`Brain`] holds a knowledge base of categories. Each category pairs a
//! word pattern (plus optional `that` and `topic` context) with a template.
//! Input is normalized, matched against a word trie with wildcard precedence,
//! and the winning template is evaluated against conversation state:
//! predicates, bot properties, history, sets and maps. Templates may redirect
//! to other categories, branch, loop, and learn or unlearn categories at
//! runtime.
//!
//! ```
//! use aiml_brain::{Brain, BrainConfig, CategoryDef, TemplateNode};
//!
//! let brain = Brain::builder()
//!     .with_config(BrainConfig::new().with_random_seed(7))
//!     .with_category(CategoryDef::new("hello *", TemplateNode::seq([
//!         "Hi ".into(),
//!         TemplateNode::star(),
//!     ])))
//!     .build();
//! assert_eq!(brain.process("Hello there").unwrap(), "Hi there");
//! ```

pub mod brain;
pub mod classifier;
pub mod config;
pub mod error;
pub mod learn;
pub mod memory;
pub mod pattern;
pub mod template;
pub mod utilities;

pub use brain::{Brain, BrainBuilder};
pub use classifier::{BagOfWords, Classifier, Intent};
pub use config::BrainConfig;
pub use error::{BrainError, ConfigError, TagError};
pub use learn::UnlearnPolicy;
pub use memory::{SubscriptionId, TurnRecord};
pub use pattern::{
    CaptureSet, Category, CategoryDef, CategoryKey, Origin, PatternToken, PunctuationPolicy,
    StarKind,
};
pub use template::{Condition, Guard, LearnDef, PatternPart, StringOp, TemplateNode};
pub use utilities::{ChronoDateFormatter, DateFormatter, SubstitutionKind};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
