//! Categories: a match key plus the template it answers with.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::token::{tokens_to_text, Normalizer, PatternToken};
use crate::error::TagError;
use crate::template::TemplateNode;

/// Where a category came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Supplied when the brain was built, or added by the host afterwards.
    Loaded,
    /// Created by a `learn` tag during a conversation.
    Learned,
}

/// The (pattern, that, topic) triple a category is stored under.
///
/// Two categories with equal keys cannot coexist; the later one replaces the
/// earlier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryKey {
    pub pattern: Vec<PatternToken>,
    pub that: Vec<PatternToken>,
    pub topic: Vec<PatternToken>,
}

impl CategoryKey {
    /// Build a key; an absent or empty that/topic means "any" (`*`).
    pub fn new(
        pattern: Vec<PatternToken>,
        that: Option<Vec<PatternToken>>,
        topic: Option<Vec<PatternToken>>,
    ) -> Self {
        fn or_any(tokens: Option<Vec<PatternToken>>) -> Vec<PatternToken> {
            match tokens {
                Some(tokens) if !tokens.is_empty() => tokens,
                _ => vec![PatternToken::Star],
            }
        }
        Self {
            pattern,
            that: or_any(that),
            topic: or_any(topic),
        }
    }

    pub fn pattern_text(&self) -> String {
        tokens_to_text(&self.pattern)
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} <that> {} <topic> {}",
            tokens_to_text(&self.pattern),
            tokens_to_text(&self.that),
            tokens_to_text(&self.topic)
        )
    }
}

/// A compiled category, as stored in the matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub key: CategoryKey,
    pub template: TemplateNode,
    pub origin: Origin,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key.pattern_text())
    }
}

/// A category as handed over by a loader: pattern text, not yet normalized.
///
/// # Example
///
/// ```
/// use aiml_brain::{CategoryDef, TemplateNode};
///
/// let def = CategoryDef::new("HELLO *", TemplateNode::text("Hi!"))
///     .with_topic("greetings");
/// assert_eq!(def.topic.as_deref(), Some("greetings"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDef {
    pub pattern: String,
    #[serde(default)]
    pub that: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    pub template: TemplateNode,
}

impl CategoryDef {
    pub fn new(pattern: impl Into<String>, template: TemplateNode) -> Self {
        Self {
            pattern: pattern.into(),
            that: None,
            topic: None,
            template,
        }
    }

    pub fn with_that(mut self, that: impl Into<String>) -> Self {
        self.that = Some(that.into());
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Normalize the pattern text into a category.
    ///
    /// Fails when the pattern has no tokens left.
    pub fn compile(&self, normalizer: &Normalizer, origin: Origin) -> Result<Category, TagError> {
        let pattern = normalizer.parse_pattern(&self.pattern);
        if pattern.is_empty() {
            return Err(TagError::EmptyPattern {
                pattern: self.pattern.clone(),
            });
        }
        let that = self.that.as_deref().map(|t| normalizer.parse_pattern(t));
        let topic = self.topic.as_deref().map(|t| normalizer.parse_pattern(t));
        Ok(Category {
            key: CategoryKey::new(pattern, that, topic),
            template: self.template.clone(),
            origin,
        })
    }
}
