//! The template tree.
//!
//! One variant per tag. Trees are built by a loader (JSON via serde, or the
//! constructor helpers below) and never mutated while a brain evaluates them.

use serde::{Deserialize, Serialize};

use crate::pattern::StarKind;
use crate::utilities::substitutions::SubstitutionKind;

fn first() -> usize {
    1
}

/// A response template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateNode {
    /// Literal text.
    Text(String),
    /// Children evaluated left to right and concatenated.
    Sequence(Vec<TemplateNode>),
    /// The `index`-th capture of a segment (`star`, `thatstar`, `topicstar`).
    Star {
        kind: StarKind,
        #[serde(default = "first")]
        index: usize,
    },
    /// `srai` of the first pattern capture.
    Sr,
    /// Re-run matching on the evaluated content.
    Srai(Box<TemplateNode>),
    /// Evaluate for side effects only.
    Think(Box<TemplateNode>),
    /// Store a predicate and return its new value.
    Set { name: String, value: Box<TemplateNode> },
    /// Read a predicate.
    Get { name: String },
    /// Read a bot property.
    Bot { name: String },
    /// Call a registered map function on the evaluated content.
    Map { name: String, content: Box<TemplateNode> },
    Condition(Condition),
    /// Re-run the enclosing condition.
    Loop,
    /// Evaluate one item picked uniformly at random.
    Random(Vec<TemplateNode>),
    /// Sentence `sentence` (counting back) of the bot response `index`
    /// turns ago.
    That {
        #[serde(default = "first")]
        index: usize,
        #[serde(default = "first")]
        sentence: usize,
    },
    /// Input sentence `index` sentences ago; 1 is the one being answered.
    Input {
        #[serde(default = "first")]
        index: usize,
    },
    /// User input `index` turns ago.
    Request {
        #[serde(default = "first")]
        index: usize,
    },
    /// Full bot response `index` turns ago.
    Response {
        #[serde(default = "first")]
        index: usize,
    },
    Date {
        #[serde(default)]
        locale: Option<String>,
        #[serde(default)]
        timezone: Option<String>,
        format: Box<TemplateNode>,
    },
    Learn(Box<LearnDef>),
    Unlearn,
    /// Evaluated immediately inside `learn`, otherwise transparent.
    Eval(Box<TemplateNode>),
    /// Word substitution through one of the substitution tables.
    Substitute {
        kind: SubstitutionKind,
        content: Box<TemplateNode>,
    },
    /// Character-level string transformation.
    Transform {
        op: StringOp,
        content: Box<TemplateNode>,
    },
}

impl TemplateNode {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn seq(nodes: impl IntoIterator<Item = TemplateNode>) -> Self {
        Self::Sequence(nodes.into_iter().collect())
    }

    /// `<star/>`
    pub fn star() -> Self {
        Self::star_at(StarKind::Pattern, 1)
    }

    pub fn star_at(kind: StarKind, index: usize) -> Self {
        Self::Star { kind, index }
    }

    pub fn srai(content: TemplateNode) -> Self {
        Self::Srai(Box::new(content))
    }

    pub fn think(content: TemplateNode) -> Self {
        Self::Think(Box::new(content))
    }

    pub fn set(name: impl Into<String>, value: TemplateNode) -> Self {
        Self::Set {
            name: name.into(),
            value: Box::new(value),
        }
    }

    pub fn get(name: impl Into<String>) -> Self {
        Self::Get { name: name.into() }
    }

    pub fn bot(name: impl Into<String>) -> Self {
        Self::Bot { name: name.into() }
    }

    pub fn map(name: impl Into<String>, content: TemplateNode) -> Self {
        Self::Map {
            name: name.into(),
            content: Box::new(content),
        }
    }

    pub fn random(items: impl IntoIterator<Item = TemplateNode>) -> Self {
        Self::Random(items.into_iter().collect())
    }

    pub fn date(format: impl Into<String>) -> Self {
        Self::Date {
            locale: None,
            timezone: None,
            format: Box::new(Self::text(format)),
        }
    }

    pub fn learn(def: LearnDef) -> Self {
        Self::Learn(Box::new(def))
    }

    pub fn eval(content: TemplateNode) -> Self {
        Self::Eval(Box::new(content))
    }

    pub fn substitute(kind: SubstitutionKind, content: TemplateNode) -> Self {
        Self::Substitute {
            kind,
            content: Box::new(content),
        }
    }

    /// First/second person swap.
    pub fn person(content: TemplateNode) -> Self {
        Self::substitute(SubstitutionKind::Person, content)
    }

    pub fn transform(op: StringOp, content: TemplateNode) -> Self {
        Self::Transform {
            op,
            content: Box::new(content),
        }
    }
}

impl From<&str> for TemplateNode {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

// ============================================================================
// Condition
// ============================================================================

/// One branch of a condition.
///
/// A guard without `value` is a default and always applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guard {
    #[serde(default)]
    pub predicate: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    pub body: TemplateNode,
}

impl Guard {
    pub fn new(predicate: Option<&str>, value: Option<&str>, body: TemplateNode) -> Self {
        Self {
            predicate: predicate.map(str::to_string),
            value: value.map(str::to_string),
            body,
        }
    }

    /// `<li value="v">body</li>`
    pub fn when(value: &str, body: TemplateNode) -> Self {
        Self::new(None, Some(value), body)
    }

    /// `<li>body</li>`
    pub fn otherwise(body: TemplateNode) -> Self {
        Self::new(None, None, body)
    }

    pub fn is_default(&self) -> bool {
        self.value.is_none()
    }
}

/// Ordered guards; the first applicable one runs.
///
/// All three surface forms reduce to this shape:
///
/// ```
/// use aiml_brain::{Condition, Guard, TemplateNode};
///
/// // <condition name="mood" value="happy">Great!</condition>
/// let block = Condition::block("mood", "happy", TemplateNode::text("Great!"));
///
/// // <condition name="mood"><li value="happy">Great!</li><li>Oh.</li></condition>
/// let single = Condition::single(
///     "mood",
///     vec![Guard::when("happy", "Great!".into()), Guard::otherwise("Oh.".into())],
/// );
///
/// // <condition><li name="mood" value="happy">Great!</li><li>Oh.</li></condition>
/// let multi = Condition::multi(vec![
///     Guard::new(Some("mood"), Some("happy"), "Great!".into()),
///     Guard::otherwise("Oh.".into()),
/// ]);
/// assert_eq!(single.guards[0], multi.guards[0]);
/// assert_eq!(block.guards.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub guards: Vec<Guard>,
}

impl Condition {
    /// Guards that omit a predicate name inherit `name`.
    pub fn new(name: Option<&str>, guards: Vec<Guard>) -> Self {
        let guards = guards
            .into_iter()
            .map(|mut guard| {
                if guard.predicate.is_none() {
                    guard.predicate = name.map(str::to_string);
                }
                guard
            })
            .collect();
        Self { guards }
    }

    pub fn block(name: &str, value: &str, body: TemplateNode) -> Self {
        Self::new(Some(name), vec![Guard::when(value, body)])
    }

    pub fn single(name: &str, guards: Vec<Guard>) -> Self {
        Self::new(Some(name), guards)
    }

    pub fn multi(guards: Vec<Guard>) -> Self {
        Self::new(None, guards)
    }
}

// ============================================================================
// Learn
// ============================================================================

/// A piece of an embedded pattern, that or topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternPart {
    Text(String),
    /// Replaced by its evaluated text when the category is learned.
    Eval(TemplateNode),
}

impl From<&str> for PatternPart {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// The category body of a `learn` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnDef {
    pub pattern: Vec<PatternPart>,
    #[serde(default)]
    pub that: Option<Vec<PatternPart>>,
    #[serde(default)]
    pub topic: Option<Vec<PatternPart>>,
    pub template: TemplateNode,
}

impl LearnDef {
    pub fn new(pattern: Vec<PatternPart>, template: TemplateNode) -> Self {
        Self {
            pattern,
            that: None,
            topic: None,
            template,
        }
    }

    pub fn with_that(mut self, that: Vec<PatternPart>) -> Self {
        self.that = Some(that);
        self
    }

    pub fn with_topic(mut self, topic: Vec<PatternPart>) -> Self {
        self.topic = Some(topic);
        self
    }
}

// ============================================================================
// String transforms
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringOp {
    Uppercase,
    Lowercase,
    /// Capitalize every word.
    Formal,
    /// Capitalize the first letter, lower-case the rest.
    Sentence,
    /// Space out every character.
    Explode,
}

impl StringOp {
    pub fn apply(self, text: &str) -> String {
        match self {
            Self::Uppercase => text.to_uppercase(),
            Self::Lowercase => text.to_lowercase(),
            Self::Formal => text
                .split_whitespace()
                .map(capitalize)
                .collect::<Vec<_>>()
                .join(" "),
            Self::Sentence => capitalize(text.trim_start()),
            Self::Explode => text
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(String::from)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_inherits_name() {
        let cond = Condition::single(
            "mood",
            vec![
                Guard::when("happy", "yay".into()),
                Guard::new(Some("weather"), Some("rain"), "meh".into()),
                Guard::otherwise("hm".into()),
            ],
        );
        assert_eq!(cond.guards[0].predicate.as_deref(), Some("mood"));
        assert_eq!(cond.guards[1].predicate.as_deref(), Some("weather"));
        assert!(cond.guards[2].is_default());
    }

    #[test]
    fn test_string_ops() {
        assert_eq!(StringOp::Uppercase.apply("abc"), "ABC");
        assert_eq!(StringOp::Formal.apply("hello big  world"), "Hello Big World");
        assert_eq!(StringOp::Sentence.apply("hELLO There"), "Hello there");
        assert_eq!(StringOp::Explode.apply("ab c"), "a b c");
        assert_eq!(StringOp::Sentence.apply(""), "");
    }

    #[test]
    fn test_deserialize_template() {
        let json = r#"{"sequence": [
            {"text": "You said "},
            {"star": {"kind": "pattern"}},
            {"think": {"set": {"name": "said", "value": {"star": {"kind": "pattern", "index": 1}}}}},
            {"condition": {"guards": [
                {"predicate": "mood", "value": "happy", "body": {"text": "!"}},
                {"body": "loop"}
            ]}}
        ]}"#;
        let node: TemplateNode = serde_json::from_str(json).unwrap();
        let TemplateNode::Sequence(children) = node else {
            panic!("expected a sequence");
        };
        assert_eq!(children[1], TemplateNode::star());
        let TemplateNode::Condition(cond) = &children[3] else {
            panic!("expected a condition");
        };
        assert_eq!(cond.guards[1].body, TemplateNode::Loop);
        assert!(cond.guards[1].is_default());
    }

    #[test]
    fn test_deserialize_learn() {
        let json = r#"{"learn": {
            "pattern": [{"text": "is "}, {"eval": {"star": {"kind": "pattern"}}}, {"text": " in *"}],
            "template": {"text": "yes"}
        }}"#;
        let node: TemplateNode = serde_json::from_str(json).unwrap();
        let TemplateNode::Learn(def) = node else {
            panic!("expected learn");
        };
        assert_eq!(def.pattern.len(), 3);
        assert_eq!(def.pattern[1], PatternPart::Eval(TemplateNode::star()));
        assert!(def.that.is_none());
    }
}
