//! Pattern tokens and input normalization.
//!
//! Both sides of a match go through the same [`Normalizer`]: pattern text
//! becomes [`PatternToken`]s, input text becomes [`InputWord`]s. Case folding
//! and punctuation handling are fixed for the lifetime of a brain.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Inline `<set>`, `<bot>` and `<get>` references inside pattern text.
///
/// Accepts both `<set>colors</set>` and `<set name="colors"/>`.
static PATTERN_MARKUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"<(set|bot|get)(?:\s+name\s*=\s*"([^"]*)"\s*/>|\s*>([^<]*)</(?:set|bot|get)\s*>)"#,
    )
    .unwrap()
});

/// Sentence boundaries in raw input.
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+\s+").unwrap());

/// How punctuation inside words is treated.
///
/// `Strip` removes ASCII punctuation from pattern words and input words alike,
/// so `"say?"` and `"say"` are the same word. `Literal` keeps punctuation as
/// ordinary characters on both sides; `"say?"` then only matches `"say?"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunctuationPolicy {
    /// Punctuation is insignificant.
    #[default]
    Strip,
    /// Punctuation is part of the word.
    Literal,
}

/// One element of a pattern, that or topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternToken {
    /// Exact (normalized) word.
    Word(String),
    /// `$word`: an exact word that outranks every wildcard.
    Priority(String),
    /// One word that belongs to the named set; captured.
    Set(String),
    /// One word equal to the named bot property; not captured.
    Bot(String),
    /// One word equal to the named predicate's current value; not captured.
    Predicate(String),
    /// `*`: one or more words.
    Star,
    /// `_`: one or more words, tried before exact words.
    Underscore,
    /// `#`: zero or more words, tried before exact words.
    Hash,
    /// `^`: zero or more words, tried after sets.
    Caret,
}

impl PatternToken {
    /// Whether this token binds a capture when matched.
    pub fn is_capturing(&self) -> bool {
        matches!(
            self,
            Self::Set(_) | Self::Star | Self::Underscore | Self::Hash | Self::Caret
        )
    }
}

impl fmt::Display for PatternToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word(word) => write!(f, "{}", word),
            Self::Priority(word) => write!(f, "${}", word),
            Self::Set(name) => write!(f, "<set>{}</set>", name),
            Self::Bot(name) => write!(f, "<bot name=\"{}\"/>", name),
            Self::Predicate(name) => write!(f, "<get name=\"{}\"/>", name),
            Self::Star => write!(f, "*"),
            Self::Underscore => write!(f, "_"),
            Self::Hash => write!(f, "#"),
            Self::Caret => write!(f, "^"),
        }
    }
}

/// Render a token sequence back to pattern text.
pub fn tokens_to_text(tokens: &[PatternToken]) -> String {
    tokens
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// One input word: `key` is compared against patterns, `text` is what a
/// wildcard captures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputWord {
    pub key: String,
    pub text: String,
}

impl InputWord {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }
}

/// Word normalization shared by patterns and input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Normalizer {
    punctuation: PunctuationPolicy,
    case_sensitive: bool,
}

impl Normalizer {
    pub fn new(punctuation: PunctuationPolicy, case_sensitive: bool) -> Self {
        Self {
            punctuation,
            case_sensitive,
        }
    }

    pub fn punctuation(&self) -> PunctuationPolicy {
        self.punctuation
    }

    /// Display form of a word: punctuation handled, case kept.
    fn clean(&self, word: &str) -> String {
        match self.punctuation {
            PunctuationPolicy::Strip => word.chars().filter(|c| !c.is_ascii_punctuation()).collect(),
            PunctuationPolicy::Literal => word.to_string(),
        }
    }

    fn fold(&self, word: String) -> String {
        if self.case_sensitive {
            word
        } else {
            word.to_lowercase()
        }
    }

    /// Matching key for a single word. Empty when nothing significant is left.
    pub fn key(&self, word: &str) -> String {
        self.fold(self.clean(word))
    }

    /// Split raw text into input words, dropping words that normalize away.
    pub fn tokenize(&self, text: &str) -> Vec<InputWord> {
        text.split_whitespace()
            .filter_map(|raw| {
                let text = self.clean(raw);
                if text.is_empty() {
                    return None;
                }
                let key = self.fold(text.clone());
                Some(InputWord { key, text })
            })
            .collect()
    }

    /// Split raw input into sentences on `.`, `!` or `?` followed by whitespace.
    pub fn sentences<'t>(&self, text: &'t str) -> Vec<&'t str> {
        SENTENCE_END
            .split(text.trim())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Parse pattern text into tokens.
    ///
    /// Whitespace separates words; `*`, `_`, `#`, `^` are wildcards and a
    /// leading `$` marks a priority word. Inline `<set>`, `<bot>` and `<get>`
    /// references become their own tokens.
    pub fn parse_pattern(&self, text: &str) -> Vec<PatternToken> {
        let mut tokens = Vec::new();
        let mut last = 0;
        for caps in PATTERN_MARKUP.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            self.parse_words(&text[last..whole.start()], &mut tokens);
            last = whole.end();

            let name = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().trim().to_lowercase())
                .unwrap_or_default();
            if name.is_empty() {
                log::warn!("Ignoring unnamed <{}> in pattern {:?}", &caps[1], text);
                continue;
            }
            tokens.push(match &caps[1] {
                "set" => PatternToken::Set(name),
                "bot" => PatternToken::Bot(name),
                _ => PatternToken::Predicate(name),
            });
        }
        self.parse_words(&text[last..], &mut tokens);
        tokens
    }

    fn parse_words(&self, text: &str, tokens: &mut Vec<PatternToken>) {
        for word in text.split_whitespace() {
            let token = match word {
                "*" => PatternToken::Star,
                "_" => PatternToken::Underscore,
                "#" => PatternToken::Hash,
                "^" => PatternToken::Caret,
                _ => match word.strip_prefix('$') {
                    Some(rest) if !rest.is_empty() => {
                        let key = self.key(rest);
                        if key.is_empty() {
                            continue;
                        }
                        PatternToken::Priority(key)
                    }
                    _ => {
                        let key = self.key(word);
                        if key.is_empty() {
                            continue;
                        }
                        PatternToken::Word(key)
                    }
                },
            };
            tokens.push(token);
        }
    }
}
