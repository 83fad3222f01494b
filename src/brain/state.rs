//! State owned by one brain and the turn loop over it.

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;

use crate::classifier::Classifier;
use crate::config::BrainConfig;
use crate::error::BrainError;
use crate::memory::{History, PredicateStore, TurnRecord};
use crate::pattern::{Category, CategoryKey, InputWord, Match, MatchEnv, Matcher, Normalizer};
use crate::template::evaluator::Reply;
use crate::template::EvalContext;
use crate::utilities::{BotProfile, DateFormatter, MapRegistry, Substitutions, WordSets};

/// Everything a turn reads or writes. Guarded as a whole by the brain's lock.
pub struct BrainCore {
    pub(crate) config: BrainConfig,
    pub(crate) normalizer: Normalizer,
    pub(crate) matcher: Matcher,
    pub(crate) predicates: PredicateStore,
    pub(crate) history: History,
    pub(crate) profile: BotProfile,
    pub(crate) sets: WordSets,
    pub(crate) functions: MapRegistry,
    pub(crate) substitutions: Substitutions,
    pub(crate) date_formatter: Box<dyn DateFormatter>,
    pub(crate) classifier: Option<Box<dyn Classifier>>,
    pub(crate) rng: StdRng,
    /// Loaded categories hidden by a learned redefinition, restored by
    /// `unlearn`.
    pub(crate) shadowed: HashMap<CategoryKey, Arc<Category>>,
}

/// Lookup-time view of the sets, profile and predicates.
struct MatchScope<'a> {
    core: &'a BrainCore,
}

impl MatchEnv for MatchScope<'_> {
    fn in_set(&self, set: &str, word: &str) -> bool {
        self.core.sets.contains(set, word)
    }

    fn matches_bot(&self, name: &str, word: &str) -> bool {
        self.core
            .profile
            .get(name)
            .map_or(false, |value| self.core.normalizer.key(value.trim()) == word)
    }

    fn matches_predicate(&self, name: &str, word: &str) -> bool {
        if !self.core.predicates.is_set(name) {
            return false;
        }
        let value = self.core.predicates.get(name).trim();
        !value.is_empty() && self.core.normalizer.key(value) == word
    }
}

/// Collapse runs of whitespace to single spaces and trim.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl BrainCore {
    /// Words standing in for `text` as match context; the placeholder when
    /// `text` has none.
    fn context_words(&self, text: &str) -> Vec<InputWord> {
        let words = self.normalizer.tokenize(text);
        if words.is_empty() {
            self.normalizer.tokenize(&self.config.default_context)
        } else {
            words
        }
    }

    /// Match input words against the current that and topic.
    pub(crate) fn lookup(&self, words: &[InputWord]) -> Option<Match> {
        let that = self.context_words(self.history.that(1, 1));
        let topic = self.context_words(self.predicates.get("topic"));
        let scope = MatchScope { core: self };
        self.matcher.lookup(words, &that, &topic, &scope)
    }

    fn sentences(&self, input: &str) -> Vec<String> {
        if self.config.split_sentences {
            self.normalizer
                .sentences(input)
                .into_iter()
                .map(str::to_string)
                .collect()
        } else {
            vec![input.trim().to_string()]
        }
    }

    /// Answer one top-level input and record the turn.
    ///
    /// An aborted turn leaves History untouched.
    pub(crate) fn run_turn(&mut self, input: &str) -> Result<TurnRecord, BrainError> {
        let sentences = self.sentences(input);
        let answered = self.answer(&sentences);
        let (outputs, matched) = match answered {
            Ok(answered) => answered,
            Err(err) => {
                self.history.discard_pending();
                return Err(err);
            }
        };

        let response = outputs.join(" ");
        let record = TurnRecord {
            input: input.to_string(),
            input_sentences: sentences,
            matched,
            sentences: self
                .normalizer
                .sentences(&response)
                .into_iter()
                .map(str::to_string)
                .collect(),
            response,
        };
        self.history.append(record.clone());
        Ok(record)
    }

    /// Respond to each sentence in turn; non-empty outputs in order plus the
    /// key of the last category that answered.
    fn answer(
        &mut self,
        sentences: &[String],
    ) -> Result<(Vec<String>, Option<CategoryKey>), BrainError> {
        let mut outputs = Vec::with_capacity(sentences.len());
        let mut matched = None;
        let mut ctx = EvalContext::new(self);
        for sentence in sentences {
            ctx.core.history.record_input(sentence.as_str());
            let reply = match ctx.respond(sentence)? {
                Some(reply) => Some(reply),
                None => fallback(&mut ctx, sentence)?,
            };
            if let Some(Reply { text, key }) = reply {
                let text = collapse_whitespace(&text);
                if !text.is_empty() {
                    outputs.push(text);
                }
                matched = Some(key);
            }
        }
        Ok((outputs, matched))
    }
}

/// Ask the classifier for replacement text and match it once. A second miss
/// is final.
fn fallback(ctx: &mut EvalContext<'_>, sentence: &str) -> Result<Option<Reply>, BrainError> {
    let Some(replacement) = ctx
        .core
        .classifier
        .as_ref()
        .and_then(|classifier| classifier.classify(sentence))
    else {
        return Ok(None);
    };
    log::debug!("Classifier mapped {:?} to {:?}", sentence, replacement);
    ctx.respond(&replacement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::BrainBuilder;
    use crate::pattern::CategoryDef;
    use crate::template::TemplateNode;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n b\t c "), "a b c");
    }

    #[test]
    fn test_turn_joins_sentences_and_records_last_as_that() {
        let mut core = BrainBuilder::new()
            .with_category(CategoryDef::new("hello", "Hi.  How are you?".into()))
            .with_category(CategoryDef::new("fine", "Good!".into()))
            .build_core();
        let record = core.run_turn("Hello. Fine!").unwrap();
        assert_eq!(record.response, "Hi. How are you? Good!");
        assert_eq!(record.that(1), "Good!");
        assert_eq!(record.that(2), "How are you");
        assert_eq!(record.input_sentences, vec!["Hello".to_string(), "Fine!".to_string()]);
        assert_eq!(record.matched.unwrap().pattern_text(), "fine");
        assert_eq!(core.history.len(), 1);
    }

    #[test]
    fn test_that_context_uses_last_sentence() {
        let mut core = BrainBuilder::new()
            .with_category(CategoryDef::new("hi", "Hello. Do you like tea?".into()))
            .with_category(CategoryDef::new("yes", "Great, tea it is.".into()).with_that("do you like *"))
            .with_category(CategoryDef::new("yes", "Yes what?".into()))
            .build_core();
        assert_eq!(core.run_turn("yes").unwrap().response, "Yes what?");
        core.run_turn("hi").unwrap();
        assert_eq!(core.run_turn("yes").unwrap().response, "Great, tea it is.");
    }

    #[test]
    fn test_topic_predicate_scopes_matching() {
        let mut core = BrainBuilder::new()
            .with_category(CategoryDef::new(
                "lets talk about *",
                TemplateNode::seq([
                    TemplateNode::think(TemplateNode::set("topic", TemplateNode::star())),
                    TemplateNode::text("OK"),
                ]),
            ))
            .with_category(CategoryDef::new("what", "sports talk".into()).with_topic("sports"))
            .with_category(CategoryDef::new("what", "small talk".into()))
            .build_core();
        assert_eq!(core.run_turn("what").unwrap().response, "small talk");
        core.run_turn("lets talk about Sports").unwrap();
        assert_eq!(core.run_turn("what").unwrap().response, "sports talk");
    }

    #[test]
    fn test_unmatched_turn_is_recorded_empty() {
        let mut core = BrainBuilder::new().build_core();
        let record = core.run_turn("anything").unwrap();
        assert_eq!(record.response, "");
        assert!(record.matched.is_none());
        assert_eq!(core.history.len(), 1);
    }

    #[test]
    fn test_aborted_turn_is_not_recorded() {
        let mut core = BrainBuilder::new()
            .with_category(CategoryDef::new("loop", TemplateNode::srai("loop".into())))
            .build_core();
        assert!(core.run_turn("loop").is_err());
        assert!(core.history.is_empty());
    }

    #[test]
    fn test_unset_predicate_never_matches_pattern_word() {
        let mut config = crate::config::BrainConfig::new();
        config.default_predicate = "nobody".to_string();
        let mut core = BrainBuilder::new()
            .with_config(config)
            .with_category(CategoryDef::new(r#"i am <get name="name"/>"#, "I know.".into()))
            .build_core();
        assert_eq!(core.run_turn("I am nobody").unwrap().response, "");
        core.predicates.set("name", "nobody".to_string());
        assert_eq!(core.run_turn("I am nobody").unwrap().response, "I know.");
    }

    #[test]
    fn test_aborted_turn_forgets_its_input_sentences() {
        let mut core = BrainBuilder::new()
            .with_category(CategoryDef::new("loop", TemplateNode::srai("loop".into())))
            .with_category(CategoryDef::new("echo", TemplateNode::Input { index: 2 }))
            .build_core();
        core.run_turn("first").unwrap();
        assert!(core.run_turn("loop").is_err());
        assert_eq!(core.run_turn("echo").unwrap().response, "first");
    }
}
