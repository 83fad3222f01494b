//! Recursive template evaluation.
//!
//! An [`EvalContext`] lives for exactly one top-level turn. It carries the
//! captures of the category being evaluated plus the two termination counters,
//! and holds the brain's state mutably so side effects land in program order.

use rand::Rng;

use super::node::{Condition, Guard, TemplateNode};
use crate::brain::BrainCore;
use crate::error::BrainError;
use crate::learn;
use crate::memory::PredicateStore;
use crate::pattern::{CaptureSet, CategoryKey, StarKind};

/// Text produced by one matched category.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Reply {
    pub text: String,
    pub key: CategoryKey,
}

/// Per-turn evaluation state.
pub struct EvalContext<'a> {
    pub(crate) core: &'a mut BrainCore,
    captures: CaptureSet,
    srai_depth: usize,
    loop_iterations: usize,
    pending_loop: bool,
}

impl<'a> EvalContext<'a> {
    pub(crate) fn new(core: &'a mut BrainCore) -> Self {
        Self {
            core,
            captures: CaptureSet::default(),
            srai_depth: 0,
            loop_iterations: 0,
            pending_loop: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_captures(mut self, captures: CaptureSet) -> Self {
        self.captures = captures;
        self
    }

    /// Captures of the category currently being evaluated.
    pub fn captures(&self) -> &CaptureSet {
        &self.captures
    }

    /// Current `srai` nesting.
    pub fn srai_depth(&self) -> usize {
        self.srai_depth
    }

    /// Match one sentence and evaluate the winning template.
    ///
    /// `Ok(None)` means nothing matched.
    pub(crate) fn respond(&mut self, sentence: &str) -> Result<Option<Reply>, BrainError> {
        let words = self.core.normalizer.tokenize(sentence);
        let Some(found) = self.core.lookup(&words) else {
            log::debug!("No match for {:?}", sentence);
            return Ok(None);
        };
        log::debug!("Matched {:?} -> {}", sentence, found.category.key);

        let outer_captures = std::mem::replace(&mut self.captures, found.captures);
        let outer_loop = std::mem::replace(&mut self.pending_loop, false);
        let result = self.evaluate(&found.category.template);
        self.captures = outer_captures;
        self.pending_loop = outer_loop;

        Ok(Some(Reply {
            text: result?,
            key: found.category.key.clone(),
        }))
    }

    /// Evaluate a template node to text.
    pub fn evaluate(&mut self, node: &TemplateNode) -> Result<String, BrainError> {
        let text = match node {
            TemplateNode::Text(text) => text.clone(),
            TemplateNode::Sequence(nodes) => {
                let mut out = String::new();
                for child in nodes {
                    out.push_str(&self.evaluate(child)?);
                }
                out
            }
            TemplateNode::Star { kind, index } => self.captures.get(*kind, *index).to_string(),
            TemplateNode::Sr => {
                let star = self.captures.get(StarKind::Pattern, 1).to_string();
                self.srai(&star)?
            }
            TemplateNode::Srai(content) => {
                let query = self.evaluate(content)?;
                self.srai(&query)?
            }
            TemplateNode::Think(content) => {
                self.evaluate(content)?;
                String::new()
            }
            TemplateNode::Set { name, value } => {
                let value = self.evaluate(value)?;
                self.core.predicates.set(name, value.clone());
                value
            }
            TemplateNode::Get { name } => self.core.predicates.get(name).to_string(),
            TemplateNode::Bot { name } => self.core.profile.get(name).unwrap_or_default().to_string(),
            TemplateNode::Map { name, content } => {
                let arg = self.evaluate(content)?;
                match self.core.functions.call(name, &arg) {
                    Ok(mapped) => mapped,
                    Err(err) => {
                        log::warn!("{}", err);
                        String::new()
                    }
                }
            }
            TemplateNode::Condition(condition) => self.condition(condition)?,
            TemplateNode::Loop => {
                self.pending_loop = true;
                String::new()
            }
            TemplateNode::Random(items) => {
                if items.is_empty() {
                    String::new()
                } else {
                    let pick = self.core.rng.gen_range(0..items.len());
                    self.evaluate(&items[pick])?
                }
            }
            TemplateNode::That { index, sentence } => {
                self.core.history.that(*index, *sentence).to_string()
            }
            TemplateNode::Input { index } => self.core.history.input(*index).to_string(),
            TemplateNode::Request { index } => self.core.history.request(*index).to_string(),
            TemplateNode::Response { index } => self.core.history.response(*index).to_string(),
            TemplateNode::Date {
                locale,
                timezone,
                format,
            } => {
                let format = self.evaluate(format)?;
                self.core
                    .date_formatter
                    .format(locale.as_deref(), timezone.as_deref(), &format)
            }
            TemplateNode::Learn(def) => {
                learn::learn(self, def)?;
                String::new()
            }
            TemplateNode::Unlearn => {
                learn::unlearn(self);
                String::new()
            }
            TemplateNode::Eval(content) => self.evaluate(content)?,
            TemplateNode::Substitute { kind, content } => {
                let text = self.evaluate(content)?;
                self.core.substitutions.apply(*kind, &text)
            }
            TemplateNode::Transform { op, content } => {
                let text = self.evaluate(content)?;
                op.apply(&text)
            }
        };
        Ok(text)
    }

    /// Answer `query` sentence by sentence within the current turn.
    fn srai(&mut self, query: &str) -> Result<String, BrainError> {
        let limit = self.core.config.max_srai_depth;
        if self.srai_depth >= limit {
            log::warn!("srai depth {} reached at {:?}", limit, query);
            return Err(BrainError::RecursionLimitExceeded { limit });
        }
        self.srai_depth += 1;
        log::debug!("srai[{}] {:?}", self.srai_depth, query);
        let replies = self.redirect(query);
        self.srai_depth -= 1;
        Ok(replies?.join(" "))
    }

    fn redirect(&mut self, query: &str) -> Result<Vec<String>, BrainError> {
        let mut replies = Vec::new();
        for sentence in self.core.normalizer.sentences(query) {
            if let Some(reply) = self.respond(sentence)? {
                let text = reply.text.trim();
                if !text.is_empty() {
                    replies.push(text.to_string());
                }
            }
        }
        Ok(replies)
    }

    /// Run the first applicable guard; rerun from the top while its body
    /// asks for `loop`.
    fn condition(&mut self, condition: &Condition) -> Result<String, BrainError> {
        let mut pieces = Vec::new();
        while let Some(guard) = select(condition, &self.core.predicates) {
            let outer = std::mem::replace(&mut self.pending_loop, false);
            let body = self.evaluate(&guard.body);
            let looped = std::mem::replace(&mut self.pending_loop, outer);
            pieces.push(body?);
            if !looped {
                break;
            }
            self.loop_iterations += 1;
            let limit = self.core.config.max_loop_iterations;
            if self.loop_iterations > limit {
                log::warn!("condition looped more than {} times", limit);
                return Err(BrainError::LoopLimitExceeded { limit });
            }
        }
        Ok(pieces.join(" "))
    }
}

fn select<'c>(condition: &'c Condition, predicates: &PredicateStore) -> Option<&'c Guard> {
    condition.guards.iter().find(|guard| match (&guard.predicate, &guard.value) {
        (_, None) => true,
        (Some(name), Some(expected)) => predicates.get(name) == expected,
        (None, Some(_)) => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::BrainBuilder;
    use crate::config::BrainConfig;
    use crate::pattern::CategoryDef;
    use crate::template::node::{Guard, StringOp};

    fn core_with(defs: Vec<CategoryDef>) -> BrainCore {
        BrainBuilder::new()
            .with_config(BrainConfig::new().with_random_seed(7))
            .with_categories(defs)
            .with_bot_property("name", "Ada")
            .build_core()
    }

    fn eval(core: &mut BrainCore, node: &TemplateNode) -> Result<String, BrainError> {
        EvalContext::new(core).evaluate(node)
    }

    #[test]
    fn test_set_returns_value_and_get_reads_it() {
        let mut core = core_with(vec![]);
        let node = TemplateNode::seq([
            TemplateNode::set("color", "blue".into()),
            TemplateNode::text("/"),
            TemplateNode::get("color"),
            TemplateNode::text("/"),
            TemplateNode::get("unset"),
        ]);
        assert_eq!(eval(&mut core, &node).unwrap(), "blue/blue/");
    }

    #[test]
    fn test_think_discards_text() {
        let mut core = core_with(vec![]);
        let node = TemplateNode::think(TemplateNode::set("x", "1".into()));
        assert_eq!(eval(&mut core, &node).unwrap(), "");
        assert_eq!(core.predicates.get("x"), "1");
    }

    #[test]
    fn test_bot_and_unknown_map() {
        let mut core = core_with(vec![]);
        let node = TemplateNode::seq([
            TemplateNode::bot("name"),
            TemplateNode::map("nope", "x".into()),
            TemplateNode::bot("age"),
            TemplateNode::text("!"),
        ]);
        assert_eq!(eval(&mut core, &node).unwrap(), "Ada!");
    }

    #[test]
    fn test_builtin_map_successor() {
        let mut core = core_with(vec![]);
        let node = TemplateNode::map("successor", "41".into());
        assert_eq!(eval(&mut core, &node).unwrap(), "42");
    }

    #[test]
    fn test_condition_first_match_and_default() {
        let mut core = core_with(vec![]);
        let node = TemplateNode::Condition(Condition::single(
            "n",
            vec![Guard::when("one", "A".into()), Guard::otherwise("B".into())],
        ));
        core.predicates.set("n", "one".into());
        assert_eq!(eval(&mut core, &node).unwrap(), "A");
        core.predicates.set("n", "two".into());
        assert_eq!(eval(&mut core, &node).unwrap(), "B");

        let no_default = TemplateNode::Condition(Condition::block("n", "one", "A".into()));
        assert_eq!(eval(&mut core, &no_default).unwrap(), "");
    }

    #[test]
    fn test_condition_loop_counts_down() {
        let mut core = core_with(vec![]);
        core.functions
            .register_table("down", [("3", "2"), ("2", "1"), ("1", "0")]);
        core.predicates.set("count", "3".into());
        let node = TemplateNode::Condition(Condition::single(
            "count",
            vec![
                Guard::when("0", "liftoff".into()),
                Guard::otherwise(TemplateNode::seq([
                    TemplateNode::get("count"),
                    TemplateNode::think(TemplateNode::set(
                        "count",
                        TemplateNode::map("down", TemplateNode::get("count")),
                    )),
                    TemplateNode::Loop,
                ])),
            ],
        ));
        assert_eq!(eval(&mut core, &node).unwrap(), "3 2 1 liftoff");
    }

    #[test]
    fn test_condition_loop_limit() {
        let mut core = BrainBuilder::new()
            .with_config(BrainConfig::new().with_max_loop_iterations(5))
            .build_core();
        let node = TemplateNode::Condition(Condition::multi(vec![Guard::otherwise(
            TemplateNode::seq([TemplateNode::text("again"), TemplateNode::Loop]),
        )]));
        assert_eq!(
            eval(&mut core, &node),
            Err(BrainError::LoopLimitExceeded { limit: 5 })
        );
    }

    #[test]
    fn test_srai_redirects_and_miss_is_empty() {
        let mut core = core_with(vec![
            CategoryDef::new("hello", "Hi there".into()),
            CategoryDef::new("hey *", TemplateNode::seq([TemplateNode::Sr, "!".into()])),
        ]);
        assert_eq!(eval(&mut core, &TemplateNode::srai("HELLO".into())).unwrap(), "Hi there");
        assert_eq!(eval(&mut core, &TemplateNode::srai("hey hello".into())).unwrap(), "Hi there!");
        assert_eq!(eval(&mut core, &TemplateNode::srai("nothing here".into())).unwrap(), "");
    }

    #[test]
    fn test_srai_self_loop_hits_limit() {
        let mut core = BrainBuilder::new()
            .with_config(BrainConfig::new().with_max_srai_depth(8))
            .with_category(CategoryDef::new("again", TemplateNode::srai("again".into())))
            .build_core();
        assert_eq!(
            eval(&mut core, &TemplateNode::srai("again".into())),
            Err(BrainError::RecursionLimitExceeded { limit: 8 })
        );
    }

    #[test]
    fn test_srai_restores_captures() {
        let mut core = core_with(vec![
            CategoryDef::new("inner *", TemplateNode::star()),
            CategoryDef::new(
                "outer *",
                TemplateNode::seq([
                    TemplateNode::srai(TemplateNode::text("inner deep")),
                    TemplateNode::text(" "),
                    TemplateNode::star(),
                ]),
            ),
        ]);
        let mut ctx = EvalContext::new(&mut core);
        let reply = ctx.respond("outer shallow").unwrap().unwrap();
        assert_eq!(reply.text, "deep shallow");
        assert!(ctx.captures().is_empty());
    }

    #[test]
    fn test_random_is_seeded() {
        let items = TemplateNode::random((0..10).map(|i| TemplateNode::text(i.to_string())));
        let run = || {
            let mut core = core_with(vec![]);
            (0..5)
                .map(|_| eval(&mut core, &items).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
        assert_eq!(eval(&mut core_with(vec![]), &TemplateNode::Random(Vec::new())).unwrap(), "");
    }

    #[test]
    fn test_transform_and_history_out_of_range() {
        let mut core = core_with(vec![]);
        let node = TemplateNode::seq([
            TemplateNode::transform(StringOp::Uppercase, "loud".into()),
            TemplateNode::Response { index: 3 },
            TemplateNode::That { index: 1, sentence: 1 },
            TemplateNode::Input { index: 2 },
            TemplateNode::Request { index: 9 },
        ]);
        assert_eq!(eval(&mut core, &node).unwrap(), "LOUD");
    }

    #[test]
    fn test_srai_answers_each_sentence() {
        let mut core = core_with(vec![
            CategoryDef::new("hello", "Hi.".into()),
            CategoryDef::new("bye", "See you.".into()),
        ]);
        let node = TemplateNode::srai("Hello. Unknown words! Bye".into());
        assert_eq!(eval(&mut core, &node).unwrap(), "Hi. See you.");
    }

    #[test]
    fn test_that_sentence_and_input_tags() {
        let mut core = core_with(vec![
            CategoryDef::new("greet", "Hello there. Do you like tea?".into()),
            CategoryDef::new(
                "recall",
                TemplateNode::seq([
                    TemplateNode::That { index: 1, sentence: 2 },
                    "|".into(),
                    TemplateNode::Input { index: 1 },
                    "|".into(),
                    TemplateNode::Input { index: 2 },
                ]),
            ),
        ]);
        core.run_turn("greet").unwrap();
        let record = core.run_turn("I am Ann. Recall").unwrap();
        assert_eq!(record.response, "Hello there|Recall|I am Ann");
    }
}
