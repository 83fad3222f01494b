//! Category trie and lookup.
//!
//! Every category is stored along the path `pattern <that> that <topic> topic`.
//! Lookup walks the trie against the input words, the previous bot utterance
//! and the topic, joined by the same two separators, trying the children of
//! each node in precedence order and backtracking on failure. The first
//! complete path wins.
//!
//! Precedence at a node, highest first:
//!
//! | edge          | width | captures |
//! |---------------|-------|----------|
//! | `$word`       | 1     | no       |
//! | `#`           | 0..   | yes      |
//! | `_`           | 1..   | yes      |
//! | bot property  | 1     | no       |
//! | predicate     | 1     | no       |
//! | exact word    | 1     | no       |
//! | set member    | 1     | yes      |
//! | `^`           | 0..   | yes      |
//! | `*`           | 1..   | yes      |
//!
//! Wildcards try the longest span first and give back one word at a time.
//! They never cross a separator.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::captures::{CaptureSet, StarKind};
use super::category::{Category, CategoryKey};
use super::token::{InputWord, PatternToken};

// ============================================================================
// Trie
// ============================================================================

/// Trie edge. Variant order is lookup precedence.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Edge {
    Priority(String),
    Hash,
    Underscore,
    Bot(String),
    Predicate(String),
    Word(String),
    Set(String),
    Caret,
    Star,
    That,
    Topic,
}

impl From<&PatternToken> for Edge {
    fn from(token: &PatternToken) -> Self {
        match token {
            PatternToken::Word(w) => Edge::Word(w.clone()),
            PatternToken::Priority(w) => Edge::Priority(w.clone()),
            PatternToken::Set(name) => Edge::Set(name.clone()),
            PatternToken::Bot(name) => Edge::Bot(name.clone()),
            PatternToken::Predicate(name) => Edge::Predicate(name.clone()),
            PatternToken::Star => Edge::Star,
            PatternToken::Underscore => Edge::Underscore,
            PatternToken::Hash => Edge::Hash,
            PatternToken::Caret => Edge::Caret,
        }
    }
}

fn key_path(key: &CategoryKey) -> Vec<Edge> {
    let mut path = Vec::with_capacity(key.pattern.len() + key.that.len() + key.topic.len() + 2);
    path.extend(key.pattern.iter().map(Edge::from));
    path.push(Edge::That);
    path.extend(key.that.iter().map(Edge::from));
    path.push(Edge::Topic);
    path.extend(key.topic.iter().map(Edge::from));
    path
}

#[derive(Debug, Default)]
struct MatchNode {
    children: BTreeMap<Edge, MatchNode>,
    category: Option<Arc<Category>>,
}

impl MatchNode {
    fn is_empty(&self) -> bool {
        self.children.is_empty() && self.category.is_none()
    }

    fn collect(&self, out: &mut Vec<Arc<Category>>) {
        if let Some(category) = &self.category {
            out.push(Arc::clone(category));
        }
        for child in self.children.values() {
            child.collect(out);
        }
    }
}

fn remove_path(node: &mut MatchNode, path: &[Edge]) -> Option<Arc<Category>> {
    match path.split_first() {
        None => node.category.take(),
        Some((edge, rest)) => {
            let child = node.children.get_mut(edge)?;
            let removed = remove_path(child, rest);
            if child.is_empty() {
                node.children.remove(edge);
            }
            removed
        }
    }
}

fn prune(node: &mut MatchNode, pred: &mut dyn FnMut(&Category) -> bool) -> usize {
    let mut removed = 0;
    if node.category.as_deref().map_or(false, |c| pred(c)) {
        node.category = None;
        removed += 1;
    }
    node.children.retain(|_, child| {
        removed += prune(child, pred);
        !child.is_empty()
    });
    removed
}

// ============================================================================
// Lookup environment
// ============================================================================

/// Values the matcher needs at lookup time for set, bot and predicate edges.
///
/// `word` is always a normalized key; implementations normalize their side
/// the same way.
pub trait MatchEnv {
    /// Whether `word` is a member of the named set.
    fn in_set(&self, set: &str, word: &str) -> bool;
    /// Whether `word` equals the named bot property.
    fn matches_bot(&self, name: &str, word: &str) -> bool;
    /// Whether `word` equals the current value of the named predicate.
    fn matches_predicate(&self, name: &str, word: &str) -> bool;
}

/// A successful lookup.
#[derive(Debug, Clone)]
pub struct Match {
    pub category: Arc<Category>,
    pub captures: CaptureSet,
}

// ============================================================================
// Matcher
// ============================================================================

/// The category store.
#[derive(Debug, Default)]
pub struct Matcher {
    root: MatchNode,
    len: usize,
}

impl Matcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored categories.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Store a category, returning the one it replaced under the same key.
    pub fn insert(&mut self, category: Category) -> Option<Arc<Category>> {
        self.insert_shared(Arc::new(category))
    }

    /// Like [`insert`](Self::insert), for a category that is already shared.
    pub fn insert_shared(&mut self, category: Arc<Category>) -> Option<Arc<Category>> {
        let mut node = &mut self.root;
        for edge in key_path(&category.key) {
            node = node.children.entry(edge).or_default();
        }
        let previous = node.category.replace(category);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    /// Remove the category stored under `key`.
    pub fn remove(&mut self, key: &CategoryKey) -> Option<Arc<Category>> {
        let removed = remove_path(&mut self.root, &key_path(key));
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Remove every category `pred` accepts; returns how many went.
    pub fn remove_where(&mut self, mut pred: impl FnMut(&Category) -> bool) -> usize {
        let removed = prune(&mut self.root, &mut pred);
        self.len -= removed;
        removed
    }

    /// Look up a category by exact key.
    pub fn get(&self, key: &CategoryKey) -> Option<Arc<Category>> {
        let mut node = &self.root;
        for edge in key_path(key) {
            node = node.children.get(&edge)?;
        }
        node.category.clone()
    }

    /// All stored categories, in trie order.
    pub fn categories(&self) -> Vec<Arc<Category>> {
        let mut out = Vec::with_capacity(self.len);
        self.root.collect(&mut out);
        out
    }

    /// Find the best category for `input` given the previous utterance and
    /// the topic.
    ///
    /// `that` and `topic` should be non-empty; callers substitute a
    /// placeholder word when there is no context.
    pub fn lookup(
        &self,
        input: &[InputWord],
        that: &[InputWord],
        topic: &[InputWord],
        env: &dyn MatchEnv,
    ) -> Option<Match> {
        if input.is_empty() {
            return None;
        }
        let mut symbols = Vec::with_capacity(input.len() + that.len() + topic.len() + 2);
        symbols.extend(input.iter().map(Symbol::Word));
        symbols.push(Symbol::That);
        symbols.extend(that.iter().map(Symbol::Word));
        symbols.push(Symbol::Topic);
        symbols.extend(topic.iter().map(Symbol::Word));

        let probe = Probe { symbols, env };
        probe
            .descend(&self.root, 0, StarKind::Pattern)
            .map(|(category, captures)| Match { category, captures })
    }
}

// ============================================================================
// Search
// ============================================================================

enum Symbol<'a> {
    Word(&'a InputWord),
    That,
    Topic,
}

type Found = (Arc<Category>, CaptureSet);

struct Probe<'a> {
    symbols: Vec<Symbol<'a>>,
    env: &'a dyn MatchEnv,
}

impl<'a> Probe<'a> {
    fn descend(&self, node: &MatchNode, pos: usize, segment: StarKind) -> Option<Found> {
        match self.symbols.get(pos) {
            Some(Symbol::Word(word)) => self.descend_word(node, pos, segment, word),
            Some(Symbol::That) => self.descend_boundary(node, pos, segment, Some(Edge::That)),
            Some(Symbol::Topic) => self.descend_boundary(node, pos, segment, Some(Edge::Topic)),
            None => self.descend_boundary(node, pos, segment, None),
        }
    }

    fn descend_word(
        &self,
        node: &MatchNode,
        pos: usize,
        segment: StarKind,
        word: &InputWord,
    ) -> Option<Found> {
        if let Some(child) = node.children.get(&Edge::Priority(word.key.clone())) {
            if let Some(found) = self.descend(child, pos + 1, segment) {
                return Some(found);
            }
        }
        if let Some(found) = self.wildcard(node, &Edge::Hash, pos, segment, 0) {
            return Some(found);
        }
        if let Some(found) = self.wildcard(node, &Edge::Underscore, pos, segment, 1) {
            return Some(found);
        }

        // Bot(..) and Predicate(..) edges sort between these bounds.
        for (edge, child) in node
            .children
            .range(Edge::Bot(String::new())..Edge::Word(String::new()))
        {
            let accepted = match edge {
                Edge::Bot(name) => self.env.matches_bot(name, &word.key),
                Edge::Predicate(name) => self.env.matches_predicate(name, &word.key),
                _ => false,
            };
            if accepted {
                if let Some(found) = self.descend(child, pos + 1, segment) {
                    return Some(found);
                }
            }
        }

        if let Some(child) = node.children.get(&Edge::Word(word.key.clone())) {
            if let Some(found) = self.descend(child, pos + 1, segment) {
                return Some(found);
            }
        }

        for (edge, child) in node
            .children
            .range(Edge::Set(String::new())..Edge::Caret)
        {
            let Edge::Set(name) = edge else { continue };
            if !self.env.in_set(name, &word.key) {
                continue;
            }
            if let Some((category, mut captures)) = self.descend(child, pos + 1, segment) {
                captures.prepend(segment, word.text.clone());
                return Some((category, captures));
            }
        }

        if let Some(found) = self.wildcard(node, &Edge::Caret, pos, segment, 0) {
            return Some(found);
        }
        self.wildcard(node, &Edge::Star, pos, segment, 1)
    }

    /// At a separator or the end of input only zero-width wildcards, the
    /// separator edge itself, or the terminal category can apply.
    fn descend_boundary(
        &self,
        node: &MatchNode,
        pos: usize,
        segment: StarKind,
        separator: Option<Edge>,
    ) -> Option<Found> {
        if let Some(found) = self.wildcard(node, &Edge::Hash, pos, segment, 0) {
            return Some(found);
        }
        let next = match separator {
            Some(edge) => {
                let next_segment = if edge == Edge::That {
                    StarKind::That
                } else {
                    StarKind::Topic
                };
                node.children
                    .get(&edge)
                    .and_then(|child| self.descend(child, pos + 1, next_segment))
            }
            None => node
                .category
                .as_ref()
                .map(|category| (Arc::clone(category), CaptureSet::default())),
        };
        if next.is_some() {
            return next;
        }
        self.wildcard(node, &Edge::Caret, pos, segment, 0)
    }

    /// Try a wildcard edge, longest span first, never shorter than `min`.
    fn wildcard(
        &self,
        node: &MatchNode,
        edge: &Edge,
        pos: usize,
        segment: StarKind,
        min: usize,
    ) -> Option<Found> {
        let child = node.children.get(edge)?;
        let end = self.segment_end(pos);
        for taken in (min..=end - pos).rev() {
            if let Some((category, mut captures)) = self.descend(child, pos + taken, segment) {
                captures.prepend(segment, self.join(pos, pos + taken));
                return Some((category, captures));
            }
        }
        None
    }

    fn segment_end(&self, pos: usize) -> usize {
        self.symbols[pos..]
            .iter()
            .position(|s| !matches!(s, Symbol::Word(_)))
            .map_or(self.symbols.len(), |offset| pos + offset)
    }

    fn join(&self, start: usize, end: usize) -> String {
        self.symbols[start..end]
            .iter()
            .filter_map(|s| match s {
                Symbol::Word(w) => Some(w.text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::category::{CategoryDef, Origin};
    use crate::pattern::token::Normalizer;
    use crate::template::TemplateNode;
    use std::collections::{HashMap, HashSet};

    #[derive(Default)]
    struct Env {
        sets: HashMap<String, HashSet<String>>,
        bot: HashMap<String, String>,
        predicates: HashMap<String, String>,
    }

    impl MatchEnv for Env {
        fn in_set(&self, set: &str, word: &str) -> bool {
            self.sets.get(set).map_or(false, |s| s.contains(word))
        }
        fn matches_bot(&self, name: &str, word: &str) -> bool {
            self.bot.get(name).map_or(false, |v| v == word)
        }
        fn matches_predicate(&self, name: &str, word: &str) -> bool {
            self.predicates.get(name).map_or(false, |v| v == word)
        }
    }

    fn add(matcher: &mut Matcher, pattern: &str, reply: &str) {
        add_def(matcher, CategoryDef::new(pattern, TemplateNode::text(reply)));
    }

    fn add_def(matcher: &mut Matcher, def: CategoryDef) {
        let category = def.compile(&Normalizer::default(), Origin::Loaded).unwrap();
        matcher.insert(category);
    }

    fn find(matcher: &Matcher, env: &Env, input: &str) -> Option<(String, CaptureSet)> {
        find_in(matcher, env, input, "unknown", "unknown")
    }

    fn find_in(
        matcher: &Matcher,
        env: &Env,
        input: &str,
        that: &str,
        topic: &str,
    ) -> Option<(String, CaptureSet)> {
        let norm = Normalizer::default();
        matcher
            .lookup(&norm.tokenize(input), &norm.tokenize(that), &norm.tokenize(topic), env)
            .map(|m| match &m.category.template {
                TemplateNode::Text(t) => (t.clone(), m.captures),
                other => panic!("unexpected template {:?}", other),
            })
    }

    #[test]
    fn test_literal_beats_star() {
        let mut matcher = Matcher::new();
        add(&mut matcher, "*", "catch-all");
        add(&mut matcher, "hello", "literal");
        let env = Env::default();
        assert_eq!(find(&matcher, &env, "Hello!").unwrap().0, "literal");
        assert_eq!(find(&matcher, &env, "goodbye").unwrap().0, "catch-all");
    }

    #[test]
    fn test_star_captures_original_case() {
        let mut matcher = Matcher::new();
        add(&mut matcher, "before * after", "x");
        let (_, caps) = find(&matcher, &Env::default(), "Before Big X after").unwrap();
        assert_eq!(caps.get(StarKind::Pattern, 1), "Big X");
        assert_eq!(caps.get(StarKind::That, 1), "unknown");
    }

    #[test]
    fn test_precedence_order() {
        let mut matcher = Matcher::new();
        add(&mut matcher, "* there", "star");
        add(&mut matcher, "^ there", "caret");
        add(&mut matcher, "hi there", "word");
        add(&mut matcher, "_ there", "underscore");
        add(&mut matcher, "# there", "hash");
        add(&mut matcher, "$hi there", "priority");
        let env = Env::default();
        assert_eq!(find(&matcher, &env, "hi there").unwrap().0, "priority");
        assert_eq!(find(&matcher, &env, "yo there").unwrap().0, "hash");

        let mut matcher = Matcher::new();
        add(&mut matcher, "* there", "star");
        add(&mut matcher, "^ there", "caret");
        add(&mut matcher, "hi there", "word");
        assert_eq!(find(&matcher, &env, "hi there").unwrap().0, "word");
        assert_eq!(find(&matcher, &env, "yo there").unwrap().0, "caret");
        assert_eq!(find(&matcher, &env, "there").unwrap().0, "caret");
    }

    #[test]
    fn test_zero_width_wildcards() {
        let mut matcher = Matcher::new();
        add(&mut matcher, "hello #", "hash");
        add(&mut matcher, "bye *", "star");
        let env = Env::default();
        let (_, caps) = find(&matcher, &env, "hello").unwrap();
        assert_eq!(caps.get(StarKind::Pattern, 1), "");
        assert!(find(&matcher, &env, "bye").is_none());
        assert_eq!(find(&matcher, &env, "bye now").unwrap().0, "star");
    }

    #[test]
    fn test_backtracking_shrinks_wildcard() {
        let mut matcher = Matcher::new();
        add(&mut matcher, "* is * today", "x");
        let (_, caps) = find(&matcher, &Env::default(), "what is it today").unwrap();
        assert_eq!(caps.list(StarKind::Pattern), &["what".to_string(), "it".to_string()]);
    }

    #[test]
    fn test_set_bot_and_predicate_edges() {
        let mut matcher = Matcher::new();
        add(&mut matcher, "i like <set>colors</set>", "set");
        add(&mut matcher, "are you <bot name=\"name\"/>", "bot");
        add(&mut matcher, "i feel <get name=\"mood\"/>", "get");
        let mut env = Env::default();
        env.sets
            .insert("colors".into(), ["red".to_string()].into_iter().collect());
        env.bot.insert("name".into(), "alice".into());
        env.predicates.insert("mood".into(), "happy".into());

        let (_, caps) = find(&matcher, &env, "I like Red").unwrap();
        assert_eq!(caps.get(StarKind::Pattern, 1), "Red");
        assert!(find(&matcher, &env, "i like blue").is_none());

        let (reply, caps) = find(&matcher, &env, "are you Alice").unwrap();
        assert_eq!(reply, "bot");
        assert!(caps.list(StarKind::Pattern).is_empty());
        assert_eq!(find(&matcher, &env, "i feel happy").unwrap().0, "get");
        assert!(find(&matcher, &env, "i feel sad").is_none());
    }

    #[test]
    fn test_that_and_topic_constraints() {
        let mut matcher = Matcher::new();
        add(&mut matcher, "yes", "plain yes");
        add_def(
            &mut matcher,
            CategoryDef::new("yes", TemplateNode::text("glad")).with_that("do you like *"),
        );
        add_def(
            &mut matcher,
            CategoryDef::new("yes", TemplateNode::text("sports yes")).with_topic("sports"),
        );
        let env = Env::default();

        let (reply, caps) = find_in(&matcher, &env, "yes", "Do you like Cheese?", "unknown").unwrap();
        assert_eq!(reply, "glad");
        assert_eq!(caps.get(StarKind::That, 1), "Cheese");
        assert_eq!(find_in(&matcher, &env, "yes", "what", "sports").unwrap().0, "sports yes");
        assert_eq!(find(&matcher, &env, "yes").unwrap().0, "plain yes");
    }

    #[test]
    fn test_insert_replaces_same_key() {
        let mut matcher = Matcher::new();
        add(&mut matcher, "hi", "one");
        add(&mut matcher, "HI", "two");
        assert_eq!(matcher.len(), 1);
        assert_eq!(find(&matcher, &Env::default(), "hi").unwrap().0, "two");
    }

    #[test]
    fn test_remove_and_prune() {
        let mut matcher = Matcher::new();
        add(&mut matcher, "hi", "one");
        add(&mut matcher, "hi there", "two");
        let key = CategoryDef::new("hi there", TemplateNode::text(""))
            .compile(&Normalizer::default(), Origin::Loaded)
            .unwrap()
            .key;
        assert!(matcher.remove(&key).is_some());
        assert!(matcher.remove(&key).is_none());
        assert_eq!(matcher.len(), 1);
        assert!(find(&matcher, &Env::default(), "hi there").is_none());
        assert_eq!(find(&matcher, &Env::default(), "hi").unwrap().0, "one");
    }

    #[test]
    fn test_remove_where() {
        let mut matcher = Matcher::new();
        add(&mut matcher, "a", "1");
        add(&mut matcher, "b", "2");
        let learned = CategoryDef::new("c", TemplateNode::text("3"))
            .compile(&Normalizer::default(), Origin::Learned)
            .unwrap();
        matcher.insert(learned);
        assert_eq!(matcher.remove_where(|c| c.origin == Origin::Learned), 1);
        assert_eq!(matcher.len(), 2);
        assert_eq!(matcher.categories().len(), 2);
        assert_eq!(matcher.remove_where(|_| true), 2);
        assert!(matcher.is_empty());
    }
}
