//! The brain: one knowledge base, one conversation, one lock.
//!
//! Every public operation takes the same `parking_lot::Mutex`, so turns are
//! serialized in call order and a learn or unlearn is visible to every turn
//! that starts after the mutating call returns.

mod builder;
mod state;

pub use self::builder::BrainBuilder;
pub use self::state::BrainCore;

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::BrainError;
use crate::memory::{SubscriptionId, TurnRecord};
use crate::pattern::{Category, CategoryDef, CategoryKey, Origin};

/// A dialogue-rule interpreter instance.
///
/// `Brain` is `Send + Sync`; share it behind an `Arc` to answer from several
/// threads, one turn at a time.
pub struct Brain {
    core: Mutex<BrainCore>,
}

impl Brain {
    pub fn builder() -> BrainBuilder {
        BrainBuilder::new()
    }

    pub(crate) fn from_core(core: BrainCore) -> Self {
        Self {
            core: Mutex::new(core),
        }
    }

    /// Answer one input.
    ///
    /// Unmatched input yields an empty response. The turn is recorded in
    /// history unless it fails.
    ///
    /// The brain's lock is held for the whole turn, predicate subscribers
    /// included. Calling back into this brain from a subscriber or a map
    /// function deadlocks.
    pub fn process(&self, input: &str) -> Result<String, BrainError> {
        self.process_turn(input).map(|record| record.response)
    }

    /// Like [`process`](Self::process), returning the full turn record.
    pub fn process_turn(&self, input: &str) -> Result<TurnRecord, BrainError> {
        let mut core = self.core.lock();
        let result = core.run_turn(input);
        if let Err(err) = &result {
            log::warn!("Turn aborted for {:?}: {}", input, err);
        }
        result
    }

    /// Subscribe to changes of a predicate; the callback gets `(old, new)`.
    pub fn subscribe(
        &self,
        name: &str,
        callback: impl Fn(&str, &str) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.core.lock().predicates.subscribe(name, callback)
    }

    pub fn unsubscribe(&self, id: &SubscriptionId) -> bool {
        self.core.lock().predicates.unsubscribe(id)
    }

    /// Current value of a predicate, or the configured default.
    pub fn predicate(&self, name: &str) -> String {
        self.core.lock().predicates.get(name).to_string()
    }

    /// Set a predicate from outside a turn. Subscribers are notified.
    pub fn set_predicate(&self, name: &str, value: impl Into<String>) -> String {
        self.core.lock().predicates.set(name, value.into())
    }

    pub fn bot_property(&self, name: &str) -> Option<String> {
        self.core.lock().profile.get(name).map(str::to_string)
    }

    /// Add or replace a category. Returns `false` when the pattern is empty
    /// after normalization.
    pub fn add_category(&self, def: CategoryDef) -> bool {
        let mut core = self.core.lock();
        match def.compile(&core.normalizer, Origin::Loaded) {
            Ok(category) => {
                core.matcher.insert(category);
                true
            }
            Err(err) => {
                log::warn!("Skipping category: {}", err);
                false
            }
        }
    }

    /// Normalize a category definition into the key it would be stored under.
    pub fn category_key(&self, def: &CategoryDef) -> Option<CategoryKey> {
        let core = self.core.lock();
        def.compile(&core.normalizer, Origin::Loaded)
            .ok()
            .map(|category| category.key)
    }

    /// Remove the category stored under `key`. A loaded category hidden by
    /// a learned one there is dropped too.
    pub fn remove_category(&self, key: &CategoryKey) -> bool {
        let mut core = self.core.lock();
        core.shadowed.remove(key);
        core.matcher.remove(key).is_some()
    }

    pub fn category_count(&self) -> usize {
        self.core.lock().matcher.len()
    }

    /// Categories created by `learn`, in trie order.
    pub fn learned_categories(&self) -> Vec<Arc<Category>> {
        self.core
            .lock()
            .matcher
            .categories()
            .into_iter()
            .filter(|category| category.origin == Origin::Learned)
            .collect()
    }

    /// Completed turns, oldest first.
    pub fn history(&self) -> Vec<TurnRecord> {
        self.core.lock().history.turns().to_vec()
    }
}
