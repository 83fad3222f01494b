//! Named word sets for `<set>` pattern edges.

use std::collections::{HashMap, HashSet};

/// Set names answered without any loaded data.
pub const BUILTIN_SETS: [&str; 2] = ["integers", "reals"];

fn builtin_contains(set: &str, word: &str) -> Option<bool> {
    match set {
        "integers" => Some(word.parse::<i64>().is_ok()),
        "reals" => Some(word.parse::<f64>().is_ok()),
        _ => None,
    }
}

/// Word sets, keyed by lower-case name. Members are stored normalized.
#[derive(Debug, Clone, Default)]
pub struct WordSets {
    sets: HashMap<String, HashSet<String>>,
}

impl WordSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add members to a set, creating it if needed.
    ///
    /// Members are single words; `normalize` maps them to matching keys.
    pub fn extend<I, S>(&mut self, name: &str, members: I, normalize: impl Fn(&str) -> String)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = self.sets.entry(name.trim().to_lowercase()).or_default();
        for member in members {
            let key = normalize(member.as_ref().trim());
            if !key.is_empty() {
                set.insert(key);
            }
        }
    }

    /// Whether a loaded or built-in set exists under `name`.
    pub fn contains_set(&self, name: &str) -> bool {
        self.sets.contains_key(name) || BUILTIN_SETS.contains(&name)
    }

    /// Membership test for a normalized word. Loaded sets shadow built-ins.
    pub fn contains(&self, name: &str, word: &str) -> bool {
        match self.sets.get(name) {
            Some(set) => set.contains(word),
            None => builtin_contains(name, word).unwrap_or(false),
        }
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
