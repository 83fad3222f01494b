//! Map-function registry for the `map` tag.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::TagError;

/// A pure string-to-string function callable from templates.
pub type MapFunction = Arc<dyn Fn(&str) -> String + Send + Sync>;

fn successor(arg: &str) -> String {
    arg.trim()
        .parse::<i64>()
        .ok()
        .and_then(|n| n.checked_add(1))
        .map(|n| n.to_string())
        .unwrap_or_default()
}

fn predecessor(arg: &str) -> String {
    arg.trim()
        .parse::<i64>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .map(|n| n.to_string())
        .unwrap_or_default()
}

/// Registered map functions, keyed by lower-case name.
///
/// `successor` and `predecessor` are always present.
#[derive(Clone)]
pub struct MapRegistry {
    functions: HashMap<String, MapFunction>,
}

impl fmt::Debug for MapRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("MapRegistry").field("functions", &names).finish()
    }
}

impl Default for MapRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MapRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            functions: HashMap::new(),
        };
        registry.register("successor", successor);
        registry.register("predecessor", predecessor);
        registry
    }

    /// Register a function, replacing any previous one of the same name.
    pub fn register(&mut self, name: &str, function: impl Fn(&str) -> String + Send + Sync + 'static) {
        self.functions
            .insert(name.trim().to_lowercase(), Arc::new(function));
    }

    /// Register a lookup table. Keys match case-insensitively; unknown keys
    /// map to `""`.
    pub fn register_table<K, V>(&mut self, name: &str, table: impl IntoIterator<Item = (K, V)>)
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let table: HashMap<String, String> = table
            .into_iter()
            .map(|(k, v)| (k.as_ref().trim().to_lowercase(), v.into()))
            .collect();
        self.register(name, move |arg| {
            table
                .get(&arg.trim().to_lowercase())
                .cloned()
                .unwrap_or_default()
        });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(&name.trim().to_lowercase())
    }

    /// Call a function by name.
    pub fn call(&self, name: &str, arg: &str) -> Result<String, TagError> {
        self.functions
            .get(&name.trim().to_lowercase())
            .map(|function| function(arg))
            .ok_or_else(|| TagError::UnknownFunction(name.to_string()))
    }
}
