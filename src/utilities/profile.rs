//! Read-only bot properties for `<bot>` tags and pattern edges.

use std::collections::HashMap;
use std::sync::Arc;

/// Immutable name → value map. Names are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct BotProfile {
    properties: Arc<HashMap<String, String>>,
}

impl BotProfile {
    pub fn new<K, V>(properties: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let properties = properties
            .into_iter()
            .map(|(k, v)| (k.as_ref().trim().to_lowercase(), v.into()))
            .collect();
        Self {
            properties: Arc::new(properties),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties
            .get(&name.trim().to_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let profile = BotProfile::new([("Name", "Ada"), ("age", "7")]);
        assert_eq!(profile.get("NAME"), Some("Ada"));
        assert_eq!(profile.get("species"), None);
        assert_eq!(profile.len(), 2);
    }
}
