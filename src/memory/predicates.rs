//! Predicate store: session variables with change notification.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Change callback, called with `(old, new)`.
pub type PredicateCallback = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// Handle returned by [`PredicateStore::subscribe`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    /// Predicate the subscription watches.
    pub name: String,
    id: u64,
}

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({}:{})", self.id, self.name)
    }
}

#[derive(Clone)]
struct Subscriber {
    id: SubscriptionId,
    callback: PredicateCallback,
}

/// Named string values. Names are case-insensitive; an unset name reads as
/// the store's default value.
pub struct PredicateStore {
    values: HashMap<String, String>,
    default_value: String,
    subscribers: HashMap<String, Vec<Subscriber>>,
    next_id: u64,
}

impl fmt::Debug for PredicateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateStore")
            .field("values", &self.values)
            .field("default_value", &self.default_value)
            .field(
                "subscribers",
                &self.subscribers.values().map(Vec::len).sum::<usize>(),
            )
            .finish()
    }
}

impl Default for PredicateStore {
    fn default() -> Self {
        Self::new("")
    }
}

fn canonical(name: &str) -> String {
    name.trim().to_lowercase()
}

impl PredicateStore {
    pub fn new(default_value: impl Into<String>) -> Self {
        Self {
            values: HashMap::new(),
            default_value: default_value.into(),
            subscribers: HashMap::new(),
            next_id: 1,
        }
    }

    /// Current value, or the default when unset.
    pub fn get(&self, name: &str) -> &str {
        self.values
            .get(&canonical(name))
            .map(String::as_str)
            .unwrap_or(self.default_value.as_str())
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.values.contains_key(&canonical(name))
    }

    /// Store `value` and notify the subscribers of `name` in registration
    /// order. Returns the previous value.
    ///
    /// Callbacks run before this returns, on the caller's thread.
    pub fn set(&mut self, name: &str, value: String) -> String {
        let key = canonical(name);
        let old = self.get(&key).to_string();
        self.values.insert(key.clone(), value.clone());
        if let Some(subscribers) = self.subscribers.get(&key) {
            for subscriber in subscribers {
                (subscriber.callback)(&old, &value);
            }
        }
        old
    }

    /// Register a callback for changes to `name`.
    pub fn subscribe(
        &mut self,
        name: &str,
        callback: impl Fn(&str, &str) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId {
            name: canonical(name),
            id: self.next_id,
        };
        self.next_id += 1;
        self.subscribers
            .entry(id.name.clone())
            .or_default()
            .push(Subscriber {
                id: id.clone(),
                callback: Arc::new(callback),
            });
        id
    }

    /// Remove a subscription. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: &SubscriptionId) -> bool {
        let Some(subscribers) = self.subscribers.get_mut(&id.name) else {
            return false;
        };
        let before = subscribers.len();
        subscribers.retain(|s| s.id != *id);
        let removed = subscribers.len() != before;
        if subscribers.is_empty() {
            self.subscribers.remove(&id.name);
        }
        removed
    }

    /// Copy of every set value.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.values.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<(String, String)>>>, impl Fn(&str, &str) + Send + Sync) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        (calls, move |old: &str, new: &str| {
            sink.lock().push((old.to_string(), new.to_string()))
        })
    }

    #[test]
    fn test_unset_reads_default() {
        let store = PredicateStore::new("unknown");
        assert_eq!(store.get("anything"), "unknown");
        assert!(!store.is_set("anything"));
    }

    #[test]
    fn test_names_are_case_insensitive() {
        let mut store = PredicateStore::default();
        store.set("Name", "Ada".into());
        assert_eq!(store.get("NAME"), "Ada");
        assert_eq!(store.snapshot().get("name").map(String::as_str), Some("Ada"));
    }

    #[test]
    fn test_subscriber_called_once_with_old_and_new() {
        let mut store = PredicateStore::default();
        let (calls, callback) = recorder();
        store.subscribe("n", callback);
        assert_eq!(store.set("n", "v".into()), "");
        assert_eq!(*calls.lock(), vec![("".to_string(), "v".to_string())]);
        store.set("other", "x".into());
        assert_eq!(calls.lock().len(), 1);
    }

    #[test]
    fn test_subscribers_run_in_registration_order() {
        let mut store = PredicateStore::default();
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            store.subscribe("n", move |_, _| order.lock().push(tag));
        }
        store.set("n", "1".into());
        assert_eq!(*order.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unsubscribe() {
        let mut store = PredicateStore::default();
        let (calls, callback) = recorder();
        let id = store.subscribe("n", callback);
        assert!(store.unsubscribe(&id));
        assert!(!store.unsubscribe(&id));
        store.set("n", "v".into());
        assert!(calls.lock().is_empty());
    }
}
