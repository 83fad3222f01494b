//! Conversation state: predicates and turn history.

pub mod history;
pub mod predicates;

pub use history::{History, TurnRecord};
pub use predicates::{PredicateCallback, PredicateStore, SubscriptionId};
