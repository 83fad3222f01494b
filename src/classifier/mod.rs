//! Fallback classification for input no category matches.

pub mod bag_of_words;

pub use bag_of_words::{BagOfWords, Intent};

/// Maps unmatched input to replacement text that is matched once more.
pub trait Classifier: Send {
    /// Replacement text for `text`, or `None` to leave the input unanswered.
    fn classify(&self, text: &str) -> Option<String>;
}

impl<F> Classifier for F
where
    F: Fn(&str) -> Option<String> + Send,
{
    fn classify(&self, text: &str) -> Option<String> {
        self(text)
    }
}
