//! Wildcard captures produced by a successful match.

use serde::{Deserialize, Serialize};

/// Which segment of the match key a capture came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StarKind {
    /// The input pattern (`star`).
    Pattern,
    /// The previous bot utterance (`thatstar`).
    That,
    /// The current topic (`topicstar`).
    Topic,
}

/// Ordered captures for one match, per segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureSet {
    stars: Vec<String>,
    that_stars: Vec<String>,
    topic_stars: Vec<String>,
}

impl CaptureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures of one segment, leftmost first.
    pub fn list(&self, kind: StarKind) -> &[String] {
        match kind {
            StarKind::Pattern => &self.stars,
            StarKind::That => &self.that_stars,
            StarKind::Topic => &self.topic_stars,
        }
    }

    /// The 1-based `index`-th capture of a segment, or `""` when out of range.
    pub fn get(&self, kind: StarKind, index: usize) -> &str {
        index
            .checked_sub(1)
            .and_then(|i| self.list(kind).get(i))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Insert a capture before the existing ones of its segment.
    ///
    /// The matcher binds captures while unwinding, right to left.
    pub(crate) fn prepend(&mut self, kind: StarKind, text: String) {
        let list = match kind {
            StarKind::Pattern => &mut self.stars,
            StarKind::That => &mut self.that_stars,
            StarKind::Topic => &mut self.topic_stars,
        };
        list.insert(0, text);
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty() && self.that_stars.is_empty() && self.topic_stars.is_empty()
    }
}
