//! Append-only ledger of completed turns.

use crate::pattern::CategoryKey;

/// One completed top-level turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnRecord {
    /// Raw user input.
    pub input: String,
    /// Input sentences in the order they were answered.
    pub input_sentences: Vec<String>,
    /// Key of the last category that answered, if any did.
    pub matched: Option<CategoryKey>,
    /// Full response text.
    pub response: String,
    /// Response sentences in order. The last one is the next turn's `that`.
    pub sentences: Vec<String>,
}

impl TurnRecord {
    /// The `sentence`-th response sentence counting back from the last
    /// (1-based), or `""`.
    pub fn that(&self, sentence: usize) -> &str {
        nth_back(&self.sentences, sentence)
    }
}

fn nth_back(items: &[String], index: usize) -> &str {
    index
        .checked_sub(1)
        .and_then(|back| items.iter().rev().nth(back))
        .map_or("", String::as_str)
}

/// Turn history. Index 1 is always the most recent turn.
#[derive(Debug, Clone, Default)]
pub struct History {
    turns: Vec<TurnRecord>,
    /// Sentences of the turn in progress, already seen by `input`.
    pending_inputs: Vec<String>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the turn in progress.
    pub fn append(&mut self, record: TurnRecord) {
        self.pending_inputs.clear();
        self.turns.push(record);
    }

    /// Note an input sentence of the turn in progress.
    pub fn record_input(&mut self, sentence: impl Into<String>) {
        self.pending_inputs.push(sentence.into());
    }

    /// Forget the input sentences of an aborted turn.
    pub fn discard_pending(&mut self) {
        self.pending_inputs.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// All turns, oldest first.
    pub fn turns(&self) -> &[TurnRecord] {
        &self.turns
    }

    /// The turn `index` steps back (1-based).
    pub fn recent(&self, index: usize) -> Option<&TurnRecord> {
        index
            .checked_sub(1)
            .and_then(|back| self.turns.iter().rev().nth(back))
    }

    pub fn response(&self, index: usize) -> &str {
        self.recent(index).map_or("", |t| t.response.as_str())
    }

    pub fn request(&self, index: usize) -> &str {
        self.recent(index).map_or("", |t| t.input.as_str())
    }

    /// Sentence `sentence` (counting back) of the response `turn` turns ago.
    pub fn that(&self, turn: usize, sentence: usize) -> &str {
        self.recent(turn).map_or("", |t| t.that(sentence))
    }

    /// The `index`-th input sentence counting back across turns. The sentence
    /// being answered is index 1.
    pub fn input(&self, index: usize) -> &str {
        let Some(back) = index.checked_sub(1) else {
            return "";
        };
        self.pending_inputs
            .iter()
            .rev()
            .chain(
                self.turns
                    .iter()
                    .rev()
                    .flat_map(|turn| turn.input_sentences.iter().rev()),
            )
            .nth(back)
            .map_or("", String::as_str)
    }
}
