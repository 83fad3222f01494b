//! Word substitution tables (`person`, `person2`, `gender`, `normalize`,
//! `denormalize`).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The substitution tables a template can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubstitutionKind {
    /// First and second person swap (`I` ↔ `you`).
    Person,
    /// First and third person swap.
    Person2,
    /// He/she swap.
    Gender,
    /// Expand contractions and abbreviations.
    Normalize,
    /// Reverse of `normalize`.
    Denormalize,
}

#[derive(Debug, Clone, Default)]
struct Table {
    phrases: HashMap<String, String>,
    longest: usize,
}

/// Substitution tables keyed by [`SubstitutionKind`].
///
/// Keys are whole words or phrases, matched case-insensitively and longest
/// first. A replacement written in lower case takes on the case of the text it
/// replaces.
#[derive(Debug, Clone, Default)]
pub struct Substitutions {
    tables: HashMap<SubstitutionKind, Table>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add entries to a table.
    pub fn extend<K, V>(&mut self, kind: SubstitutionKind, entries: impl IntoIterator<Item = (K, V)>)
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let table = self.tables.entry(kind).or_default();
        for (key, value) in entries {
            let words: Vec<String> = key
                .as_ref()
                .split_whitespace()
                .map(str::to_lowercase)
                .collect();
            if words.is_empty() {
                continue;
            }
            table.longest = table.longest.max(words.len());
            table.phrases.insert(words.join(" "), value.into());
        }
    }

    pub fn has_table(&self, kind: SubstitutionKind) -> bool {
        self.tables.contains_key(&kind)
    }

    /// Apply one table to `text`. Text without a table passes through.
    pub fn apply(&self, kind: SubstitutionKind, text: &str) -> String {
        let Some(table) = self.tables.get(&kind) else {
            return text.to_string();
        };
        let words: Vec<&str> = text.split_whitespace().collect();
        let mut out: Vec<String> = Vec::with_capacity(words.len());
        let mut i = 0;
        'outer: while i < words.len() {
            for len in (1..=table.longest.min(words.len() - i)).rev() {
                let original = words[i..i + len].join(" ");
                if let Some(replacement) = table.phrases.get(&original.to_lowercase()) {
                    out.push(match_case(replacement, &original));
                    i += len;
                    continue 'outer;
                }
            }
            out.push(words[i].to_string());
            i += 1;
        }
        out.join(" ")
    }
}

fn has_cased(text: &str) -> bool {
    text.chars().any(|c| c.is_lowercase() || c.is_uppercase())
}

fn is_lower(text: &str) -> bool {
    has_cased(text) && !text.chars().any(char::is_uppercase)
}

fn is_upper(text: &str) -> bool {
    has_cased(text) && !text.chars().any(char::is_lowercase)
}

fn is_title(text: &str) -> bool {
    has_cased(text)
        && text.split_whitespace().all(|word| {
            let mut letters = word.chars().filter(|c| c.is_alphabetic());
            match letters.next() {
                Some(first) => first.is_uppercase() && !letters.any(char::is_uppercase),
                None => true,
            }
        })
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Give a lower-case `replacement` the case pattern of `original`.
pub fn match_case(replacement: &str, original: &str) -> String {
    if !is_lower(replacement) {
        return replacement.to_string();
    }
    if is_title(original) {
        title_case(replacement)
    } else if is_upper(original) {
        replacement.to_uppercase()
    } else {
        replacement.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> Substitutions {
        let mut subs = Substitutions::new();
        subs.extend(
            SubstitutionKind::Person,
            [("i", "you"), ("me", "you"), ("you", "me"), ("i am", "you are"), ("my", "your")],
        );
        subs
    }

    #[test]
    fn test_word_and_phrase_substitution() {
        let subs = person();
        assert_eq!(
            subs.apply(SubstitutionKind::Person, "I am sure you like my hat"),
            "you are sure me like your hat"
        );
        assert_eq!(subs.apply(SubstitutionKind::Person, "I"), "You");
    }

    #[test]
    fn test_case_follows_original() {
        let subs = person();
        assert_eq!(subs.apply(SubstitutionKind::Person, "ME"), "YOU");
        assert_eq!(subs.apply(SubstitutionKind::Person, "Me"), "You");
        assert_eq!(subs.apply(SubstitutionKind::Person, "me"), "you");
    }

    #[test]
    fn test_missing_table_passes_through() {
        let subs = person();
        assert!(!subs.has_table(SubstitutionKind::Gender));
        assert_eq!(subs.apply(SubstitutionKind::Gender, "he  said"), "he  said");
    }

    #[test]
    fn test_match_case_keeps_cased_replacement() {
        assert_eq!(match_case("McDonald", "mcdonald"), "McDonald");
        assert_eq!(match_case("ok", "Fine Day"), "Ok");
    }
}
