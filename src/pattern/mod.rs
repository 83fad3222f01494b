//! Pattern side of the brain: normalization, categories and the matcher.

pub mod captures;
pub mod category;
pub mod matcher;
pub mod token;

pub use captures::{CaptureSet, StarKind};
pub use category::{Category, CategoryDef, CategoryKey, Origin};
pub use matcher::{Match, MatchEnv, Matcher};
pub use token::{tokens_to_text, InputWord, Normalizer, PatternToken, PunctuationPolicy};
