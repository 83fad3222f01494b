//! Injected collaborators: word sets, map functions, substitutions, dates
//! and the bot profile.

pub mod date;
pub mod functions;
pub mod profile;
pub mod substitutions;
pub mod word_sets;

pub use date::{ChronoDateFormatter, DateFormatter};
pub use functions::{MapFunction, MapRegistry};
pub use profile::BotProfile;
pub use substitutions::{SubstitutionKind, Substitutions};
pub use word_sets::WordSets;
