//! Text understanding for the Kampus chat engine: lexicon, entity extraction,
//! intent routing and reply phrasing.
//!
//! Everything here is deterministic and table driven. The lexicon and phrase
//! book are built once and shared read-only between requests.

pub mod classify;
pub mod extract;
pub mod lexicon;
pub mod select;

pub use classify::Router;
pub use extract::Extractor;
pub use lexicon::{DayPart, DayTerm, Lexicon, PhraseTable, TimeMatch, TimeTerm, tokenize};
pub use select::{Phrase, PhraseBook, PhraseBookError, PoolKey};
