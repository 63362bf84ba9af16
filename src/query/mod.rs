pub mod executor;
pub mod fuzzy;
pub mod parser;

pub use executor::{DocumentMatches, MatchSet, SearchQuery, search};
pub use fuzzy::{Occurrence, find_near_matches, is_near_match, levenshtein};
pub use parser::{Command, parse_command, parse_terms};
