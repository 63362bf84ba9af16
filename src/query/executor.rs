use crate::error::{Error, Result};
use crate::index::types::TextMap;
use crate::query::fuzzy::{Occurrence, find_near_matches};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

/// Occurrences of each query term within one document
pub type DocumentMatches = BTreeMap<String, Vec<Occurrence>>;

/// Ordered terms sharing one edit-distance bound
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchQuery {
    terms: Vec<String>,
    max_distance: usize,
}

impl SearchQuery {
    /// Build a query, rejecting negative distances and empty terms
    pub fn new<I, S>(terms: I, max_distance: i64) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let max_distance = usize::try_from(max_distance).map_err(|_| {
            Error::InvalidArgument(format!(
                "distance must be non-negative, got {}",
                max_distance
            ))
        })?;

        let terms: Vec<String> = terms.into_iter().map(Into::into).collect();
        if terms.iter().any(|t| t.is_empty()) {
            return Err(Error::InvalidArgument("query terms must not be empty".to_string()));
        }

        Ok(Self {
            terms,
            max_distance,
        })
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn max_distance(&self) -> usize {
        self.max_distance
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Search result: documents in which every term matched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MatchSet {
    pub documents: BTreeMap<String, DocumentMatches>,
}

impl MatchSet {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.documents.contains_key(path)
    }

    pub fn get(&self, path: &str) -> Option<&DocumentMatches> {
        self.documents.get(path)
    }

    /// Total occurrences across all documents and terms
    pub fn occurrence_count(&self) -> usize {
        self.documents
            .values()
            .flat_map(|terms| terms.values())
            .map(Vec::len)
            .sum()
    }
}

/// Documents still in the running after some number of terms
type Survivors<'a> = Vec<(&'a str, &'a str, DocumentMatches)>;

/// Run `query` against every document in `text_map`.
///
/// Terms narrow the candidate set in query order: term *i* is only matched
/// against documents that matched terms *0..i*. An empty query matches
/// nothing.
pub fn search(text_map: &TextMap, query: &SearchQuery) -> MatchSet {
    if query.is_empty() {
        return MatchSet::default();
    }

    let initial: Survivors<'_> = text_map
        .iter()
        .map(|(path, text)| (path.as_str(), text.as_str(), DocumentMatches::new()))
        .collect();

    let survivors = query.terms().iter().fold(initial, |survivors, term| {
        narrow(survivors, term, query.max_distance())
    });

    MatchSet {
        documents: survivors
            .into_iter()
            .map(|(path, _, matches)| (path.to_string(), matches))
            .collect(),
    }
}

/// One filter step: keep documents where `term` occurs, recording where
fn narrow<'a>(survivors: Survivors<'a>, term: &str, max_distance: usize) -> Survivors<'a> {
    survivors
        .into_par_iter()
        .filter_map(|(path, text, mut matches)| {
            let occurrences = find_near_matches(term, text, max_distance);
            if occurrences.is_empty() {
                return None;
            }
            matches.insert(term.to_string(), occurrences);
            Some((path, text, matches))
        })
        .collect()
}
