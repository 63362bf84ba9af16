use crate::error::Result;
use crate::index::types::TextMap;
use crate::output;
use crate::query::{Command, MatchSet, SearchQuery, parse_command, search};
use lru::LruCache;
use std::io;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use termcolor::{Color, ColorSpec, WriteColor};
use tracing::debug;

const HELP: &str = "\
Type search terms separated by spaces; \"quoted text\" is one term.
A document matches when every term occurs within the edit distance.

Directives:
  :distance N, :d N   set the maximum edit distance
  :distance, :d       show the current edit distance
  :help, :h           show this help
  exit(), :q, :quit   leave the session";

/// Whether the session keeps reading after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Interactive search state over one loaded index
pub struct Session {
    root: PathBuf,
    text_map: TextMap,
    distance: usize,
    search_cache: LruCache<(Vec<String>, usize), MatchSet>,
}

impl Session {
    pub fn new(root: PathBuf, text_map: TextMap, distance: usize, cache_size: usize) -> Self {
        let cache_size = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            root,
            text_map,
            distance,
            search_cache: LruCache::new(cache_size),
        }
    }

    pub fn distance(&self) -> usize {
        self.distance
    }

    pub fn document_count(&self) -> usize {
        self.text_map.len()
    }

    /// Number of result sets currently cached
    pub fn cached_searches(&self) -> usize {
        self.search_cache.len()
    }

    /// Print the greeting shown once when the session starts
    pub fn print_banner<W: WriteColor>(&self, out: &mut W) -> io::Result<()> {
        let count = self.document_count();
        writeln!(
            out,
            "{} document{} indexed under {}",
            count,
            if count == 1 { "" } else { "s" },
            self.root.display()
        )?;
        writeln!(
            out,
            "Maximum edit distance is {}. Type :help for directives, {} to quit.",
            self.distance,
            crate::query::parser::EXIT_DIRECTIVE
        )
    }

    /// Handle one line of input. Errors in the line itself are printed and
    /// the session continues; only write failures are returned.
    pub fn handle_line<W: WriteColor>(&mut self, line: &str, out: &mut W) -> io::Result<Flow> {
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(e) => {
                print_error(out, &e)?;
                return Ok(Flow::Continue);
            }
        };

        match command {
            Command::Exit => return Ok(Flow::Exit),
            Command::Empty => {}
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::ShowDistance => writeln!(out, "Maximum edit distance is {}", self.distance)?,
            Command::SetDistance(distance) => {
                self.distance = distance;
                writeln!(out, "Maximum edit distance set to {}", distance)?;
            }
            Command::Search(terms) => match self.execute_search(terms) {
                Ok((query, matches, cached)) => {
                    output::print_match_set(out, &matches, query.terms(), &self.text_map)?;
                    print_summary(out, &matches, cached)?;
                }
                Err(e) => print_error(out, &e)?,
            },
        }

        Ok(Flow::Continue)
    }

    /// Run a search, serving repeats from the cache
    fn execute_search(&mut self, terms: Vec<String>) -> Result<(SearchQuery, MatchSet, bool)> {
        let distance = i64::try_from(self.distance).unwrap_or(i64::MAX);
        let query = SearchQuery::new(terms, distance)?;
        let key = (query.terms().to_vec(), query.max_distance());

        if let Some(cached) = self.search_cache.get(&key) {
            debug!(terms = ?key.0, distance = key.1, "search cache hit");
            return Ok((query, cached.clone(), true));
        }

        let matches = search(&self.text_map, &query);
        self.search_cache.put(key, matches.clone());
        Ok((query, matches, false))
    }
}

fn print_summary<W: WriteColor>(out: &mut W, matches: &MatchSet, cached: bool) -> io::Result<()> {
    if !matches.is_empty() {
        writeln!(out)?;
    }
    let suffix = if cached { " (cached)" } else { "" };
    match matches.len() {
        0 => writeln!(out, "No matching documents{}", suffix),
        1 => writeln!(out, "1 matching document{}", suffix),
        n => writeln!(out, "{} matching documents{}", n, suffix),
    }
}

fn print_error<W: WriteColor>(out: &mut W, err: &crate::Error) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
    write!(out, "error:")?;
    out.reset()?;
    writeln!(out, " {}", err)
}
