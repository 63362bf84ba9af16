//! Output formatting for search results, in a ripgrep-like layout

use crate::index::types::TextMap;
use crate::query::{MatchSet, Occurrence};
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Stdout stream honouring the color flag
pub fn stdout(color: bool) -> StandardStream {
    StandardStream::stdout(if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    })
}

/// Print every occurrence of every term, grouped by document.
///
/// Terms are listed in query order. Each occurrence shows `line:col:` and the
/// line it sits on, with the matched text highlighted.
pub fn print_match_set<W: WriteColor>(
    out: &mut W,
    matches: &MatchSet,
    terms: &[String],
    text_map: &TextMap,
) -> io::Result<()> {
    let mut first = true;

    for (path, doc_matches) in &matches.documents {
        if !first {
            // Blank line between files
            writeln!(out)?;
        }
        first = false;

        out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
        writeln!(out, "{}", path)?;
        out.reset()?;

        let text = text_map.get(path).map(String::as_str).unwrap_or_default();

        for term in terms {
            let Some(occurrences) = doc_matches.get(term) else {
                continue;
            };
            for occ in occurrences {
                print_occurrence(out, text, occ)?;
            }
        }
    }

    Ok(())
}

/// Print one occurrence as `line:col:<line with match highlighted>`
fn print_occurrence<W: WriteColor>(out: &mut W, text: &str, occ: &Occurrence) -> io::Result<()> {
    let start = occ.start.min(text.len());
    let loc = locate(text, start);

    out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    write!(out, "{}", loc.line_number)?;
    out.reset()?;
    write!(out, ":")?;
    out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    write!(out, "{}", loc.column)?;
    out.reset()?;
    write!(out, ":")?;

    let line = &text[loc.line_start..loc.line_end];
    let safe_start = start - loc.line_start;
    // A match may run past the line; highlight up to the line end
    let safe_end = occ.end.min(loc.line_end) - loc.line_start;

    if safe_start > 0 {
        write!(out, "{}", &line[..safe_start])?;
    }
    if safe_end > safe_start {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
        write!(out, "{}", &line[safe_start..safe_end])?;
        out.reset()?;
    }
    if safe_end < line.len() {
        write!(out, "{}", &line[safe_end..])?;
    }

    if occ.distance > 0 {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
        write!(out, "  (distance {})", occ.distance)?;
        out.reset()?;
    }

    writeln!(out)
}

/// Position of a byte offset within a multi-line text
#[derive(Debug, PartialEq, Eq)]
struct Location {
    /// 1-based
    line_number: usize,
    /// 1-based, in chars
    column: usize,
    line_start: usize,
    line_end: usize,
}

fn locate(text: &str, offset: usize) -> Location {
    let bytes = text.as_bytes();
    let before = &bytes[..offset];

    let line_start = memchr::memrchr(b'\n', before).map_or(0, |i| i + 1);
    let line_number = memchr::memchr_iter(b'\n', before).count() + 1;
    let mut line_end = memchr::memchr(b'\n', &bytes[offset..]).map_or(text.len(), |i| offset + i);
    if line_end > line_start && bytes[line_end - 1] == b'\r' && line_end - 1 >= offset {
        line_end -= 1;
    }
    let column = text[line_start..offset].chars().count() + 1;

    Location {
        line_number,
        column,
        line_start,
        line_end,
    }
}

/// Print only matching paths (for -l flag)
pub fn print_files_only<W: WriteColor>(out: &mut W, matches: &MatchSet) -> io::Result<()> {
    for path in matches.documents.keys() {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
        writeln!(out, "{}", path)?;
        out.reset()?;
    }
    Ok(())
}

/// Print occurrence count per document (for -c flag)
pub fn print_match_counts<W: WriteColor>(out: &mut W, matches: &MatchSet) -> io::Result<()> {
    for (path, doc_matches) in &matches.documents {
        let count: usize = doc_matches.values().map(Vec::len).sum();
        out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
        write!(out, "{}", path)?;
        out.reset()?;
        write!(out, ":")?;
        out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        writeln!(out, "{}", count)?;
        out.reset()?;
    }
    Ok(())
}

/// Print the match set as pretty JSON
pub fn print_json<W: Write>(out: &mut W, matches: &MatchSet) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, matches)?;
    writeln!(out)
}
