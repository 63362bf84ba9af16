//! Line-oriented interactive search over a loaded index

mod app;

pub use app::{Flow, Session};

use crate::index::types::TextMap;
use crate::output;
use crate::utils::AppConfig;
use anyhow::Result;
use std::io::{self, BufRead, IsTerminal};
use std::path::PathBuf;
use termcolor::WriteColor;

const PROMPT: &str = "> ";

/// Run a session on stdin/stdout until the exit directive or end of input
pub fn run(root: PathBuf, text_map: TextMap, distance: usize, config: &AppConfig) -> Result<()> {
    let mut session = Session::new(root, text_map, distance, config.search_cache_size);
    let stdin = io::stdin();
    let mut out = output::stdout(io::stdout().is_terminal());
    run_with(&mut session, stdin.lock(), &mut out)
}

/// Drive `session` from any line source
pub fn run_with<R: BufRead, W: WriteColor>(
    session: &mut Session,
    input: R,
    out: &mut W,
) -> Result<()> {
    session.print_banner(out)?;

    let mut lines = input.lines();
    loop {
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        let Some(line) = lines.next() else {
            // End of input
            writeln!(out)?;
            break;
        };

        if session.handle_line(&line?, out)? == Flow::Exit {
            break;
        }
    }

    Ok(())
}
