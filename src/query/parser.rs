use crate::error::{Error, Result};

/// Directive that ends an interactive session
pub const EXIT_DIRECTIVE: &str = "exit()";

/// One line of interactive input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Search for all of these terms
    Search(Vec<String>),
    /// Change the edit-distance bound (`:distance N`)
    SetDistance(usize),
    /// Print the current bound (`:distance`)
    ShowDistance,
    /// Print directive help (`:help`)
    Help,
    /// Leave the session (`exit()`, `:q`)
    Exit,
    /// Blank line
    Empty,
}

/// Parse one line of session input
pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();

    if line.is_empty() {
        return Ok(Command::Empty);
    }
    if line == EXIT_DIRECTIVE {
        return Ok(Command::Exit);
    }

    let Some(directive) = line.strip_prefix(':') else {
        return Ok(Command::Search(parse_terms(line)));
    };

    let (name, arg) = match directive.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (directive, ""),
    };

    match name {
        "q" | "quit" => Ok(Command::Exit),
        "h" | "help" => Ok(Command::Help),
        "d" | "distance" if arg.is_empty() => Ok(Command::ShowDistance),
        "d" | "distance" => parse_distance(arg).map(Command::SetDistance),
        _ => Err(Error::InvalidArgument(format!(
            "unknown directive ':{}' (try :help)",
            name
        ))),
    }
}

/// Parse a non-negative edit distance
pub fn parse_distance(input: &str) -> Result<usize> {
    let value: i64 = input
        .trim()
        .parse()
        .map_err(|_| Error::InvalidArgument(format!("'{}' is not a number", input.trim())))?;

    usize::try_from(value).map_err(|_| {
        Error::InvalidArgument(format!("distance must be non-negative, got {}", value))
    })
}

/// Split a line into terms. Whitespace separates terms; a double-quoted run
/// is a single term with the quotes removed.
pub fn parse_terms(input: &str) -> Vec<String> {
    TermParser::new(input).collect()
}

struct TermParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> TermParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.pos += ch.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn parse_phrase(&mut self) -> &'a str {
        self.advance(); // opening quote
        let start = self.pos;
        while self.peek_char().is_some_and(|ch| ch != '"') {
            self.advance();
        }
        let phrase = &self.input[start..self.pos];
        self.advance(); // closing quote, if any
        phrase
    }

    fn parse_word(&mut self) -> &'a str {
        let start = self.pos;
        while self
            .peek_char()
            .is_some_and(|ch| !ch.is_whitespace() && ch != '"')
        {
            self.advance();
        }
        &self.input[start..self.pos]
    }
}

impl Iterator for TermParser<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            self.skip_whitespace();
            let term = match self.peek_char()? {
                '"' => self.parse_phrase(),
                _ => self.parse_word(),
            };
            // `""` yields nothing
            if !term.is_empty() {
                return Some(term.to_string());
            }
        }
    }
}
