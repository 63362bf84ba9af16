use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser, Subcommand};
use ocidx::index::stats::show_stats;
use ocidx::index::{
    IndexEvent, IndexOptions, IndexOutcome, IndexReporter, IndexStore, Indexer, remove_store,
};
use ocidx::ocr::TesseractCli;
use ocidx::query::{SearchQuery, search};
use ocidx::utils::progress::{ProgressBar, ProgressStyle};
use ocidx::utils::{AppConfig, find_index_root};
use ocidx::{output, session};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "OCIDX_LOG";

#[derive(Parser)]
#[command(name = "ocidx")]
#[command(version, about = "OCR text index and fuzzy search for folders of scanned images")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build or refresh the index for a directory
    Index {
        /// Directory to index
        path: PathBuf,

        /// Worker threads for hashing and OCR (default: config, 0 = all CPUs)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// No progress output
        #[arg(short, long, conflicts_with = "verbose")]
        quiet: bool,

        /// Print one line per visited file
        #[arg(short, long)]
        verbose: bool,
    },
    /// Search indexed text (interactive when no terms are given)
    Search {
        /// Indexed directory (or any directory below it)
        path: PathBuf,

        /// Terms that must all occur; quote a phrase to keep it one term
        terms: Vec<String>,

        /// Maximum edit distance per term
        #[arg(short = 'd', long = "distance", allow_negative_numbers = true)]
        distance: Option<i64>,

        /// Print results as JSON
        #[arg(long, conflicts_with_all = ["files_with_matches", "count"])]
        json: bool,

        /// Print only paths of matching documents
        #[arg(short = 'l', long, conflicts_with = "count")]
        files_with_matches: bool,

        /// Print occurrence counts per matching document
        #[arg(short, long)]
        count: bool,

        /// Index without asking when no index exists
        #[arg(short, long)]
        yes: bool,
    },
    /// Show index statistics
    Stats {
        /// Indexed directory (or any directory below it)
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Remove the index of a directory
    Remove {
        /// Indexed directory (or any directory below it)
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = AppConfig::load()?;

    match command {
        Commands::Index {
            path,
            threads,
            quiet,
            verbose,
        } => {
            let outcome = run_index(&path, threads, quiet, verbose, &config)?;
            if !quiet {
                print_summary(&outcome);
            }
        }
        Commands::Search {
            path,
            terms,
            distance,
            json,
            files_with_matches,
            count,
            yes,
        } => {
            let distance = distance.unwrap_or_else(|| {
                i64::try_from(config.default_max_distance).unwrap_or(i64::MAX)
            });
            let mode = if json {
                OutputMode::Json
            } else if files_with_matches {
                OutputMode::FilesOnly
            } else if count {
                OutputMode::Count
            } else {
                OutputMode::Full
            };
            run_search(&path, terms, distance, mode, yes, &config)?;
        }
        Commands::Stats { path } => {
            show_stats(&path)?;
        }
        Commands::Remove { path } => {
            let root = find_index_root(&path)?;
            if remove_store(&root)? {
                println!("Removed index for: {}", root.display());
            } else {
                println!("No index found for: {}", root.display());
            }
        }
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Progress bar plus optional per-file lines
struct ConsoleReporter {
    pb: ProgressBar,
    verbose: bool,
}

impl ConsoleReporter {
    fn new(quiet: bool, verbose: bool) -> Self {
        let pb = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb.set_message("Running OCR...");
            pb
        };
        Self { pb, verbose }
    }
}

impl IndexReporter for ConsoleReporter {
    fn event(&self, event: &IndexEvent) {
        match event {
            IndexEvent::Failed { path, error } => {
                self.pb.println(format!("failed: {}: {}", path.display(), error));
            }
            _ if self.verbose => {
                let label = match event {
                    IndexEvent::Processing(_) => "ocr",
                    IndexEvent::SkippedUnchanged(_) => "unchanged",
                    IndexEvent::SkippedUnsupported(_) => "unsupported",
                    IndexEvent::Failed { .. } => "failed",
                };
                self.pb
                    .println(format!("{:>11}: {}", label, event.path().display()));
            }
            _ => {}
        }
    }

    fn progress(&self, done: usize, total: usize) {
        self.pb.set_length(total as u64);
        self.pb.set_position(done as u64);
    }
}

fn run_index(
    path: &Path,
    threads: Option<usize>,
    quiet: bool,
    verbose: bool,
    config: &AppConfig,
) -> Result<IndexOutcome> {
    let mut config = config.clone();
    if let Some(threads) = threads {
        config.index_threads = threads;
    }
    let options = IndexOptions {
        threads: config.effective_index_threads(),
        chunk_size: config.chunk_size.max(1),
        cancel: None,
    };
    let indexer = Indexer::with_options(TesseractCli::from_config(&config), options);

    if !quiet {
        println!("Indexing: {}", path.display());
    }

    let reporter = ConsoleReporter::new(quiet, verbose);
    let result = indexer.index_directory(path, &reporter);
    reporter.pb.finish_and_clear();

    result.with_context(|| format!("Failed to index {}", path.display()))
}

fn print_summary(outcome: &IndexOutcome) {
    let s = &outcome.summary;
    let documents = outcome.store.len();
    println!(
        "Indexed {} document{}: {} processed, {} unchanged, {} unsupported, {} failed",
        documents,
        if documents == 1 { "" } else { "s" },
        s.processed,
        s.reused,
        s.unsupported,
        s.failed
    );
    if s.failed > 0 {
        eprintln!("({} files could not be read; see messages above)", s.failed);
    }
}

#[derive(Debug, Clone, Copy)]
enum OutputMode {
    Full,
    FilesOnly,
    Count,
    Json,
}

fn run_search(
    path: &Path,
    terms: Vec<String>,
    distance: i64,
    mode: OutputMode,
    yes: bool,
    config: &AppConfig,
) -> Result<()> {
    // Validate before any indexing work
    let query = SearchQuery::new(terms, distance)?;

    let root = find_index_root(path)?;
    let text_map = match IndexStore::load(&root)? {
        Some(store) => store.text_map(),
        None => {
            let prompt = format!("No index found for {}. Index it now?", root.display());
            if !yes && !confirm(&prompt)? {
                bail!(
                    "No index for {}. Run 'ocidx index {}' first.",
                    root.display(),
                    root.display()
                );
            }
            // Keep stdout clean for machine-readable modes
            let quiet = !matches!(mode, OutputMode::Full);
            let outcome = run_index(&root, None, quiet, false, config)?;
            if !quiet {
                print_summary(&outcome);
            }
            outcome.text_map
        }
    };

    if query.is_empty() {
        return session::run(root, text_map, query.max_distance(), config);
    }

    let matches = search(&text_map, &query);
    match mode {
        OutputMode::Json => output::print_json(&mut io::stdout().lock(), &matches)?,
        OutputMode::FilesOnly => output::print_files_only(&mut stdout(), &matches)?,
        OutputMode::Count => output::print_match_counts(&mut stdout(), &matches)?,
        OutputMode::Full => {
            output::print_match_set(&mut stdout(), &matches, query.terms(), &text_map)?
        }
    }

    Ok(())
}

fn stdout() -> termcolor::StandardStream {
    output::stdout(io::stdout().is_terminal())
}

fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{} [y/N] ", prompt);
    io::stderr().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
