//! stalesweep - find the files worth cleaning up and move them out of the way.
//!
//! Usage:
//!   stalesweep list <SIZE> <SOURCE>          Show up to SIZE bytes of files to clean up
//!   stalesweep move <SIZE> <SOURCE> <DEST>   Move them to DEST after confirmation
//!   stalesweep --help                        Show help

mod parse;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::SystemTime;

use chrono::{DateTime, Local, SecondsFormat, Utc};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use serde_json::{Value, json};
use dialoguer::{Confirm, Input};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use stalesweep_ops::{MoveOptions, move_files_with_progress};
use stalesweep_select::{
    DuplicatePolicy, GlobExcluder, RankedFile, SelectConfig, Selection, Selector,
};

use crate::parse::{format_size, parse_duration, parse_number_ranges, parse_size};

/// Number of spaces between table columns.
const COLUMN_PADDING: usize = 2;

#[derive(Parser)]
#[command(
    name = "stalesweep",
    version,
    about = "Clean up unused files",
    long_about = "stalesweep picks the files in a directory that are most worth cleaning up: \
                  redundant copies of duplicate files first, then the largest files that \
                  have gone unused the longest, up to a byte budget."
)]
struct Cli {
    /// Exclude files that match this glob pattern (repeatable)
    #[arg(long, global = true, value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Exclude files that match the glob patterns in this file, one per line
    #[arg(long, global = true, value_name = "FILE")]
    exclude_from: Option<PathBuf>,

    /// Only include files last accessed at least this long ago (units: h, d, m, y)
    #[arg(short = 't', long, global = true, default_value = "0h", value_name = "TIME")]
    min_time: String,

    /// Don't automatically include duplicate files
    #[arg(long, global = true)]
    no_duplicates: bool,

    /// How included duplicates count against the size budget (the newest copy is always kept)
    #[arg(long, global = true, value_enum, default_value_t = DuplicateMode::AllButNewest)]
    duplicates: DuplicateMode,

    /// Don't count included duplicates against the size budget
    #[arg(long, global = true)]
    no_budget_deduction: bool,

    /// Number of directory listing threads (0 = one per CPU)
    #[arg(short = 'j', long, global = true, default_value_t = 0)]
    threads: usize,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a list of files that should be cleaned up
    List {
        /// Maximum total size of the listed files (e.g. "10GiB")
        size: String,

        /// Directory to clean up
        source: PathBuf,

        /// Print only newline-separated file paths
        #[arg(long)]
        paths_only: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Move files that should be cleaned up, asking for confirmation first
    Move {
        /// Maximum total size of the moved files (e.g. "10GiB")
        size: String,

        /// Directory to clean up
        source: PathBuf,

        /// Directory to move the files into
        dest: PathBuf,

        /// Don't prompt before moving files
        #[arg(long)]
        no_prompt: bool,

        /// Put every file directly in DEST instead of recreating its directories
        #[arg(long)]
        flat: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DuplicateMode {
    /// Charge every included copy
    AllButNewest,
    /// Charge one copy per group, the kept newest one
    NewestOnly,
}

impl From<DuplicateMode> for DuplicatePolicy {
    fn from(mode: DuplicateMode) -> Self {
        match mode {
            DuplicateMode::AllButNewest => DuplicatePolicy::AllButNewest,
            DuplicateMode::NewestOnly => DuplicatePolicy::NewestOnly,
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Command::List {
            size,
            source,
            paths_only,
            format,
        } => run_list(&cli, size, source, *paths_only, *format),
        Command::Move {
            size,
            source,
            dest,
            no_prompt,
            flat,
        } => run_move(&cli, size, source, dest, *no_prompt, *flat),
    }
}

/// Log to stderr. `RUST_LOG` overrides the verbosity flags.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// List the selected files.
fn run_list(
    cli: &Cli,
    size: &str,
    source: &Path,
    paths_only: bool,
    format: OutputFormat,
) -> Result<()> {
    let selection = select_files(cli, size, source)?;

    if paths_only {
        for file in &selection {
            println!("{}", file.record.path.display());
        }
        return Ok(());
    }

    match format {
        OutputFormat::Text => print_table(&mut io::stdout().lock(), &selection.files)?,
        OutputFormat::Json => {
            let entries: Vec<Value> = selection.iter().map(json_entry).collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }
    Ok(())
}

/// Move the selected files, optionally letting the user narrow the list.
fn run_move(
    cli: &Cli,
    size: &str,
    source: &Path,
    dest: &Path,
    no_prompt: bool,
    flat: bool,
) -> Result<()> {
    let selection = select_files(cli, size, source)?;
    if selection.is_empty() {
        println!("0 files moved");
        return Ok(());
    }

    let chosen = if no_prompt {
        selection
    } else {
        let mut stdout = io::stdout().lock();
        print_table(&mut stdout, &selection.files)?;
        drop(stdout);

        let picked = prompt_selection(&selection)?;

        println!();
        print_table(&mut io::stdout().lock(), &picked.files)?;
        println!();
        let confirmed = Confirm::new()
            .with_prompt(format!("Move these {} files?", picked.len()))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("0 files moved");
            return Ok(());
        }
        picked
    };

    let options = MoveOptions {
        preserve_structure: !flat,
    };
    let report = move_files_with_progress(
        &chosen.root,
        &chosen.to_collection(),
        dest,
        &options,
        |progress| {
            if let Some(current) = &progress.current_file {
                debug!(
                    file = %current.display(),
                    done = progress.files_completed,
                    total = progress.files_total,
                    "moving ({:.0}%)",
                    progress.percentage()
                );
            }
        },
    )
    .with_context(|| format!("Failed to move files to {}", dest.display()))?;

    info!(bytes = report.bytes_moved, "moved {}", format_size(report.bytes_moved));
    println!("{}", report.summary());
    Ok(())
}

/// Run the selection pipeline with the global options.
fn select_files(cli: &Cli, size: &str, source: &Path) -> Result<Selection> {
    let budget = parse_size(size)?;
    let min_staleness = parse_duration(&cli.min_time)?;

    let mut patterns: Vec<String> = Vec::new();
    if let Some(file) = &cli.exclude_from {
        let contents = fs::read_to_string(file)
            .with_context(|| format!("Failed to read exclude file {}", file.display()))?;
        patterns.extend(GlobExcluder::read_patterns(&contents).into_iter().map(String::from));
    }
    patterns.extend(cli.exclude.iter().cloned());
    let exclude = GlobExcluder::new(&patterns);

    let config = SelectConfig::builder()
        .root(source)
        .budget(budget)
        .min_staleness(min_staleness)
        .deduplicate(!cli.no_duplicates)
        .duplicate_policy(cli.duplicates)
        .deduct_duplicates(!cli.no_budget_deduction)
        .threads(cli.threads)
        .build()
        .context("Invalid selection settings")?;

    let selector = Selector::new(config);
    let mut progress_rx = selector.scanner().subscribe();
    let progress_logger = thread::spawn(move || {
        loop {
            match progress_rx.blocking_recv() {
                Ok(progress) => info!(
                    generation = progress.generation,
                    files = progress.files_scanned,
                    dirs = progress.dirs_scanned,
                    items = progress.total_items(),
                    pending = progress.pending_dirs,
                    "scanned {} ({:.0} files/s)",
                    format_size(progress.bytes_scanned),
                    progress.files_per_second()
                ),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    let selection = selector
        .select(&exclude)
        .with_context(|| format!("Failed to scan {}", source.display()))?;
    drop(selector);
    if progress_logger.join().is_err() {
        warn!("scan progress logger panicked");
    }

    if !selection.warnings.is_empty() {
        warn!("{} entries could not be read and were skipped", selection.warnings.len());
    }
    Ok(selection)
}

/// Ask for the numbers of the files to keep in the selection until the
/// answer parses. A blank answer keeps everything.
fn prompt_selection(selection: &Selection) -> Result<Selection> {
    println!();
    println!(
        "Select which files to move. You can specify comma-separated ranges of numbers \
         (e.g. '1-9,15,17-20'). Leave blank to select all files."
    );

    loop {
        let answer: String = Input::new()
            .with_prompt(">")
            .allow_empty(true)
            .interact_text()?;

        let ranges = match parse_number_ranges(&answer) {
            Ok(ranges) => ranges,
            Err(err) => {
                eprintln!("{err}");
                continue;
            }
        };
        if ranges.is_empty() {
            return Ok(selection.clone());
        }
        if let Some(range) = ranges
            .iter()
            .find(|r| *r.start() == 0 || *r.end() > selection.len())
        {
            eprintln!(
                "Numbers must be between 1 and {} (got {}-{})",
                selection.len(),
                range.start(),
                range.end()
            );
            continue;
        }

        let ranks: Vec<usize> = ranges.into_iter().flatten().collect();
        match selection.pick(&ranks) {
            Ok(picked) => return Ok(picked),
            Err(err) => eprintln!("{err}"),
        }
    }
}

/// JSON form of a selected file, with timestamps as RFC 3339 strings in UTC.
fn json_entry(file: &RankedFile) -> Value {
    json!({
        "rank": file.rank,
        "duplicate": file.duplicate,
        "path": file.record.path,
        "kind": file.record.kind,
        "size": file.record.size,
        "modified": rfc3339(file.record.modified()),
        "accessed": rfc3339(file.record.accessed()),
    })
}

fn rfc3339(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Print `# | Size | Last Access | Duplicate | Path` as aligned columns.
fn print_table(out: &mut impl Write, files: &[RankedFile]) -> io::Result<()> {
    let header = ["#", "Size", "Last Access", "Duplicate", "Path"].map(String::from);
    let rows: Vec<[String; 5]> = std::iter::once(header)
        .chain(files.iter().map(|file| {
            let accessed: DateTime<Local> = file.record.accessed().into();
            [
                file.rank.to_string(),
                format_size(file.record.size),
                accessed.format("%b %d %Y %H:%M").to_string(),
                if file.duplicate { "Yes" } else { "No" }.to_string(),
                file.record.path.display().to_string(),
            ]
        }))
        .collect();

    let mut widths = [0usize; 4];
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    for row in &rows {
        for (cell, width) in row.iter().zip(widths.iter()) {
            write!(out, "{cell:<width$}", width = width + COLUMN_PADDING)?;
        }
        writeln!(out, "{}", row[4])?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stalesweep_select::FileRecord;
    use stalesweep_core::Timestamps;
    use std::time::Duration;

    fn ranked(rank: usize, path: &str, size: u64, duplicate: bool) -> RankedFile {
        let now = SystemTime::now();
        RankedFile {
            rank,
            duplicate,
            record: FileRecord::file(path, size, Timestamps::new(now, now)),
        }
    }

    #[test]
    fn test_cli_parses_move() {
        let cli = Cli::try_parse_from([
            "stalesweep",
            "-t",
            "1y",
            "--exclude",
            "*.iso",
            "--exclude",
            "/keep",
            "move",
            "10GiB",
            "/src",
            "/dst",
            "--flat",
            "--duplicates",
            "newest-only",
        ])
        .unwrap();

        assert_eq!(cli.min_time, "1y");
        assert_eq!(cli.exclude, vec!["*.iso", "/keep"]);
        assert!(matches!(cli.duplicates, DuplicateMode::NewestOnly));
        match cli.command {
            Command::Move { size, flat, no_prompt, .. } => {
                assert_eq!(size, "10GiB");
                assert!(flat);
                assert!(!no_prompt);
            }
            Command::List { .. } => panic!("expected move"),
        }
    }

    #[test]
    fn test_cli_requires_arguments() {
        assert!(Cli::try_parse_from(["stalesweep", "list", "10G"]).is_err());
        assert!(Cli::try_parse_from(["stalesweep", "move", "10G", "/src"]).is_err());
    }

    #[test]
    fn test_table_columns_align() {
        let files = vec![
            ranked(1, "/r/dup.bin", 2048, true),
            ranked(2, "/r/other.bin", 5, false),
        ];
        let mut out = Vec::new();
        print_table(&mut out, &files).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("#  Size"));
        assert!(lines[0].ends_with("Path"));
        assert!(lines[1].contains("Yes"));
        assert!(lines[2].contains("No"));
        let path_col = lines[0].find("Path").unwrap();
        assert_eq!(lines[1].find("/r/dup.bin"), Some(path_col));
        assert_eq!(lines[2].find("/r/other.bin"), Some(path_col));
    }

    #[test]
    fn test_json_entry_uses_rfc3339_times() {
        let accessed = SystemTime::UNIX_EPOCH + Duration::from_secs(86_400);
        let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(90_061);
        let file = RankedFile {
            rank: 3,
            duplicate: true,
            record: FileRecord::file("/r/dup.bin", 7, Timestamps::new(modified, accessed)),
        };

        let entry = json_entry(&file);
        assert_eq!(entry["rank"], 3);
        assert_eq!(entry["duplicate"], true);
        assert_eq!(entry["path"], "/r/dup.bin");
        assert_eq!(entry["size"], 7);
        assert_eq!(entry["accessed"], "1970-01-02T00:00:00Z");
        assert_eq!(entry["modified"], "1970-01-02T01:01:01Z");
    }
}
