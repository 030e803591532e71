use clap::{ArgAction, Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;

use crate::compare::{self, CompareOptions};
use crate::config::Config;
use crate::export;
use crate::history::Ledger;
use crate::output::{self, OutputMode};
use crate::progress;
use crate::theme::Theme;
use crate::tree::RelativePath;
use crate::validate::Mode;
use anyhow::Context;
use serde::Serialize;

/// Exit code when a check completes and the two sides differ
pub const EXIT_DIFFERENT: u8 = 1;

#[derive(Parser)]
#[command(name = "hashcheck")]
#[command(version)]
#[command(about = "Verify file and folder integrity with SHA-256 fingerprints")]
#[command(long_about = "hashcheck fingerprints files and directory trees with SHA-256 and \
    reports which files are unchanged, modified, missing or new.\n\n\
    Examples:\n  \
    hashcheck hash --folder ./release           # List digests of every file\n  \
    hashcheck check a.iso b.iso                  # Compare two files\n  \
    hashcheck check --folder ./v1 ./v2 --csv out.csv  # Compare trees, save a report\n  \
    hashcheck history list                       # Review past checks")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase output verbosity (-v, -vv for more)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Use this history file instead of the configured one
    #[arg(long, value_name = "PATH", global = true)]
    pub history_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the SHA-256 digest of a file, or of every file under a folder
    #[command(visible_alias = "h")]
    Hash {
        /// File or folder to fingerprint
        #[arg(value_name = "PATH")]
        path: String,

        /// Treat PATH as a folder and hash every file under it
        #[arg(short = 'f', long)]
        folder: bool,

        /// Hash one file at a time instead of on all cores
        #[arg(long)]
        sequential: bool,

        /// Output results as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Compare two files or two folders and record the result
    #[command(visible_alias = "c")]
    Check {
        /// Reference file or folder
        #[arg(value_name = "PATH_1")]
        path_a: String,

        /// File or folder to verify against the reference
        #[arg(value_name = "PATH_2")]
        path_b: String,

        /// Compare two folders instead of two files
        #[arg(short = 'f', long)]
        folder: bool,

        /// Hash one file at a time instead of on all cores
        #[arg(long)]
        sequential: bool,

        /// Output results as JSON for scripting
        #[arg(long)]
        json: bool,

        /// Also write the report as CSV to this file
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,

        /// Don't record this check in the history
        #[arg(long)]
        no_history: bool,
    },

    /// Review, export or prune past checks
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Show every recorded check
    #[command(visible_alias = "ls")]
    List {
        /// Output results as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Delete one record by the index shown in `history list`
    #[command(visible_alias = "rm")]
    Delete {
        #[arg(value_name = "INDEX")]
        index: usize,
    },

    /// Delete all history
    Clear {
        /// Skip confirmation prompt
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },

    /// Write the history to a CSV file
    Export {
        #[arg(value_name = "FILE")]
        dest: PathBuf,
    },
}

#[derive(Serialize)]
struct JsonHistory<'a> {
    records: &'a [crate::history::HistoryRecord],
}

fn mode_for(folder: bool) -> Mode {
    if folder {
        Mode::Folder
    } else {
        Mode::File
    }
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Run the selected command, returning the process exit code
    pub fn run(self) -> anyhow::Result<u8> {
        let output_mode = OutputMode::from_flags(self.verbose, self.quiet);
        let mut config = Config::load();

        match self.command {
            Commands::Hash { path, folder, sequential, json } => {
                config.apply_cli_overrides(self.history_file, false, sequential);
                let mode = mode_for(folder);
                let options = config.compare_options();

                let spinner = if output_mode == OutputMode::Quiet || json {
                    progress::hidden()
                } else {
                    progress::create_spinner("Hashing...")
                };
                let result = compare::fingerprint_with_progress(
                    mode,
                    &path,
                    &options,
                    &|file: &RelativePath| spinner.set_message(format!("Hashing {file}")),
                );
                progress::finish_and_clear(&spinner);
                let fingerprint = result?;

                if json {
                    output::print_json(&fingerprint)?;
                } else {
                    output::print_listing(&fingerprint, output_mode);
                }
                Ok(0)
            }
            Commands::Check { path_a, path_b, folder, sequential, json, csv, no_history } => {
                config.apply_cli_overrides(self.history_file, no_history, sequential);
                let mode = mode_for(folder);
                let options: CompareOptions = config.compare_options();
                let ledger = if config.history.enabled {
                    Some(config.ledger()?)
                } else {
                    None
                };

                let spinner = if output_mode == OutputMode::Quiet || json {
                    progress::hidden()
                } else {
                    progress::create_spinner("Checking integrity...")
                };
                let result = compare::check_with_progress(
                    mode,
                    &path_a,
                    &path_b,
                    &options,
                    ledger.as_ref(),
                    &|file: &RelativePath| spinner.set_message(format!("Hashing {file}")),
                );
                progress::finish_and_clear(&spinner);
                let outcome = result?;

                if json {
                    output::print_json(&outcome.comparison)?;
                } else {
                    output::print_report(&outcome.comparison, output_mode);
                }

                if ledger.is_some() && !outcome.recorded && output_mode != OutputMode::Quiet {
                    eprintln!(
                        "{} this check could not be saved to history",
                        Theme::warning("Warning:")
                    );
                }

                if let Some(dest) = csv {
                    export::export_report(&outcome.comparison.report, mode, &dest)
                        .with_context(|| format!("Failed to export CSV report to {}", dest.display()))?;
                    if output_mode != OutputMode::Quiet && !json {
                        println!("{} {}", Theme::success("CSV exported:"), dest.display());
                    }
                }

                Ok(if outcome.comparison.is_identical() { 0 } else { EXIT_DIFFERENT })
            }
            Commands::History { action } => {
                config.apply_cli_overrides(self.history_file, false, false);
                let ledger = config.ledger()?;
                run_history(action, &ledger, output_mode)?;
                Ok(0)
            }
        }
    }
}

fn run_history(action: HistoryAction, ledger: &Ledger, mode: OutputMode) -> anyhow::Result<()> {
    match action {
        HistoryAction::List { json } => {
            let records = ledger.read_all()?;
            if json {
                output::print_json(&JsonHistory { records: &records })?;
            } else {
                output::print_history(&records, mode);
            }
        }
        HistoryAction::Delete { index } => {
            let removed = ledger.delete_one(index)?;
            if mode != OutputMode::Quiet {
                println!(
                    "{} {} {} → {}",
                    Theme::success("Deleted:"),
                    removed.timestamp,
                    removed.path_a,
                    removed.path_b
                );
            }
        }
        HistoryAction::Clear { yes } => {
            let count = ledger.len()?;
            if count == 0 {
                if mode != OutputMode::Quiet {
                    println!("{}", Theme::muted("No history found."));
                }
                return Ok(());
            }

            if !yes {
                print!(
                    "Delete all {} history records? [y/N]: ",
                    Theme::value(&count.to_string())
                );
                io::stdout().flush()?;

                let mut input = String::new();
                io::stdin().read_line(&mut input)?;

                if !input.trim().eq_ignore_ascii_case("y") {
                    println!("{}", Theme::muted("Cancelled."));
                    return Ok(());
                }
            }

            ledger.delete_all()?;
            if mode != OutputMode::Quiet {
                println!("{}", Theme::success("All history deleted."));
            }
        }
        HistoryAction::Export { dest } => {
            let records = ledger.read_all()?;
            export::export_history(&records, &dest)
                .with_context(|| format!("Failed to export history to {}", dest.display()))?;
            if mode != OutputMode::Quiet {
                println!(
                    "{} {} records to {}",
                    Theme::success("Exported"),
                    records.len(),
                    dest.display()
                );
            }
        }
    }
    Ok(())
}
