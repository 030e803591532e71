use crate::compare::{Comparison, Fingerprint};
use crate::history::HistoryRecord;
use crate::reconcile::Status;
use crate::theme::Theme;
use serde::Serialize;

/// Output verbosity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Quiet,       // Only errors
    Normal,      // Standard output
    Verbose,     // Same entries too
    VeryVerbose, // Digest listings of both sides as well
}

impl OutputMode {
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            OutputMode::Quiet
        } else if verbose >= 2 {
            OutputMode::VeryVerbose
        } else if verbose == 1 {
            OutputMode::Verbose
        } else {
            OutputMode::Normal
        }
    }
}

#[derive(Serialize)]
struct JsonEnvelope<'a, T: Serialize> {
    version: &'static str,
    timestamp: String,
    #[serde(flatten)]
    body: &'a T,
}

/// Print any result as pretty JSON with version and timestamp fields
pub fn print_json<T: Serialize>(body: &T) -> anyhow::Result<()> {
    let envelope = JsonEnvelope {
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Local::now().to_rfc3339(),
        body,
    };
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

/// Print the digest listing of one path
pub fn print_listing(fingerprint: &Fingerprint, mode: OutputMode) {
    if mode == OutputMode::Quiet {
        return;
    }

    match fingerprint {
        Fingerprint::File { path, digest } => {
            println!("{}  {}", digest, Theme::muted(&path.display().to_string()));
        }
        Fingerprint::Folder { root, tree } => {
            println!();
            println!("{}", Theme::header(&root.display().to_string()));
            println!("{}", Theme::divider(60));
            print!("{}", tree.listing());
            println!("{}", Theme::divider(60));
            println!(
                "{} {}",
                Theme::value(&tree.len().to_string()),
                Theme::muted("files hashed")
            );
        }
    }
}

/// Print a comparison as a table of paths and statuses
///
/// Same entries are listed only in verbose modes; counts are always shown.
pub fn print_report(comparison: &Comparison, mode: OutputMode) {
    if mode == OutputMode::Quiet {
        return;
    }

    let report = &comparison.report;
    println!();
    println!("{}", Theme::header("Integrity Check"));
    println!("{}", Theme::divider_bold(60));
    println!("{} {}", Theme::muted("Path 1:"), comparison.path_a.display());
    println!("{} {}", Theme::muted("Path 2:"), comparison.path_b.display());
    println!();
    println!("{:<10} {}", Theme::primary("Status"), Theme::primary("File Path"));
    println!("{}", Theme::divider(60));

    let show_same = mode != OutputMode::Normal;
    for entry in &report.entries {
        if entry.status == Status::Same && !show_same {
            continue;
        }
        // Pad the plain word; padding a ColoredString counts escape codes
        let pad = " ".repeat(10usize.saturating_sub(entry.status.as_str().len()));
        println!("{}{} {}", Theme::status(entry.status), pad, entry.path);
    }

    let hidden_same = if show_same { 0 } else { report.counts.same };
    if hidden_same > 0 {
        println!(
            "{}",
            Theme::muted(&format!("({} unchanged files hidden, use -v to list)", hidden_same))
        );
    }

    println!("{}", Theme::divider(60));
    println!(
        "{} {}  {} {}  {} {}  {} {}",
        Theme::status(Status::Same),
        Theme::value(&report.counts.same.to_string()),
        Theme::status(Status::Modified),
        Theme::value(&report.counts.modified.to_string()),
        Theme::status(Status::Missing),
        Theme::value(&report.counts.missing.to_string()),
        Theme::status(Status::Extra),
        Theme::value(&report.counts.extra.to_string()),
    );

    if report.is_identical() {
        println!("{}", Theme::success("No differences found."));
    } else {
        println!("{}", Theme::warning("Differences found."));
    }

    if mode == OutputMode::VeryVerbose {
        println!();
        println!("{}", Theme::primary("Path 1 digests"));
        print!("{}", comparison.fingerprint_a.listing());
        println!("{}", Theme::primary("Path 2 digests"));
        print!("{}", comparison.fingerprint_b.listing());
    }
}

/// Print ledger records with the index `history delete` expects
pub fn print_history(records: &[HistoryRecord], mode: OutputMode) {
    if mode == OutputMode::Quiet {
        return;
    }

    if records.is_empty() {
        println!("{}", Theme::muted("No history found."));
        return;
    }

    println!();
    println!(
        "{:>4}  {:<19}  {:<6}  {}",
        Theme::primary("#"),
        Theme::primary("Date & Time"),
        Theme::primary("Mode"),
        Theme::primary("Result")
    );
    println!("{}", Theme::divider(80));

    for (index, record) in records.iter().enumerate() {
        println!(
            "{:>4}  {:<19}  {:<6}  {}",
            index, record.timestamp, record.mode.as_str(), record.result
        );
        println!("      {} {}", Theme::muted("1:"), record.path_a);
        println!("      {} {}", Theme::muted("2:"), record.path_b);
    }

    println!("{}", Theme::divider(80));
    println!(
        "{} {}",
        Theme::value(&records.len().to_string()),
        Theme::muted("records")
    );
}
