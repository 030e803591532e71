//! End-to-end checks: validate, fingerprint both sides, reconcile, record

use crate::digest::Digest;
use crate::error::Result;
use crate::history::{HistoryRecord, Ledger};
use crate::reconcile::{compare_digests, reconcile, ComparisonReport};
use crate::tree::{collect_tree_with_progress, CollectOptions, RelativePath, TreeFingerprint};
use crate::validate::{validate_pair, validate_single, Mode};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct CompareOptions {
    pub collect: CollectOptions,
}

/// Fingerprint of one side: a single digest or a whole tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Fingerprint {
    File { path: PathBuf, digest: Digest },
    Folder { root: PathBuf, tree: TreeFingerprint },
}

impl Fingerprint {
    /// The digest alone for a file, `path : digest` lines for a tree
    pub fn listing(&self) -> String {
        match self {
            Fingerprint::File { digest, .. } => format!("{digest}\n"),
            Fingerprint::Folder { tree, .. } => tree.listing(),
        }
    }

    pub fn file_count(&self) -> usize {
        match self {
            Fingerprint::File { .. } => 1,
            Fingerprint::Folder { tree, .. } => tree.len(),
        }
    }
}

/// Everything produced by one comparison
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub mode: Mode,
    pub path_a: PathBuf,
    pub path_b: PathBuf,
    #[serde(skip)]
    pub fingerprint_a: Fingerprint,
    #[serde(skip)]
    pub fingerprint_b: Fingerprint,
    pub report: ComparisonReport,
}

impl Comparison {
    pub fn is_identical(&self) -> bool {
        self.report.is_identical()
    }

    /// Ledger record summarising this comparison
    pub fn history_record(&self) -> HistoryRecord {
        let path_a = self.path_a.to_string_lossy();
        let path_b = self.path_b.to_string_lossy();

        match self.mode {
            Mode::Folder => HistoryRecord::for_folder(&path_a, &path_b, &self.report.counts),
            Mode::File => {
                let status = self
                    .report
                    .entries
                    .first()
                    .map(|e| e.status.as_str())
                    .unwrap_or_default();
                HistoryRecord::new(Mode::File, &path_a, &path_b, status)
            }
        }
    }
}

/// Result of `check`: the comparison plus whether it reached the ledger
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub comparison: Comparison,
    pub recorded: bool,
}

/// Validate and fingerprint a single path
pub fn fingerprint(mode: Mode, raw_path: &str, options: &CompareOptions) -> Result<Fingerprint> {
    fingerprint_with_progress(mode, raw_path, options, &|_: &RelativePath| {})
}

pub fn fingerprint_with_progress<F>(
    mode: Mode,
    raw_path: &str,
    options: &CompareOptions,
    on_file: &F,
) -> Result<Fingerprint>
where
    F: Fn(&RelativePath) + Sync,
{
    let path = validate_single(mode, raw_path)?;
    fingerprint_validated(mode, path, options, on_file)
}

fn fingerprint_validated<F>(
    mode: Mode,
    path: PathBuf,
    options: &CompareOptions,
    on_file: &F,
) -> Result<Fingerprint>
where
    F: Fn(&RelativePath) + Sync,
{
    match mode {
        Mode::File => {
            let digest = Digest::of_file(&path)?;
            Ok(Fingerprint::File { path, digest })
        }
        Mode::Folder => {
            let tree = collect_tree_with_progress(&path, &options.collect, on_file)?;
            Ok(Fingerprint::Folder { root: path, tree })
        }
    }
}

/// Compare two files or two trees
///
/// Both paths pass the validation gate before anything is read.
pub fn compare(mode: Mode, raw_a: &str, raw_b: &str, options: &CompareOptions) -> Result<Comparison> {
    compare_with_progress(mode, raw_a, raw_b, options, &|_: &RelativePath| {})
}

pub fn compare_with_progress<F>(
    mode: Mode,
    raw_a: &str,
    raw_b: &str,
    options: &CompareOptions,
    on_file: &F,
) -> Result<Comparison>
where
    F: Fn(&RelativePath) + Sync,
{
    let (path_a, path_b) = validate_pair(mode, raw_a, raw_b)?;
    debug!(%mode, a = %path_a.display(), b = %path_b.display(), "comparing");

    let (fingerprint_a, fingerprint_b, report) = match mode {
        Mode::File => {
            let digest_a = Digest::of_file(&path_a)?;
            let digest_b = Digest::of_file(&path_b)?;
            let report = compare_digests(file_label(&path_a), &digest_a, &digest_b);
            (
                Fingerprint::File { path: path_a.clone(), digest: digest_a },
                Fingerprint::File { path: path_b.clone(), digest: digest_b },
                report,
            )
        }
        Mode::Folder => {
            let tree_a = collect_tree_with_progress(&path_a, &options.collect, on_file)?;
            let tree_b = collect_tree_with_progress(&path_b, &options.collect, on_file)?;
            let report = reconcile(&tree_a, &tree_b);
            (
                Fingerprint::Folder { root: path_a.clone(), tree: tree_a },
                Fingerprint::Folder { root: path_b.clone(), tree: tree_b },
                report,
            )
        }
    };

    Ok(Comparison {
        mode,
        path_a,
        path_b,
        fingerprint_a,
        fingerprint_b,
        report,
    })
}

/// Compare, then append the outcome to `ledger` if one is given
///
/// A failed append is logged and reported through `recorded`; it never
/// fails the comparison itself.
pub fn check(
    mode: Mode,
    raw_a: &str,
    raw_b: &str,
    options: &CompareOptions,
    ledger: Option<&Ledger>,
) -> Result<CheckOutcome> {
    check_with_progress(mode, raw_a, raw_b, options, ledger, &|_: &RelativePath| {})
}

pub fn check_with_progress<F>(
    mode: Mode,
    raw_a: &str,
    raw_b: &str,
    options: &CompareOptions,
    ledger: Option<&Ledger>,
    on_file: &F,
) -> Result<CheckOutcome>
where
    F: Fn(&RelativePath) + Sync,
{
    let comparison = compare_with_progress(mode, raw_a, raw_b, options, on_file)?;

    let recorded = match ledger {
        Some(ledger) => match ledger.append(&comparison.history_record()) {
            Ok(()) => true,
            Err(e) => {
                warn!(ledger = %ledger.path().display(), error = %e, "could not record comparison in history");
                false
            }
        },
        None => false,
    };

    Ok(CheckOutcome {
        comparison,
        recorded,
    })
}

fn file_label(path: &Path) -> RelativePath {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    RelativePath::new(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Side};
    use crate::reconcile::{Counts, Status};
    use std::fs;
    use tempfile::TempDir;

    fn s(path: &Path) -> &str {
        path.to_str().unwrap()
    }

    fn two_trees() -> (TempDir, PathBuf, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a");
        let b = temp_dir.path().join("b");
        fs::create_dir_all(a.join("sub")).unwrap();
        fs::create_dir_all(b.join("sub")).unwrap();

        fs::write(a.join("same.txt"), "same").unwrap();
        fs::write(b.join("same.txt"), "same").unwrap();
        fs::write(a.join("sub").join("changed.txt"), "before").unwrap();
        fs::write(b.join("sub").join("changed.txt"), "after").unwrap();
        fs::write(a.join("gone.txt"), "gone").unwrap();
        fs::write(b.join("sub").join("new.txt"), "new").unwrap();

        (temp_dir, a, b)
    }

    #[test]
    fn test_folder_comparison() {
        let (_temp_dir, a, b) = two_trees();
        let comparison = compare(Mode::Folder, s(&a), s(&b), &CompareOptions::default()).unwrap();

        let entries: Vec<(&str, Status)> = comparison
            .report
            .entries
            .iter()
            .map(|e| (e.path.as_str(), e.status))
            .collect();
        assert_eq!(
            entries,
            vec![
                ("gone.txt", Status::Missing),
                ("same.txt", Status::Same),
                ("sub/changed.txt", Status::Modified),
                ("sub/new.txt", Status::Extra),
            ]
        );
        assert_eq!(
            comparison.report.counts,
            Counts { same: 1, modified: 1, missing: 1, extra: 1 }
        );
        assert!(!comparison.is_identical());
    }

    #[test]
    fn test_file_comparison() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("report.txt");
        let b = temp_dir.path().join("copy.txt");
        fs::write(&a, "content").unwrap();
        fs::write(&b, "content").unwrap();

        let comparison = compare(Mode::File, s(&a), s(&b), &CompareOptions::default()).unwrap();
        assert!(comparison.is_identical());
        assert_eq!(comparison.report.entries[0].path.as_str(), "report.txt");

        fs::write(&b, "tampered").unwrap();
        let comparison = compare(Mode::File, s(&a), s(&b), &CompareOptions::default()).unwrap();
        assert_eq!(comparison.report.entries[0].status, Status::Modified);
        assert_eq!(comparison.history_record().result, "Modified");
    }

    #[test]
    fn test_check_records_history() {
        let (temp_dir, a, b) = two_trees();
        let ledger = Ledger::new(temp_dir.path().join("history.txt"));

        let outcome = check(
            Mode::Folder,
            s(&a),
            s(&b),
            &CompareOptions::default(),
            Some(&ledger),
        )
        .unwrap();
        assert!(outcome.recorded);

        let records = ledger.read_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].parsed_mode(), Some(Mode::Folder));
        assert_eq!(records[0].path_a, s(&a));
        assert_eq!(records[0].path_b, s(&b));
        assert_eq!(records[0].result, "Same:1 Modified:1 Missing:1 Extra:1");
    }

    #[test]
    fn test_validation_failure_has_no_side_effects() {
        let (temp_dir, a, _b) = two_trees();
        let ledger = Ledger::new(temp_dir.path().join("history.txt"));
        let missing = temp_dir.path().join("missing");

        for mode in [Mode::File, Mode::Folder] {
            let err = check(
                mode,
                s(&a),
                s(&missing),
                &CompareOptions::default(),
                Some(&ledger),
            )
            .unwrap_err();
            assert!(err.is_validation());
        }

        let hashed = std::sync::atomic::AtomicUsize::new(0);
        let err = check_with_progress(
            Mode::Folder,
            s(&missing),
            s(&a),
            &CompareOptions::default(),
            Some(&ledger),
            &|_: &RelativePath| {
                hashed.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation { side: Some(Side::A), .. }));

        assert_eq!(hashed.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert!(!ledger.path().exists());
    }

    #[test]
    fn test_ledger_failure_does_not_fail_check() {
        let (temp_dir, a, b) = two_trees();
        // A directory where the ledger file should be makes every append fail
        let blocked = temp_dir.path().join("blocked");
        fs::create_dir(&blocked).unwrap();
        let ledger = Ledger::new(&blocked);

        let outcome = check(
            Mode::Folder,
            s(&a),
            s(&b),
            &CompareOptions::default(),
            Some(&ledger),
        )
        .unwrap();
        assert!(!outcome.recorded);
        assert_eq!(outcome.comparison.report.counts.total(), 4);
    }

    #[test]
    fn test_check_without_ledger() {
        let (_temp_dir, a, b) = two_trees();
        let outcome = check(Mode::Folder, s(&a), s(&b), &CompareOptions::default(), None).unwrap();
        assert!(!outcome.recorded);
    }

    #[test]
    fn test_fingerprint_single_path() {
        let (_temp_dir, a, _b) = two_trees();
        let tree = fingerprint(Mode::Folder, s(&a), &CompareOptions::default()).unwrap();
        assert_eq!(tree.file_count(), 3);
        assert!(tree.listing().contains("sub/changed.txt : "));

        let file = fingerprint(Mode::File, s(&a.join("same.txt")), &CompareOptions::default())
            .unwrap();
        assert_eq!(file.listing(), format!("{}\n", Digest::of_bytes(b"same")));

        let err = fingerprint(Mode::File, s(&a), &CompareOptions::default()).unwrap_err();
        assert!(err.is_validation());
    }
}
