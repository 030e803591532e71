//! Classify every path of two fingerprints as Same, Modified, Missing or Extra

use crate::digest::Digest;
use crate::tree::{RelativePath, TreeFingerprint};
use serde::Serialize;
use std::fmt;

/// Outcome for one relative path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Status {
    /// Present on both sides with identical content
    Same,
    /// Present on both sides with different content
    Modified,
    /// Present under root A only
    Missing,
    /// Present under root B only
    Extra,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Same => "Same",
            Status::Modified => "Modified",
            Status::Missing => "Missing",
            Status::Extra => "Extra",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedEntry {
    pub path: RelativePath,
    pub status: Status,
}

/// Per-status totals of a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub same: usize,
    pub modified: usize,
    pub missing: usize,
    pub extra: usize,
}

impl Counts {
    fn bump(&mut self, status: Status) {
        match status {
            Status::Same => self.same += 1,
            Status::Modified => self.modified += 1,
            Status::Missing => self.missing += 1,
            Status::Extra => self.extra += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.same + self.modified + self.missing + self.extra
    }
}

impl fmt::Display for Counts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Same:{} Modified:{} Missing:{} Extra:{}",
            self.same, self.modified, self.missing, self.extra
        )
    }
}

/// Ordered classification of every path from one comparison
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComparisonReport {
    pub entries: Vec<ClassifiedEntry>,
    pub counts: Counts,
}

impl ComparisonReport {
    fn push(&mut self, path: RelativePath, status: Status) {
        self.counts.bump(status);
        self.entries.push(ClassifiedEntry { path, status });
    }

    /// True when nothing was modified, missing or extra
    pub fn is_identical(&self) -> bool {
        self.counts.same == self.counts.total()
    }

    pub fn entries_with(&self, status: Status) -> impl Iterator<Item = &ClassifiedEntry> {
        self.entries.iter().filter(move |e| e.status == status)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Compare two tree fingerprints
///
/// Entries for A's paths (Same, Modified, Missing) come first, then Extra
/// entries for paths only in B. Each group is in relative-path order.
pub fn reconcile(a: &TreeFingerprint, b: &TreeFingerprint) -> ComparisonReport {
    let mut report = ComparisonReport::default();

    for (path, digest_a) in a.iter() {
        let status = match b.get(path) {
            None => Status::Missing,
            Some(digest_b) if digest_b == digest_a => Status::Same,
            Some(_) => Status::Modified,
        };
        report.push(path.clone(), status);
    }

    for path in b.keys() {
        if !a.contains(path) {
            report.push(path.clone(), Status::Extra);
        }
    }

    report
}

/// Compare two single-file digests
///
/// Produces exactly one entry, named `name`. Missing and Extra cannot occur
/// here since both files were validated to exist.
pub fn compare_digests(name: RelativePath, a: &Digest, b: &Digest) -> ComparisonReport {
    let mut report = ComparisonReport::default();
    let status = if a == b { Status::Same } else { Status::Modified };
    report.push(name, status);
    report
}
