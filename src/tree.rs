//! Directory tree fingerprinting
//!
//! Walks a root directory and maps every regular file, keyed by its path
//! relative to the root, to the SHA-256 digest of its content.
//!
//! Symlinks are never followed and never become entries (the root itself is
//! resolved if it is a symlink). Sockets, FIFOs and devices are skipped.
//! The first unreadable directory or file aborts the whole collection.

use crate::digest::Digest;
use crate::error::{Error, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// A file location relative to a comparison root, always `/`-separated
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RelativePath(String);

impl RelativePath {
    /// Wrap an already-relative, `/`-separated path (leading separators are dropped)
    pub fn new(path: impl AsRef<str>) -> Self {
        Self(path.as_ref().trim_start_matches('/').to_string())
    }

    /// Strip `root` from `path` and join the remaining components with `/`
    ///
    /// Returns `None` if `path` is not under `root` or equals it.
    pub fn from_root(root: &Path, path: &Path) -> Option<Self> {
        let stripped = path.strip_prefix(root).ok()?;
        let parts: Vec<String> = stripped
            .components()
            .filter_map(|component| match component {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        if parts.is_empty() {
            return None;
        }
        Some(Self(parts.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RelativePath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// Every regular file under one root, mapped to its digest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TreeFingerprint {
    entries: BTreeMap<RelativePath, Digest>,
}

impl TreeFingerprint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &RelativePath) -> Option<&Digest> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &RelativePath) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in relative-path order
    pub fn iter(&self) -> impl Iterator<Item = (&RelativePath, &Digest)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &RelativePath> {
        self.entries.keys()
    }

    /// One `path : digest` line per file
    pub fn listing(&self) -> String {
        let mut out = String::new();
        for (path, digest) in &self.entries {
            out.push_str(&format!("{} : {}\n", path, digest));
        }
        out
    }
}

impl FromIterator<(RelativePath, Digest)> for TreeFingerprint {
    fn from_iter<I: IntoIterator<Item = (RelativePath, Digest)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Knobs for a collection pass
#[derive(Debug, Clone, Copy)]
pub struct CollectOptions {
    /// Hash files on the rayon pool instead of one at a time
    pub parallel: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self { parallel: true }
    }
}

/// Fingerprint every regular file under `root` with default options
pub fn collect_tree(root: &Path) -> Result<TreeFingerprint> {
    collect_tree_with(root, &CollectOptions::default())
}

/// Fingerprint every regular file under `root`
pub fn collect_tree_with(root: &Path, options: &CollectOptions) -> Result<TreeFingerprint> {
    collect_tree_with_progress(root, options, &|_: &RelativePath| {})
}

/// Fingerprint every regular file under `root`, calling `on_file` before each digest
///
/// With `parallel` set, `on_file` runs on rayon worker threads in no
/// particular order. The returned fingerprint is the same either way.
pub fn collect_tree_with_progress<F>(
    root: &Path,
    options: &CollectOptions,
    on_file: &F,
) -> Result<TreeFingerprint>
where
    F: Fn(&RelativePath) + Sync,
{
    let files = list_files(root)?;
    debug!(
        root = %root.display(),
        files = files.len(),
        parallel = options.parallel,
        "hashing tree"
    );

    let hash_one = |(relative, path): (RelativePath, PathBuf)| -> Result<(RelativePath, Digest)> {
        on_file(&relative);
        let digest = Digest::of_file(&path)?;
        Ok((relative, digest))
    };

    let digests: Vec<(RelativePath, Digest)> = if options.parallel {
        files.into_par_iter().map(hash_one).collect::<Result<Vec<_>>>()?
    } else {
        files.into_iter().map(hash_one).collect::<Result<Vec<_>>>()?
    };

    Ok(digests.into_iter().collect())
}

/// Enumerate regular files under `root` in file-name order
fn list_files(root: &Path) -> Result<Vec<(RelativePath, PathBuf)>> {
    let metadata = std::fs::metadata(root).map_err(|e| Error::io("read directory", root, e))?;
    if !metadata.is_dir() {
        return Err(Error::io(
            "read directory",
            root,
            io::Error::new(io::ErrorKind::Other, "not a directory"),
        ));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| walk_error(root, e))?;

        if !entry.file_type().is_file() {
            continue;
        }

        if let Some(relative) = RelativePath::from_root(root, entry.path()) {
            files.push((relative, entry.into_path()));
        }
    }

    Ok(files)
}

fn walk_error(root: &Path, err: walkdir::Error) -> Error {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    let source = err
        .into_io_error()
        .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "filesystem loop detected"));
    Error::Io {
        op: "read directory",
        path,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn sample_tree() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "alpha").unwrap();
        fs::create_dir(temp_dir.path().join("sub")).unwrap();
        fs::write(temp_dir.path().join("sub").join("b.txt"), "bravo").unwrap();
        temp_dir
    }

    #[test]
    fn test_collect_tree_completeness() {
        let temp_dir = sample_tree();
        let fingerprint = collect_tree(temp_dir.path()).unwrap();

        let keys: Vec<&str> = fingerprint.keys().map(RelativePath::as_str).collect();
        assert_eq!(keys, vec!["a.txt", "sub/b.txt"]);
        assert_eq!(
            fingerprint.get(&RelativePath::new("a.txt")),
            Some(&Digest::of_bytes(b"alpha"))
        );
        assert_eq!(
            fingerprint.get(&RelativePath::new("sub/b.txt")),
            Some(&Digest::of_bytes(b"bravo"))
        );
    }

    #[test]
    fn test_directories_are_not_entries() {
        let temp_dir = sample_tree();
        fs::create_dir_all(temp_dir.path().join("empty").join("nested")).unwrap();

        let fingerprint = collect_tree(temp_dir.path()).unwrap();
        assert_eq!(fingerprint.len(), 2);
        assert!(!fingerprint.contains(&RelativePath::new("empty")));
    }

    #[test]
    fn test_empty_root_gives_empty_fingerprint() {
        let temp_dir = TempDir::new().unwrap();
        let fingerprint = collect_tree(temp_dir.path()).unwrap();
        assert!(fingerprint.is_empty());
        assert_eq!(fingerprint.listing(), "");
    }

    #[test]
    fn test_missing_root_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = collect_tree(&temp_dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_file_root_is_io_error() {
        let temp_dir = sample_tree();
        let err = collect_tree(&temp_dir.path().join("a.txt")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let temp_dir = TempDir::new().unwrap();
        for i in 0..40 {
            let dir = temp_dir.path().join(format!("d{}", i % 5));
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(format!("f{i}.bin")), vec![i as u8; i * 100]).unwrap();
        }

        let sequential =
            collect_tree_with(temp_dir.path(), &CollectOptions { parallel: false }).unwrap();
        let parallel =
            collect_tree_with(temp_dir.path(), &CollectOptions { parallel: true }).unwrap();
        assert_eq!(sequential, parallel);
        assert_eq!(sequential.len(), 40);
        assert_eq!(sequential.listing(), parallel.listing());
    }

    #[test]
    fn test_repeated_collection_is_stable() {
        let temp_dir = sample_tree();
        let first = collect_tree(temp_dir.path()).unwrap();
        let second = collect_tree(temp_dir.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_listing_format() {
        let temp_dir = sample_tree();
        let fingerprint = collect_tree(temp_dir.path()).unwrap();
        let listing = fingerprint.listing();
        let lines: Vec<&str> = listing.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], format!("a.txt : {}", Digest::of_bytes(b"alpha")));
        assert!(lines[1].starts_with("sub/b.txt : "));
    }

    #[test]
    fn test_progress_called_once_per_file() {
        let temp_dir = sample_tree();
        let seen = AtomicUsize::new(0);
        collect_tree_with_progress(temp_dir.path(), &CollectOptions::default(), &|_: &RelativePath| {
            seen.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_skipped() {
        let temp_dir = sample_tree();
        std::os::unix::fs::symlink(
            temp_dir.path().join("a.txt"),
            temp_dir.path().join("link.txt"),
        )
        .unwrap();
        std::os::unix::fs::symlink(temp_dir.path().join("sub"), temp_dir.path().join("linkdir"))
            .unwrap();

        let fingerprint = collect_tree(temp_dir.path()).unwrap();
        let keys: Vec<&str> = fingerprint.keys().map(RelativePath::as_str).collect();
        assert_eq!(keys, vec!["a.txt", "sub/b.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_aborts_collection() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = sample_tree();
        let locked = temp_dir.path().join("sub").join("b.txt");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not stop root
        if fs::File::open(&locked).is_ok() {
            return;
        }

        for parallel in [false, true] {
            let err = collect_tree_with(temp_dir.path(), &CollectOptions { parallel }).unwrap_err();
            match err {
                Error::Io { path, source, .. } => {
                    assert_eq!(path, locked);
                    assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
                }
                other => panic!("expected io error, got {other:?}"),
            }
        }

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_aborts_collection() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = sample_tree();
        let locked = temp_dir.path().join("sub");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = collect_tree(temp_dir.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        match result.unwrap_err() {
            Error::Io { path, .. } => assert_eq!(path, locked),
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn test_relative_path_from_root() {
        let root = Path::new("/data/root");
        assert_eq!(
            RelativePath::from_root(root, &root.join("x").join("y.txt")),
            Some(RelativePath::new("x/y.txt"))
        );
        assert_eq!(RelativePath::from_root(root, root), None);
        assert_eq!(RelativePath::from_root(root, Path::new("/elsewhere/y.txt")), None);
        assert_eq!(RelativePath::new("/lead.txt").as_str(), "lead.txt");
    }
}
