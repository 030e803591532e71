//! Error types for the fingerprinting engine and history ledger

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Which side of a comparison a path belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => write!(f, "path 1"),
            Side::B => write!(f, "path 2"),
        }
    }
}

/// Errors that can occur while hashing, comparing, or touching the ledger
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A path failed the validation gate, or a record could not be stored safely
    #[error("{}{reason}", side_prefix(.side))]
    Validation { side: Option<Side>, reason: String },

    /// Filesystem operation failed
    #[error("failed to {op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// History record index out of range
    #[error("history record {index} not found ({len} records)")]
    NotFound { index: usize, len: usize },

    /// No home directory to place the default history file in
    #[error("could not determine a home directory for the history file")]
    NoHomeDir,
}

impl Error {
    pub(crate) fn io(op: &'static str, path: &Path, source: io::Error) -> Self {
        Error::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn validation(side: Option<Side>, reason: impl Into<String>) -> Self {
        Error::Validation {
            side,
            reason: reason.into(),
        }
    }

    /// True for errors caused by bad input rather than the filesystem
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }
}

fn side_prefix(side: &Option<Side>) -> String {
    side.map(|s| format!("{s}: ")).unwrap_or_default()
}

/// Convenience alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_side() {
        let err = Error::validation(Some(Side::B), "does not exist");
        assert_eq!(err.to_string(), "path 2: does not exist");
        assert!(err.is_validation());
    }

    #[test]
    fn test_validation_message_without_side() {
        let err = Error::validation(None, "field contains '|'");
        assert_eq!(err.to_string(), "field contains '|'");
    }

    #[test]
    fn test_io_message_includes_op_and_path() {
        let err = Error::io(
            "open",
            Path::new("/tmp/nope.txt"),
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        let msg = err.to_string();
        assert!(msg.contains("open"));
        assert!(msg.contains("/tmp/nope.txt"));
        assert!(!err.is_validation());
    }

    #[test]
    fn test_no_home_dir_is_not_validation() {
        let err = Error::NoHomeDir;
        assert!(!err.is_validation());
        assert!(err.to_string().contains("home directory"));
    }
}
