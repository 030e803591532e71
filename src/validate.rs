//! Path checks run before any hashing takes place

use crate::error::{Error, Result, Side};
use crate::history::DELIMITER;
use serde::Serialize;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

/// Whether a comparison is between two files or two directory trees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    File,
    Folder,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::File => "File",
            Mode::Folder => "Folder",
        }
    }

    fn expectation(&self) -> &'static str {
        match self {
            Mode::File => "a regular file",
            Mode::Folder => "a directory",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "File" => Ok(Mode::File),
            "Folder" => Ok(Mode::Folder),
            other => Err(format!("unknown mode '{other}'")),
        }
    }
}

/// Check both sides of a comparison; side A is checked first
pub fn validate_pair(mode: Mode, raw_a: &str, raw_b: &str) -> Result<(PathBuf, PathBuf)> {
    let a = check(mode, Some(Side::A), raw_a)?;
    let b = check(mode, Some(Side::B), raw_b)?;
    Ok((a, b))
}

/// Check a single path for hashing on its own
pub fn validate_single(mode: Mode, raw: &str) -> Result<PathBuf> {
    check(mode, None, raw)
}

fn check(mode: Mode, side: Option<Side>, raw: &str) -> Result<PathBuf> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(side, "no path given"));
    }

    if trimmed.contains(DELIMITER) {
        return Err(Error::validation(
            side,
            format!("{trimmed} contains the reserved character '{DELIMITER}'"),
        ));
    }

    let path = PathBuf::from(trimmed);
    let metadata = match std::fs::metadata(&path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::validation(side, format!("{trimmed} does not exist")));
        }
        Err(e) => {
            return Err(Error::validation(side, format!("{trimmed} cannot be accessed: {e}")));
        }
    };

    let matches = match mode {
        Mode::File => metadata.is_file(),
        Mode::Folder => metadata.is_dir(),
    };
    if !matches {
        return Err(Error::validation(
            side,
            format!("{trimmed} is not {}", mode.expectation()),
        ));
    }

    Ok(path)
}
