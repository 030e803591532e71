//! Comparison history ledger
//!
//! Every completed check is appended to a plain text file, one record per line:
//!
//! ```text
//! 2024-05-01 09:30:00|Folder|/data/a|/data/b|Same:3 Modified:1 Missing:0 Extra:0
//! ```
//!
//! The ledger keeps no state in memory. Each call re-reads or rewrites the
//! file, and nothing guards against two processes writing at once.

use crate::error::{Error, Result};
use crate::reconcile::{Counts, Status};
use crate::validate::Mode;
use chrono::Local;
use directories::ProjectDirs;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Field separator in ledger lines; never allowed inside a field
pub const DELIMITER: char = '|';

/// Format of the first field of every record
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// File name of the ledger inside the data directory
pub const LEDGER_FILE_NAME: &str = "history.txt";

/// Record of a single completed comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRecord {
    /// Local time the comparison finished, `YYYY-MM-DD HH:MM:SS`
    pub timestamp: String,
    /// `File` or `Folder` when written by hashcheck; kept verbatim when read
    pub mode: String,
    pub path_a: String,
    pub path_b: String,
    /// Status word for file mode, formatted counts for folder mode
    pub result: String,
}

impl HistoryRecord {
    /// Create a record stamped with the current local time
    pub fn new(mode: Mode, path_a: &str, path_b: &str, result: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            mode: mode.to_string(),
            path_a: path_a.to_string(),
            path_b: path_b.to_string(),
            result: result.into(),
        }
    }

    /// Record for a file-mode check
    pub fn for_file(path_a: &str, path_b: &str, status: Status) -> Self {
        Self::new(Mode::File, path_a, path_b, status.as_str())
    }

    /// Record for a folder-mode check
    pub fn for_folder(path_a: &str, path_b: &str, counts: &Counts) -> Self {
        Self::new(Mode::Folder, path_a, path_b, counts.to_string())
    }

    fn fields(&self) -> [&str; 5] {
        [
            self.timestamp.as_str(),
            self.mode.as_str(),
            self.path_a.as_str(),
            self.path_b.as_str(),
            self.result.as_str(),
        ]
    }

    /// Serialize to one ledger line, without the terminator
    pub fn to_line(&self) -> Result<String> {
        let fields = self.fields();
        for field in fields {
            if field.contains(DELIMITER) || field.contains('\n') || field.contains('\r') {
                return Err(Error::validation(
                    None,
                    format!("history field '{field}' contains '{DELIMITER}' or a line break"),
                ));
            }
        }
        Ok(self.join_fields())
    }

    /// The mode word as a `Mode`, if it is one hashcheck writes
    pub fn parsed_mode(&self) -> Option<Mode> {
        self.mode.parse().ok()
    }

    fn join_fields(&self) -> String {
        let separator = DELIMITER.to_string();
        self.fields().join(separator.as_str())
    }

    /// Parse one ledger line; `None` unless it splits into five fields
    pub fn parse_line(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.splitn(5, DELIMITER).collect();
        if parts.len() != 5 {
            return None;
        }

        Some(Self {
            timestamp: parts[0].to_string(),
            mode: parts[1].to_string(),
            path_a: parts[2].to_string(),
            path_b: parts[3].to_string(),
            result: parts[4].to_string(),
        })
    }
}

/// Handle to the ledger file
///
/// Constructing a handle touches nothing on disk.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Ledger in the per-user data directory
    pub fn open_default() -> Result<Self> {
        default_ledger_path().map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, leaving existing lines untouched
    pub fn append(&self, record: &HistoryRecord) -> Result<()> {
        let line = record.to_line()?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| Error::io("create history directory", parent, e))?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::io("open history", &self.path, e))?;
        writeln!(file, "{line}").map_err(|e| Error::io("write history", &self.path, e))?;
        file.flush()
            .map_err(|e| Error::io("write history", &self.path, e))?;

        info!(ledger = %self.path.display(), mode = %record.mode, "history record appended");
        Ok(())
    }

    /// Every well-formed record, oldest first
    ///
    /// A missing ledger reads as empty. Malformed lines are skipped.
    pub fn read_all(&self) -> Result<Vec<HistoryRecord>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io("read history", &self.path, e)),
        };
        let content = String::from_utf8_lossy(&bytes);

        let mut records = Vec::new();
        for (number, line) in content.lines().enumerate() {
            match HistoryRecord::parse_line(line) {
                Some(record) => records.push(record),
                None => debug!(line = number + 1, "skipping malformed history line"),
            }
        }
        Ok(records)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read_all()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove the record at `index` (as numbered by `read_all`) and rewrite the ledger
    pub fn delete_one(&self, index: usize) -> Result<HistoryRecord> {
        let mut records = self.read_all()?;
        if index >= records.len() {
            return Err(Error::NotFound {
                index,
                len: records.len(),
            });
        }

        let removed = records.remove(index);
        self.rewrite(&records)?;
        info!(ledger = %self.path.display(), index, "history record deleted");
        Ok(removed)
    }

    /// Remove the ledger file entirely
    pub fn delete_all(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(ledger = %self.path.display(), "history cleared");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io("delete history", &self.path, e)),
        }
    }

    // Records came from read_all, so they are written back exactly as parsed
    fn rewrite(&self, records: &[HistoryRecord]) -> Result<()> {
        let mut content = String::new();
        for record in records {
            content.push_str(&record.join_fields());
            content.push('\n');
        }
        fs::write(&self.path, content).map_err(|e| Error::io("rewrite history", &self.path, e))
    }
}

/// Get the default ledger path
///
/// Location: %APPDATA%\hashcheck\data\history.txt (Windows)
///           ~/.local/share/hashcheck/history.txt (Linux)
///           ~/Library/Application Support/hashcheck/history.txt (macOS)
pub fn default_ledger_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "hashcheck").ok_or(Error::NoHomeDir)?;
    Ok(dirs.data_dir().join(LEDGER_FILE_NAME))
}
