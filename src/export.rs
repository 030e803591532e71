//! Comma-separated export of comparison reports and history
//!
//! Values are written as-is. A field that itself contains a comma shifts the
//! columns of its row; nothing is quoted or escaped.

use crate::error::{Error, Result};
use crate::history::HistoryRecord;
use crate::reconcile::ComparisonReport;
use crate::validate::Mode;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Separator between fields
pub const FIELD_DELIMITER: &str = ",";

/// Terminator written after every line
#[cfg(windows)]
pub const LINE_TERMINATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_TERMINATOR: &str = "\n";

pub const HISTORY_COLUMNS: [&str; 5] = ["Date & Time", "Mode", "Path 1", "Path 2", "Result"];

/// Write a header line and one line per row to `dest`
pub fn export_delimited<R, S>(rows: &[R], columns: &[&str], dest: &Path) -> Result<()>
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let file = File::create(dest).map_err(|e| Error::io("create", dest, e))?;
    let mut writer = BufWriter::new(file);

    write_delimited(&mut writer, rows, columns).map_err(|e| Error::io("write", dest, e))?;
    writer.flush().map_err(|e| Error::io("write", dest, e))
}

/// Same layout as `export_delimited`, into any writer
pub fn write_delimited<W, R, S>(writer: &mut W, rows: &[R], columns: &[&str]) -> std::io::Result<()>
where
    W: Write,
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    writer.write_all(columns.join(FIELD_DELIMITER).as_bytes())?;
    writer.write_all(LINE_TERMINATOR.as_bytes())?;

    for row in rows {
        for (i, field) in row.as_ref().iter().enumerate() {
            if i > 0 {
                writer.write_all(FIELD_DELIMITER.as_bytes())?;
            }
            writer.write_all(field.as_ref().as_bytes())?;
        }
        writer.write_all(LINE_TERMINATOR.as_bytes())?;
    }

    Ok(())
}

/// Column names and rows for a comparison report
pub fn report_table(report: &ComparisonReport, mode: Mode) -> (Vec<&'static str>, Vec<Vec<String>>) {
    let columns = match mode {
        Mode::File => vec!["File", "Status"],
        Mode::Folder => vec!["File Path", "Status"],
    };
    let rows = report
        .entries
        .iter()
        .map(|entry| vec![entry.path.to_string(), entry.status.to_string()])
        .collect();
    (columns, rows)
}

/// Column names and rows for ledger records
pub fn history_table(records: &[HistoryRecord]) -> (Vec<&'static str>, Vec<Vec<String>>) {
    let rows = records
        .iter()
        .map(|r| {
            vec![
                r.timestamp.clone(),
                r.mode.clone(),
                r.path_a.clone(),
                r.path_b.clone(),
                r.result.clone(),
            ]
        })
        .collect();
    (HISTORY_COLUMNS.to_vec(), rows)
}

/// Export a report to `dest`
pub fn export_report(report: &ComparisonReport, mode: Mode, dest: &Path) -> Result<()> {
    let (columns, rows) = report_table(report, mode);
    export_delimited(&rows, &columns, dest)
}

/// Export ledger records to `dest`
pub fn export_history(records: &[HistoryRecord], dest: &Path) -> Result<()> {
    let (columns, rows) = history_table(records);
    export_delimited(&rows, &columns, dest)
}
