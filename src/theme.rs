//! Terminal colors for CLI output

use crate::reconcile::Status;
use colored::*;

pub struct Theme;

impl Theme {
    pub fn header(text: &str) -> ColoredString {
        text.bold()
    }

    pub fn primary(text: &str) -> ColoredString {
        text.bold().cyan()
    }

    pub fn muted(text: &str) -> ColoredString {
        text.dimmed()
    }

    pub fn value(text: &str) -> ColoredString {
        text.bold()
    }

    pub fn success(text: &str) -> ColoredString {
        text.green().bold()
    }

    pub fn warning(text: &str) -> ColoredString {
        text.yellow().bold()
    }

    pub fn error(text: &str) -> ColoredString {
        text.red().bold()
    }

    pub fn divider(width: usize) -> ColoredString {
        "─".repeat(width).dimmed()
    }

    pub fn divider_bold(width: usize) -> ColoredString {
        "═".repeat(width).bold()
    }

    /// Status word colored by what it means for integrity
    pub fn status(status: Status) -> ColoredString {
        let word = status.as_str();
        match status {
            Status::Same => word.green(),
            Status::Modified => word.yellow(),
            Status::Missing => word.red(),
            Status::Extra => word.blue(),
        }
    }
}
