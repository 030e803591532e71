//! hashcheck library crate
//!
//! SHA-256 fingerprints of files and directory trees, a reconciler that
//! classifies every path of two fingerprints, and an append-only history of
//! past comparisons. The `hashcheck` binary is a thin front end over this API.

pub mod cli;
pub mod compare;
pub mod config;
pub mod digest;
pub mod error;
pub mod export;
pub mod history;
pub mod logging;
pub mod output;
pub mod progress;
pub mod reconcile;
pub mod theme;
pub mod tree;
pub mod validate;

pub use compare::{check, compare, fingerprint, CheckOutcome, CompareOptions, Comparison, Fingerprint};
pub use digest::{digest_file, Digest, EMPTY_DIGEST};
pub use error::{Error, Result, Side};
pub use export::export_delimited;
pub use history::{HistoryRecord, Ledger};
pub use reconcile::{reconcile, ClassifiedEntry, ComparisonReport, Counts, Status};
pub use tree::{collect_tree, CollectOptions, RelativePath, TreeFingerprint};
pub use validate::Mode;
