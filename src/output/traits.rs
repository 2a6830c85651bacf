//! Output sink trait and types
//!
//! This module defines the interface the walker hands finished
//! (brand, model) batches to, and the associated error types.

use crate::api::PriceRecord;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Unexpected spreadsheet layout: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Spreadsheet write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Spreadsheet read error: {0}")]
    Read(#[from] calamine::XlsxError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// What happened to a batch handed to a sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Rows were written
    Written {
        /// File the rows landed in
        path: PathBuf,
        /// Number of data rows written
        rows_written: usize,
        /// Zero-based row index of the first new row
        first_row: u32,
        /// True if the file was created by this call
        created: bool,
    },

    /// The batch held no records; nothing was written
    Skipped,
}

/// Destination for finished (brand, model) batches
///
/// Implementations must be safe to call from several brand tasks at once.
pub trait RecordSink: Send + Sync {
    /// Appends a batch of records belonging to one (brand, model) pair
    ///
    /// An empty batch must return [`AppendOutcome::Skipped`] without side
    /// effects.
    fn append(&self, records: &[PriceRecord]) -> OutputResult<AppendOutcome>;
}
