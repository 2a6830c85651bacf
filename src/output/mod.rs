//! Output module for exporting price records
//!
//! This module handles:
//! - Naming output files after the fipe code, brand and model
//! - Writing and appending `.xlsx` spreadsheets
//! - The sink interface the walker hands finished batches to

mod filename;
mod sheet;
mod traits;

pub use filename::{output_file_name, sanitize_file_component, UNSAFE_FILE_NAME_CHARS};
pub use sheet::{record_row, sheet_name_for, SheetWriter, HEADER};
pub use traits::{AppendOutcome, OutputError, OutputResult, RecordSink};
