//! Walker module for the FIPE hierarchy traversal
//!
//! This module contains the core traversal logic, including:
//! - Bounded per-brand fan-out
//! - Sequential model/year/price fetching within a brand
//! - Batching records per (brand, model) for the output sink
//! - Run statistics

mod coordinator;
pub mod stats;

pub use coordinator::Walker;
pub use stats::{print_summary, WalkCounts, WalkStats, WalkSummary};

use crate::api::FipeClient;
use crate::config::Config;
use crate::output::{RecordSink, SheetWriter};
use crate::FipeError;
use std::sync::Arc;

/// Runs a complete export for one vehicle type
///
/// Builds the API client and spreadsheet writer from `config` and walks
/// every brand.
///
/// # Example
///
/// ```no_run
/// use fipe_export::config::default_config;
/// use fipe_export::walker::export;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = default_config()?;
/// let summary = export(&config, "carros").await?;
/// println!("{} files written", summary.counts.files_written);
/// # Ok(())
/// # }
/// ```
pub async fn export(config: &Config, vehicle_type: &str) -> Result<WalkSummary, FipeError> {
    let client = Arc::new(FipeClient::new(&config.api)?);
    let writer = SheetWriter::new(&config.output.directory, vehicle_type);
    tracing::debug!("Spreadsheets go to {}", writer.directory().display());
    let sink: Arc<dyn RecordSink> = Arc::new(writer);

    let walker = Walker::new(
        client,
        sink,
        vehicle_type,
        config.walker.max_concurrent_brands as usize,
    );
    walker.run().await
}
