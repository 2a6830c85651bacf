//! Run statistics
//!
//! Brand tasks update shared atomic counters; a [`WalkSummary`] snapshot is
//! taken when the walk finishes and printed for the operator.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by every brand task
#[derive(Debug, Default)]
pub struct WalkStats {
    brands: AtomicU64,
    brands_completed: AtomicU64,
    models: AtomicU64,
    years: AtomicU64,
    records_fetched: AtomicU64,
    fetch_failures: AtomicU64,
    batches_skipped: AtomicU64,
    files_created: AtomicU64,
    files_written: AtomicU64,
    rows_written: AtomicU64,
    write_failures: AtomicU64,
}

/// Point-in-time copy of [`WalkStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkCounts {
    /// Brands listed for the vehicle type
    pub brands: u64,
    /// Brand tasks that finished their subtree
    pub brands_completed: u64,
    /// Models visited
    pub models: u64,
    /// Years visited
    pub years: u64,
    /// Price records fetched successfully
    pub records_fetched: u64,
    /// Fetches of any level that did not produce a value
    pub fetch_failures: u64,
    /// (brand, model) batches with no records
    pub batches_skipped: u64,
    /// Files created by this run
    pub files_created: u64,
    /// Batches written (created or appended)
    pub files_written: u64,
    /// Data rows written
    pub rows_written: u64,
    /// Batches the sink failed to write
    pub write_failures: u64,
}

impl WalkStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_brands(&self, count: u64) {
        self.brands.fetch_add(count, Ordering::Relaxed);
    }

    pub fn brand_completed(&self) {
        self.brands_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn model_visited(&self) {
        self.models.fetch_add(1, Ordering::Relaxed);
    }

    pub fn year_visited(&self) {
        self.years.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetched(&self) {
        self.records_fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fetch_failed(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn batch_skipped(&self) {
        self.batches_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn batch_written(&self, rows: u64, created: bool) {
        self.files_written.fetch_add(1, Ordering::Relaxed);
        self.rows_written.fetch_add(rows, Ordering::Relaxed);
        if created {
            self.files_created.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn write_failed(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Copies the current counter values
    pub fn snapshot(&self) -> WalkCounts {
        WalkCounts {
            brands: self.brands.load(Ordering::Relaxed),
            brands_completed: self.brands_completed.load(Ordering::Relaxed),
            models: self.models.load(Ordering::Relaxed),
            years: self.years.load(Ordering::Relaxed),
            records_fetched: self.records_fetched.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            batches_skipped: self.batches_skipped.load(Ordering::Relaxed),
            files_created: self.files_created.load(Ordering::Relaxed),
            files_written: self.files_written.load(Ordering::Relaxed),
            rows_written: self.rows_written.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        }
    }
}

/// Result of one complete walk
#[derive(Debug, Clone)]
pub struct WalkSummary {
    pub vehicle_type: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub counts: WalkCounts,
}

impl WalkSummary {
    /// Wall-clock duration of the walk in seconds
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    /// Share of price fetches that produced a record, as a percentage
    pub fn price_success_rate(&self) -> f64 {
        if self.counts.years == 0 {
            return 0.0;
        }
        (self.counts.records_fetched as f64 / self.counts.years as f64) * 100.0
    }
}

/// Prints a walk summary to stdout
pub fn print_summary(summary: &WalkSummary) {
    println!("=== FIPE Export Summary ===\n");

    println!("Run:");
    println!("  Vehicle type: {}", summary.vehicle_type);
    println!("  Started: {}", summary.started_at.to_rfc3339());
    println!("  Finished: {}", summary.finished_at.to_rfc3339());
    println!("  Duration: {} seconds", summary.duration_seconds());
    println!();

    let c = &summary.counts;
    println!("Traversal:");
    println!("  Brands: {} ({} completed)", c.brands, c.brands_completed);
    println!("  Models: {}", c.models);
    println!("  Years: {}", c.years);
    println!(
        "  Price records: {} ({:.1}% of years)",
        c.records_fetched,
        summary.price_success_rate()
    );
    println!("  Failed fetches: {}", c.fetch_failures);
    println!();

    println!("Output:");
    println!("  Files written: {} ({} new)", c.files_written, c.files_created);
    println!("  Rows written: {}", c.rows_written);
    println!("  Batches skipped: {}", c.batches_skipped);
    if c.write_failures > 0 {
        println!("  Write failures: {}", c.write_failures);
    }
}
