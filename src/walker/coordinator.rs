//! Hierarchy walker - traversal orchestration
//!
//! This module drives the brand → model → year → price record traversal:
//! - One task per brand, gated by a semaphore
//! - Sequential model and year iteration inside a brand
//! - One batch per (brand, model) handed to the record sink

use crate::api::{Brand, FetchOutcome, FipeClient, Model, PriceRecord};
use crate::output::{AppendOutcome, RecordSink};
use crate::walker::stats::{WalkStats, WalkSummary};
use crate::FipeError;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::Instrument;

/// Walks the FIPE hierarchy for one vehicle type
#[derive(Clone)]
pub struct Walker {
    client: Arc<FipeClient>,
    sink: Arc<dyn RecordSink>,
    vehicle_type: String,
    limiter: Arc<Semaphore>,
    stats: Arc<WalkStats>,
}

impl Walker {
    /// Creates a walker
    ///
    /// # Arguments
    ///
    /// * `client` - Shared API client
    /// * `sink` - Destination for finished (brand, model) batches
    /// * `vehicle_type` - Path prefix for every request
    /// * `max_concurrent_brands` - How many brand subtrees run at once (min 1)
    pub fn new(
        client: Arc<FipeClient>,
        sink: Arc<dyn RecordSink>,
        vehicle_type: impl Into<String>,
        max_concurrent_brands: usize,
    ) -> Self {
        Self {
            client,
            sink,
            vehicle_type: vehicle_type.into(),
            limiter: Arc::new(Semaphore::new(max_concurrent_brands.max(1))),
            stats: Arc::new(WalkStats::new()),
        }
    }

    /// The vehicle type being walked
    pub fn vehicle_type(&self) -> &str {
        &self.vehicle_type
    }

    /// Live counters for this walker
    pub fn stats(&self) -> &WalkStats {
        &self.stats
    }

    /// Runs the complete traversal
    ///
    /// Returns once every brand task has finished. Branch-level failures
    /// are logged and counted, never returned.
    ///
    /// # Returns
    ///
    /// * `Ok(WalkSummary)` - The walk finished (possibly with no brands)
    /// * `Err(FipeError)` - The brand list itself could not be fetched
    pub async fn run(&self) -> Result<WalkSummary, FipeError> {
        let started_at = Utc::now();
        tracing::info!("Listing brands for '{}'", self.vehicle_type);

        let brands: Vec<Brand> = match self.client.list_brands(&self.vehicle_type).await {
            FetchOutcome::Found(brands) => brands.into_iter().flatten().collect(),
            failure => {
                self.stats.fetch_failed();
                return Err(FipeError::BrandListUnavailable {
                    vehicle_type: self.vehicle_type.clone(),
                    reason: failure.to_string(),
                });
            }
        };

        if brands.is_empty() {
            tracing::info!("No brands found for '{}', nothing to do", self.vehicle_type);
            return Ok(self.summary(started_at));
        }

        tracing::info!(
            "Found {} brands, processing up to {} at a time",
            brands.len(),
            self.limiter.available_permits()
        );
        self.stats.add_brands(brands.len() as u64);

        let mut tasks = Vec::with_capacity(brands.len());
        for brand in brands {
            let walker = self.clone();
            let span = tracing::info_span!("brand", code = %brand.code, name = %brand.name);

            tasks.push(tokio::spawn(
                async move {
                    let _permit = match walker.limiter.clone().acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => {
                            tracing::error!("Brand limiter closed, skipping brand");
                            return;
                        }
                    };
                    walker.walk_brand(&brand).await;
                }
                .instrument(span),
            ));
        }

        for task in tasks {
            if let Err(e) = task.await {
                tracing::error!("Brand task failed: {}", e);
            }
        }

        let summary = self.summary(started_at);
        tracing::info!(
            "Walk finished: {} files written, {} rows, {} failed fetches",
            summary.counts.files_written,
            summary.counts.rows_written,
            summary.counts.fetch_failures
        );
        Ok(summary)
    }

    async fn walk_brand(&self, brand: &Brand) {
        tracing::info!("Fetching models");

        let models = match self.client.list_models(&self.vehicle_type, brand).await {
            FetchOutcome::Found(list) => list.models,
            failure => {
                self.stats.fetch_failed();
                tracing::debug!("Abandoning brand: {}", failure);
                return;
            }
        };

        for model in models.into_iter().flatten() {
            let span = tracing::info_span!("model", code = %model.code, name = %model.name);
            self.walk_model(brand, &model).instrument(span).await;
        }

        self.stats.brand_completed();
        tracing::info!("Brand finished");
    }

    async fn walk_model(&self, brand: &Brand, model: &Model) {
        self.stats.model_visited();
        tracing::debug!("Fetching years");

        let years = match self.client.list_years(&self.vehicle_type, brand, model).await {
            FetchOutcome::Found(years) => years,
            failure => {
                self.stats.fetch_failed();
                tracing::debug!("Abandoning model: {}", failure);
                return;
            }
        };

        if years.is_empty() {
            tracing::debug!("No years listed, skipping model");
            return;
        }

        let mut batch: Vec<PriceRecord> = Vec::with_capacity(years.len());
        for year in years.into_iter().flatten() {
            self.stats.year_visited();
            match self
                .client
                .fetch_price(&self.vehicle_type, brand, model, &year)
                .await
            {
                FetchOutcome::Found(record) => {
                    self.stats.record_fetched();
                    batch.push(record);
                }
                _ => self.stats.fetch_failed(),
            }
        }

        self.flush(batch).await;
    }

    /// Hands a finished (brand, model) batch to the sink
    ///
    /// Batches where every price fetch failed are skipped; partial batches
    /// are written with the records that did arrive.
    async fn flush(&self, batch: Vec<PriceRecord>) {
        if batch.is_empty() {
            self.stats.batch_skipped();
            tracing::warn!("No price records fetched, no spreadsheet written");
            return;
        }

        let sink = Arc::clone(&self.sink);
        let result = tokio::task::spawn_blocking(move || sink.append(&batch)).await;

        match result {
            Ok(Ok(AppendOutcome::Written {
                path,
                rows_written,
                created,
                ..
            })) => {
                self.stats.batch_written(rows_written as u64, created);
                tracing::info!(
                    "{} {} ({} rows)",
                    if created { "Created" } else { "Appended to" },
                    path.display(),
                    rows_written
                );
            }
            Ok(Ok(AppendOutcome::Skipped)) => {
                self.stats.batch_skipped();
            }
            Ok(Err(e)) => {
                self.stats.write_failed();
                tracing::error!("Failed to write spreadsheet: {}", e);
            }
            Err(e) => {
                self.stats.write_failed();
                tracing::error!("Spreadsheet writer task failed: {}", e);
            }
        }
    }

    fn summary(&self, started_at: chrono::DateTime<Utc>) -> WalkSummary {
        WalkSummary {
            vehicle_type: self.vehicle_type.clone(),
            started_at,
            finished_at: Utc::now(),
            counts: self.stats.snapshot(),
        }
    }
}
