//! FIPE API access
//!
//! This module contains everything needed to talk to the remote API:
//! - Typed records for brands, models, years and price records
//! - A client that classifies every response into a [`FetchOutcome`]
//! - Vehicle type parsing

mod client;
mod types;
mod vehicle;

pub use client::{
    brands_path, build_http_client, models_path, price_path, years_path, FetchOutcome, FipeClient,
};
pub use types::{Brand, Model, ModelList, PriceRecord, Year};
pub use vehicle::{is_known_vehicle_type, parse_vehicle_type, KNOWN_VEHICLE_TYPES};
