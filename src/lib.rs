//! fipe-export: FIPE price table exporter
//!
//! This crate walks the FIPE vehicle-pricing API (vehicle type → brand →
//! model → year → price record) and exports the collected records into
//! `.xlsx` spreadsheets, one file per brand/model.

pub mod api;
pub mod config;
pub mod output;
pub mod walker;

use thiserror::Error;

/// Main error type for fipe-export operations
#[derive(Debug, Error)]
pub enum FipeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Could not list brands for vehicle type '{vehicle_type}': {reason}")]
    BrandListUnavailable {
        vehicle_type: String,
        reason: String,
    },

    #[error("Invalid vehicle type: {0}")]
    InvalidVehicleType(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for fipe-export operations
pub type Result<T> = std::result::Result<T, FipeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use api::{Brand, FetchOutcome, FipeClient, Model, PriceRecord, Year};
pub use config::Config;
pub use output::{AppendOutcome, RecordSink, SheetWriter};
pub use walker::{Walker, WalkSummary};
