//! Configuration module for fipe-export
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Every section is optional; missing values fall back to defaults.
//!
//! # Example
//!
//! ```no_run
//! use fipe_export::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("fipe.toml")).unwrap();
//! println!("Writing spreadsheets to: {}", config.output.directory);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ApiConfig, Config, OutputConfig, WalkerConfig, DEFAULT_BASE_URL};

// Re-export parser functions
pub use parser::{
    compute_config_hash, default_config, load_config, load_config_with_hash, parse_config,
};
