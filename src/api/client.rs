//! HTTP client for the FIPE API
//!
//! This module handles all requests to the remote API, including:
//! - Building the shared HTTP client from configuration
//! - Resolving request paths against the base URL
//! - Classifying every response into a [`FetchOutcome`]
//! - Retrying transient failures when configured

use crate::api::types::{Brand, Model, ModelList, PriceRecord, Year};
use crate::config::ApiConfig;
use crate::FipeError;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Result of a single API fetch
///
/// Failures are never raised to the caller. Anything other than `Found`
/// means "skip this branch"; the variant tells why.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    /// The response decoded successfully
    Found(T),

    /// HTTP 404
    NotFound,

    /// Any other non-success HTTP status
    Status(u16),

    /// Connection refused, timeout, or body read failure
    Transport(String),

    /// The body was not the expected JSON shape
    Decode(String),
}

impl<T> FetchOutcome<T> {
    /// Returns true if the fetch produced a value
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Returns the fetched value, discarding the failure reason
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            _ => None,
        }
    }

    /// Returns true if repeating the request could succeed
    ///
    /// Transport errors and 5xx statuses are transient; 404, other 4xx and
    /// decode errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status(code) => *code >= 500,
            _ => false,
        }
    }

    /// Maps the found value, keeping the failure variants
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> FetchOutcome<U> {
        match self {
            Self::Found(value) => FetchOutcome::Found(f(value)),
            Self::NotFound => FetchOutcome::NotFound,
            Self::Status(code) => FetchOutcome::Status(code),
            Self::Transport(e) => FetchOutcome::Transport(e),
            Self::Decode(e) => FetchOutcome::Decode(e),
        }
    }
}

impl<T> fmt::Display for FetchOutcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(_) => write!(f, "found"),
            Self::NotFound => write!(f, "not found"),
            Self::Status(code) => write!(f, "HTTP {}", code),
            Self::Transport(e) => write!(f, "transport error: {}", e),
            Self::Decode(e) => write!(f, "decode error: {}", e),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use fipe_export::api::build_http_client;
/// use fipe_export::config::ApiConfig;
///
/// let client = build_http_client(&ApiConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &ApiConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `{vehicleType}/marcas`
pub fn brands_path(vehicle_type: &str) -> String {
    format!("{}/marcas", vehicle_type)
}

/// `{vehicleType}/marcas/{brandCode}/modelos`
pub fn models_path(vehicle_type: &str, brand: &Brand) -> String {
    format!("{}/marcas/{}/modelos", vehicle_type, brand.code)
}

/// `{vehicleType}/marcas/{brandCode}/modelos/{modelCode}/anos`
pub fn years_path(vehicle_type: &str, brand: &Brand, model: &Model) -> String {
    format!(
        "{}/marcas/{}/modelos/{}/anos",
        vehicle_type, brand.code, model.code
    )
}

/// `{vehicleType}/marcas/{brandCode}/modelos/{modelCode}/anos/{yearCode}`
pub fn price_path(vehicle_type: &str, brand: &Brand, model: &Model, year: &Year) -> String {
    format!(
        "{}/marcas/{}/modelos/{}/anos/{}",
        vehicle_type, brand.code, model.code, year.code
    )
}

/// Typed client for the FIPE API
///
/// Cheap to share behind an `Arc`; the underlying connection pool is reused
/// by every task.
#[derive(Debug, Clone)]
pub struct FipeClient {
    http: Client,
    base_url: Url,
    max_retries: u32,
    retry_delay: Duration,
}

impl FipeClient {
    /// Creates a client from the API configuration
    ///
    /// The base URL must end with `/` (configuration validation ensures it).
    pub fn new(config: &ApiConfig) -> Result<Self, FipeError> {
        let http = build_http_client(config)?;
        let base_url = Url::parse(&config.base_url)?;

        Ok(Self {
            http,
            base_url,
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    /// The root every request path is resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetches `path` relative to the base URL and decodes it as `T`
    ///
    /// Failures are logged at warn level and returned as the matching
    /// [`FetchOutcome`] variant. Retryable failures are repeated up to the
    /// configured number of times.
    pub async fn fetch<T: DeserializeOwned>(&self, path: &str) -> FetchOutcome<T> {
        let url = match self.base_url.join(path) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(path, "Cannot build request URL: {}", e);
                return FetchOutcome::Transport(format!("invalid URL for '{}': {}", path, e));
            }
        };

        let mut attempt = 0;
        loop {
            let outcome = self.fetch_once(&url).await;

            if outcome.is_found() {
                tracing::trace!(path, "Fetched");
                return outcome;
            }

            if outcome.is_retryable() && attempt < self.max_retries {
                attempt += 1;
                tracing::debug!(
                    path,
                    attempt,
                    max_retries = self.max_retries,
                    "Retrying after {}",
                    outcome
                );
                tokio::time::sleep(self.retry_delay).await;
                continue;
            }

            tracing::warn!(path, "Fetch failed: {}", outcome);
            return outcome;
        }
    }

    async fn fetch_once<T: DeserializeOwned>(&self, url: &Url) -> FetchOutcome<T> {
        let response = match self.http.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::Transport(classify_transport_error(&e)),
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return FetchOutcome::NotFound;
        }
        if !status.is_success() {
            return FetchOutcome::Status(status.as_u16());
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return FetchOutcome::Transport(classify_transport_error(&e)),
        };

        match serde_json::from_str::<T>(&body) {
            Ok(value) => FetchOutcome::Found(value),
            Err(e) => FetchOutcome::Decode(e.to_string()),
        }
    }

    /// Lists the brands for a vehicle type
    pub async fn list_brands(&self, vehicle_type: &str) -> FetchOutcome<Vec<Option<Brand>>> {
        self.fetch(&brands_path(vehicle_type)).await
    }

    /// Lists the models of a brand
    pub async fn list_models(&self, vehicle_type: &str, brand: &Brand) -> FetchOutcome<ModelList> {
        self.fetch(&models_path(vehicle_type, brand)).await
    }

    /// Lists the model years of a (brand, model) pair
    pub async fn list_years(
        &self,
        vehicle_type: &str,
        brand: &Brand,
        model: &Model,
    ) -> FetchOutcome<Vec<Option<Year>>> {
        self.fetch(&years_path(vehicle_type, brand, model)).await
    }

    /// Fetches the price record of a (brand, model, year)
    pub async fn fetch_price(
        &self,
        vehicle_type: &str,
        brand: &Brand,
        model: &Model,
        year: &Year,
    ) -> FetchOutcome<PriceRecord> {
        self.fetch(&price_path(vehicle_type, brand, model, year)).await
    }
}

fn classify_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection refused".to_string()
    } else {
        e.to_string()
    }
}
