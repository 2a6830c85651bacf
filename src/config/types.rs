use serde::Deserialize;

/// Default FIPE API root
pub const DEFAULT_BASE_URL: &str = "https://parallelum.com.br/fipe/api/v1/";

/// Main configuration structure for fipe-export
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub walker: WalkerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Remote API access configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    /// Root URL every request path is joined onto
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// User-Agent header sent with each request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Total request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Extra attempts for transport errors and 5xx responses
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Delay between retry attempts (milliseconds)
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: format!("fipe-export/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            max_retries: 0,
            retry_delay_ms: 1000,
        }
    }
}

/// Traversal configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WalkerConfig {
    /// Vehicle type to walk (carros, motos, caminhoes)
    #[serde(rename = "vehicle-type")]
    pub vehicle_type: Option<String>,

    /// Maximum number of brands processed at the same time
    #[serde(rename = "max-concurrent-brands")]
    pub max_concurrent_brands: u32,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            vehicle_type: None,
            max_concurrent_brands: 4,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory the spreadsheets are written to
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "Excel".to_string(),
        }
    }
}
