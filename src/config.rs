// Run configuration: route list, API credentials, fallback pricing and pacing.

use chrono::{Days, NaiveDate};
use std::env;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.duffel.com";
pub const DEFAULT_API_VERSION: &str = "v1";
pub const DEFAULT_SNAPSHOT_PATH: &str = "latest_deals.json";
// Fares are rarely sold more than a year out
pub const MAX_DAYS_AHEAD: u32 = 365;
pub const MAX_PACING: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(String),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Invalid airport code: {0}")]
    InvalidAirport(String),

    #[error("Destination listed twice: {0}")]
    DuplicateDestination(String),

    #[error("No destinations configured")]
    NoDestinations,
}

// Fare-search API settings
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: String,
    pub version: String,
    // None keeps the transport's default
    pub timeout: Option<Duration>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token: String::new(),
            version: DEFAULT_API_VERSION.to_string(),
            timeout: None,
        }
    }
}

// Synthetic offer settings
#[derive(Debug, Clone)]
pub struct FallbackConfig {
    pub min_price: u32,
    pub max_price: u32,
    pub currency: String,
}

impl FallbackConfig {
    pub fn price_range(&self) -> RangeInclusive<u32> {
        self.min_price..=self.max_price
    }
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            min_price: 50,
            max_price: 800,
            currency: "EUR".to_string(),
        }
    }
}

/// Everything a hunt needs, read once at process start
#[derive(Debug, Clone)]
pub struct HunterConfig {
    pub api: ApiConfig,
    pub origin: String,
    pub destinations: Vec<String>,
    pub days_ahead: u32,
    pub fallback: FallbackConfig,
    pub pacing: Duration,
    pub max_concurrent_queries: usize,
    pub snapshot_path: PathBuf,
}

impl Default for HunterConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            origin: "LIS".to_string(),
            destinations: ["LHR", "JFK", "CDG", "GRU", "DXB", "MAD", "BCN", "AMS", "FCO", "MIA"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            days_ahead: 45,
            fallback: FallbackConfig::default(),
            pacing: Duration::from_millis(200),
            max_concurrent_queries: 1,
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
        }
    }
}

impl HunterConfig {
    /// Overlays process environment variables on the defaults.
    /// A `.env` file is loaded once by the binary before this runs.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        config.api.token = lookup("DUFFEL_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ConfigError::Missing("DUFFEL_TOKEN".to_string()))?;

        if let Some(url) = lookup("DUFFEL_API_URL") {
            config.api.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(version) = lookup("DUFFEL_VERSION") {
            config.api.version = version;
        }
        if let Some(ms) = lookup("HUNTER_TIMEOUT_MS") {
            config.api.timeout = Some(Duration::from_millis(parse_number("HUNTER_TIMEOUT_MS", &ms)?));
        }
        if let Some(origin) = lookup("HUNTER_ORIGIN") {
            config.origin = origin.trim().to_uppercase();
        }
        if let Some(list) = lookup("HUNTER_DESTINATIONS") {
            config.destinations = list
                .split(',')
                .map(|code| code.trim().to_uppercase())
                .filter(|code| !code.is_empty())
                .collect();
        }
        if let Some(days) = lookup("HUNTER_DAYS_AHEAD") {
            config.days_ahead = parse_number("HUNTER_DAYS_AHEAD", &days)?;
        }
        if let Some(currency) = lookup("HUNTER_CURRENCY") {
            config.fallback.currency = currency.trim().to_uppercase();
        }
        if let Some(ms) = lookup("HUNTER_PACING_MS") {
            config.pacing = Duration::from_millis(parse_number("HUNTER_PACING_MS", &ms)?);
        }
        if let Some(n) = lookup("HUNTER_MAX_CONCURRENCY") {
            config.max_concurrent_queries = parse_number("HUNTER_MAX_CONCURRENCY", &n)?;
        }
        if let Some(path) = lookup("HUNTER_SNAPSHOT_PATH") {
            config.snapshot_path = PathBuf::from(path);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.token.trim().is_empty() {
            return Err(ConfigError::Missing("DUFFEL_TOKEN".to_string()));
        }
        if !is_airport_code(&self.origin) {
            return Err(ConfigError::InvalidAirport(self.origin.clone()));
        }
        if self.destinations.is_empty() {
            return Err(ConfigError::NoDestinations);
        }

        let mut seen = std::collections::HashSet::new();
        for destination in &self.destinations {
            if !is_airport_code(destination) {
                return Err(ConfigError::InvalidAirport(destination.clone()));
            }
            if !seen.insert(destination.as_str()) {
                return Err(ConfigError::DuplicateDestination(destination.clone()));
            }
        }

        if self.fallback.min_price > self.fallback.max_price {
            return Err(ConfigError::InvalidValue {
                key: "fallback price range".to_string(),
                message: format!(
                    "{} is above {}",
                    self.fallback.min_price, self.fallback.max_price
                ),
            });
        }
        if self.days_ahead == 0 || self.days_ahead > MAX_DAYS_AHEAD {
            return Err(ConfigError::InvalidValue {
                key: "HUNTER_DAYS_AHEAD".to_string(),
                message: format!("must be between 1 and {}", MAX_DAYS_AHEAD),
            });
        }
        if self.pacing > MAX_PACING {
            return Err(ConfigError::InvalidValue {
                key: "HUNTER_PACING_MS".to_string(),
                message: format!("must not exceed {} ms", MAX_PACING.as_millis()),
            });
        }
        if self.max_concurrent_queries == 0 {
            return Err(ConfigError::InvalidValue {
                key: "HUNTER_MAX_CONCURRENCY".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Departure date searched on a run started on `today`; `None` past the calendar's end
    pub fn search_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        today.checked_add_days(Days::new(u64::from(self.days_ahead)))
    }
}

pub fn is_airport_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase())
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{}' is not a valid number", raw),
    })
}
