use crate::error::{Result, SurfaceError};
use dotenv::dotenv;
use serde::Deserialize;
use std::env;

/// Configuration for the upstream contracts API
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// API key sent with every contracts request
    pub api_key: String,
    /// Base URL of the reference-data API
    pub base_url: String,
    /// Per-request timeout in seconds; the fetch is otherwise unbounded
    pub request_timeout_secs: u64,
}

/// Color scheme for surface and point-cloud colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    Rainbow,
    Heatmap,
    Monochrome,
}

impl ColorScheme {
    fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "rainbow" => Ok(ColorScheme::Rainbow),
            "heatmap" => Ok(ColorScheme::Heatmap),
            "monochrome" => Ok(ColorScheme::Monochrome),
            other => Err(SurfaceError::ConfigError(format!(
                "Unknown color scheme: {}",
                other
            ))),
        }
    }
}

/// Tunables for one pipeline invocation.
///
/// Passed explicitly into the generator, binner and mapper; no stage reads
/// ambient state.
#[derive(Debug, Clone, Deserialize)]
pub struct SurfaceConfig {
    /// Underlying ticker symbol
    pub symbol: String,
    /// Expiry window in days for the contracts fetch
    pub expiry_range_days: u32,
    /// Risk-free rate used by the pricing model
    pub risk_free_rate: f64,
    /// Contract multiplier for gamma exposure scaling
    pub contract_multiplier: u32,
    /// Base implied volatility of the synthetic smile
    pub base_iv: f64,
    /// Grid resolution along the strike axis
    pub strike_resolution: usize,
    /// Grid resolution along the days-to-expiry axis
    pub days_resolution: usize,
    /// Express strikes relative to the spot estimate (scaled to 100)
    pub normalize_strikes: bool,
    /// Height the maximum IV maps to in mesh coordinates
    pub surface_height: f64,
    /// Color scheme for mesh and point-cloud colors
    pub color_scheme: ColorScheme,
    /// Seed for the synthetic randomness; `None` seeds from the OS
    pub rng_seed: Option<u64>,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            symbol: "AAPL".to_string(),
            expiry_range_days: 90,
            risk_free_rate: 0.035,
            contract_multiplier: 100,
            base_iv: 0.3,
            strike_resolution: 50,
            days_resolution: 20,
            normalize_strikes: false,
            surface_height: 100.0,
            color_scheme: ColorScheme::Rainbow,
            rng_seed: None,
        }
    }
}

impl SurfaceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(SurfaceError::ConfigError("symbol must not be empty".into()));
        }
        if self.expiry_range_days == 0 {
            return Err(SurfaceError::ConfigError(
                "expiry_range_days must be positive".into(),
            ));
        }
        if self.contract_multiplier == 0 {
            return Err(SurfaceError::ConfigError(
                "contract_multiplier must be positive".into(),
            ));
        }
        if self.base_iv <= 0.0 {
            return Err(SurfaceError::ConfigError("base_iv must be positive".into()));
        }
        if self.strike_resolution < 2 || self.days_resolution < 2 {
            return Err(SurfaceError::ConfigError(
                "grid resolution must be at least 2 in each axis".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration for the application
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Upstream API configuration
    pub api: ApiConfig,
    /// Pipeline configuration
    pub surface: SurfaceConfig,
    /// Log level
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let api_key = env::var("POLYGON_API_KEY").map_err(|_| {
            SurfaceError::ConfigError("POLYGON_API_KEY environment variable not set".to_string())
        })?;

        let base_url =
            env::var("POLYGON_BASE_URL").unwrap_or_else(|_| "https://api.polygon.io".to_string());
        let request_timeout_secs = parse_env("REQUEST_TIMEOUT_SECS", 30u64)?;
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = SurfaceConfig::default();
        let surface = SurfaceConfig {
            symbol: env::var("TICKER")
                .map(|s| s.to_uppercase())
                .unwrap_or(defaults.symbol),
            expiry_range_days: parse_env("EXPIRY_RANGE_DAYS", defaults.expiry_range_days)?,
            risk_free_rate: parse_env("RISK_FREE_RATE", defaults.risk_free_rate)?,
            contract_multiplier: parse_env("CONTRACT_MULTIPLIER", defaults.contract_multiplier)?,
            base_iv: parse_env("BASE_IV", defaults.base_iv)?,
            strike_resolution: parse_env("STRIKE_RESOLUTION", defaults.strike_resolution)?,
            days_resolution: parse_env("DAYS_RESOLUTION", defaults.days_resolution)?,
            normalize_strikes: env::var("NORMALIZE_STRIKES")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(defaults.normalize_strikes),
            surface_height: parse_env("SURFACE_HEIGHT", defaults.surface_height)?,
            color_scheme: match env::var("COLOR_SCHEME") {
                Ok(v) => ColorScheme::parse(&v)?,
                Err(_) => defaults.color_scheme,
            },
            rng_seed: match env::var("RNG_SEED") {
                Ok(v) => Some(v.parse::<u64>().map_err(|_| {
                    SurfaceError::ConfigError(format!("RNG_SEED is not a valid u64: {}", v))
                })?),
                Err(_) => None,
            },
        };
        surface.validate()?;

        Ok(Config {
            api: ApiConfig {
                api_key,
                base_url,
                request_timeout_secs,
            },
            surface,
            log_level,
        })
    }

    /// Initialize logging based on configuration
    pub fn init_logging(&self) -> Result<()> {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level));

        fmt().with_env_filter(filter).with_target(true).init();

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(v) => v
            .parse::<T>()
            .map_err(|_| SurfaceError::ConfigError(format!("{} has an invalid value: {}", name, v))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_recognized_options() {
        let cfg = SurfaceConfig::default();
        assert_eq!(cfg.expiry_range_days, 90);
        assert_eq!(cfg.risk_free_rate, 0.035);
        assert_eq!(cfg.contract_multiplier, 100);
        assert_eq!(cfg.base_iv, 0.3);
        assert_eq!(cfg.strike_resolution, 50);
        assert_eq!(cfg.days_resolution, 20);
        assert!(!cfg.normalize_strikes);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_resolution_rejected() {
        let cfg = SurfaceConfig {
            days_resolution: 0,
            ..SurfaceConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(SurfaceError::ConfigError(_))
        ));
    }

    #[test]
    fn color_scheme_parse_is_case_insensitive() {
        assert_eq!(ColorScheme::parse("Heatmap").unwrap(), ColorScheme::Heatmap);
        assert!(ColorScheme::parse("plasma").is_err());
    }
}
