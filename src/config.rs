//! Startup configuration: weather provider credentials, commute origin, and
//! the fixed trip parameters the cost estimator runs on.
//!
//! Everything is resolved once at boot and shared read-only afterwards.
//! Commute parameters layer as: `$COMMUTE_CONFIG_PATH` → `config/commute.toml`
//! → built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

const ENV_API_KEY: &str = "OPENWEATHER_API_KEY";
const ENV_COMMUTE_PATH: &str = "COMMUTE_CONFIG_PATH";
const ENV_ORIGIN_LAT: &str = "COMMUTE_ORIGIN_LAT";
const ENV_ORIGIN_LON: &str = "COMMUTE_ORIGIN_LON";
const ENV_TIMEOUT_SECS: &str = "WEATHER_TIMEOUT_SECS";

const DEFAULT_COMMUTE_PATH: &str = "config/commute.toml";
const DEFAULT_ORIGIN_LAT: f64 = 34.1815;
const DEFAULT_ORIGIN_LON: f64 = -117.3229;
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Fixed trip parameters consumed by the cost estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommuteConfig {
    pub distance_miles: f64,
    pub base_mpg: f64,
    pub gas_price: f64,
}

impl Default for CommuteConfig {
    fn default() -> Self {
        Self {
            distance_miles: 56.0,
            base_mpg: 24.0,
            gas_price: 4.75,
        }
    }
}

impl CommuteConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading commute config from {}", path.display()))?;
        let cfg: CommuteConfig = toml::from_str(&content)
            .with_context(|| format!("parsing commute config at {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load using env var + fallbacks:
    /// 1) $COMMUTE_CONFIG_PATH (must exist if set)
    /// 2) config/commute.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_COMMUTE_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_COMMUTE_PATH} points to a non-existent path"));
        }
        let default_path = PathBuf::from(DEFAULT_COMMUTE_PATH);
        if default_path.exists() {
            return Self::load_from(&default_path);
        }
        Ok(Self::default())
    }

    /// All trip parameters must be strictly positive so the effective-mpg
    /// division downstream can never hit zero.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("distance_miles", self.distance_miles),
            ("base_mpg", self.base_mpg),
            ("gas_price", self.gas_price),
        ] {
            if !(value > 0.0) {
                return Err(anyhow!("commute config: {name} must be positive, got {value}"));
            }
        }
        Ok(())
    }
}

/// Immutable application configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub origin_lat: f64,
    pub origin_lon: f64,
    pub upstream_timeout: Duration,
    pub commute: CommuteConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(ENV_API_KEY)
            .map_err(|_| anyhow!("{ENV_API_KEY} must be set"))?;

        let origin_lat = env_f64(ENV_ORIGIN_LAT)?.unwrap_or(DEFAULT_ORIGIN_LAT);
        let origin_lon = env_f64(ENV_ORIGIN_LON)?.unwrap_or(DEFAULT_ORIGIN_LON);

        let timeout_secs = match std::env::var(ENV_TIMEOUT_SECS) {
            Ok(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds"))?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            return Err(anyhow!("{ENV_TIMEOUT_SECS} must be at least 1"));
        }

        let commute = CommuteConfig::load_default()?;

        Ok(Self {
            api_key,
            origin_lat,
            origin_lon,
            upstream_timeout: Duration::from_secs(timeout_secs),
            commute,
        })
    }
}

fn env_f64(name: &str) -> Result<Option<f64>> {
    match std::env::var(name) {
        Ok(raw) => {
            let v = raw
                .parse::<f64>()
                .with_context(|| format!("{name} must be a number, got {raw:?}"))?;
            Ok(Some(v))
        }
        Err(_) => Ok(None),
    }
}
