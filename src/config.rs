//! Process configuration read once from the environment.
//!
//! ```text
//! TRANSIT_API_KEY=...            required
//! PARENT_STATIONS=menlo_park,palo_alto   required, comma separated
//! TRANSIT_AGENCY=CT              default CT
//! REFRESH_INTERVAL_SECS=120
//! TICK_INTERVAL_SECS=1
//! HTTP_TIMEOUT_SECS=30
//! DISPLAY_WIDTH=64
//! DISPLAY_HEIGHT=64
//! ```

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::transit::TransitAgency;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(120);
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_DISPLAY_WIDTH: u32 = 64;
pub const DEFAULT_DISPLAY_HEIGHT: u32 = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),
    #[error("environment variable {var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// The subset of [`Config`] needed to talk to the transit API at all.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_key: String,
    pub http_timeout: Duration,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("TRANSIT_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::Missing("TRANSIT_API_KEY"))?;
        let http_timeout = secs_or(&lookup, "HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT)?;

        Ok(Self {
            api_key,
            http_timeout,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub parent_stations: Vec<String>,
    pub agency: TransitAgency,
    pub refresh_interval: Duration,
    pub tick_interval: Duration,
    pub http_timeout: Duration,
    pub display_width: u32,
    pub display_height: u32,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of a
    /// variable if it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ApiConfig {
            api_key,
            http_timeout,
        } = ApiConfig::from_lookup(&lookup)?;

        let stations = lookup("PARENT_STATIONS").ok_or(ConfigError::Missing("PARENT_STATIONS"))?;
        let parent_stations = parse_station_list(&stations);
        if parent_stations.is_empty() {
            return Err(ConfigError::Invalid {
                var: "PARENT_STATIONS",
                value: stations,
                reason: "no station names given".to_string(),
            });
        }

        let agency = parse_or(&lookup, "TRANSIT_AGENCY", TransitAgency::Caltrain)?;
        let refresh_interval = secs_or(&lookup, "REFRESH_INTERVAL_SECS", DEFAULT_REFRESH_INTERVAL)?;
        let tick_interval = secs_or(&lookup, "TICK_INTERVAL_SECS", DEFAULT_TICK_INTERVAL)?;
        let display_width = parse_or(&lookup, "DISPLAY_WIDTH", DEFAULT_DISPLAY_WIDTH)?;
        let display_height = parse_or(&lookup, "DISPLAY_HEIGHT", DEFAULT_DISPLAY_HEIGHT)?;

        Ok(Self {
            api_key,
            parent_stations,
            agency,
            refresh_interval,
            tick_interval,
            http_timeout,
            display_width,
            display_height,
        })
    }
}

/// Splits a comma separated station list, trimming whitespace and dropping
/// empty entries. Order is preserved.
pub fn parse_station_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) if value.trim().is_empty() => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

fn secs_or<F>(lookup: &F, var: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs: u64 = parse_or(lookup, var, default.as_secs())?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            var,
            value: secs.to_string(),
            reason: "must be at least 1 second".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("TRANSIT_API_KEY", "abc"),
            ("PARENT_STATIONS", "menlo_park"),
        ]))
        .unwrap();

        assert_eq!(config.api_key, "abc");
        assert_eq!(config.parent_stations, vec!["menlo_park"]);
        assert_eq!(config.agency, TransitAgency::Caltrain);
        assert_eq!(config.refresh_interval, Duration::from_secs(120));
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!((config.display_width, config.display_height), (64, 64));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("TRANSIT_API_KEY", "abc"),
            ("PARENT_STATIONS", "a,b"),
            ("TRANSIT_AGENCY", "ba"),
            ("REFRESH_INTERVAL_SECS", "60"),
            ("DISPLAY_HEIGHT", "32"),
        ]))
        .unwrap();

        assert_eq!(config.agency, TransitAgency::Bart);
        assert_eq!(config.refresh_interval, Duration::from_secs(60));
        assert_eq!(config.display_height, 32);
    }

    #[test]
    fn test_missing_required() {
        assert_eq!(
            Config::from_lookup(lookup(&[("PARENT_STATIONS", "a")])).unwrap_err(),
            ConfigError::Missing("TRANSIT_API_KEY")
        );
        assert_eq!(
            Config::from_lookup(lookup(&[("TRANSIT_API_KEY", "k")])).unwrap_err(),
            ConfigError::Missing("PARENT_STATIONS")
        );
    }

    #[test]
    fn test_invalid_values() {
        let err = Config::from_lookup(lookup(&[
            ("TRANSIT_API_KEY", "k"),
            ("PARENT_STATIONS", " , ,"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "PARENT_STATIONS", .. }));

        let err = Config::from_lookup(lookup(&[
            ("TRANSIT_API_KEY", "k"),
            ("PARENT_STATIONS", "a"),
            ("REFRESH_INTERVAL_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "REFRESH_INTERVAL_SECS", .. }));

        let err = Config::from_lookup(lookup(&[
            ("TRANSIT_API_KEY", "k"),
            ("PARENT_STATIONS", "a"),
            ("TRANSIT_AGENCY", "ZZ"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "TRANSIT_AGENCY", .. }));
    }

    #[test]
    fn test_api_config_without_stations() {
        let api = ApiConfig::from_lookup(lookup(&[
            ("TRANSIT_API_KEY", "abc"),
            ("HTTP_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(api.api_key, "abc");
        assert_eq!(api.http_timeout, Duration::from_secs(5));

        let api = ApiConfig::from_lookup(lookup(&[("TRANSIT_API_KEY", "abc")])).unwrap();
        assert_eq!(api.http_timeout, DEFAULT_HTTP_TIMEOUT);

        assert_eq!(
            ApiConfig::from_lookup(lookup(&[("TRANSIT_API_KEY", "  ")])).unwrap_err(),
            ConfigError::Missing("TRANSIT_API_KEY")
        );
        let err = ApiConfig::from_lookup(lookup(&[
            ("TRANSIT_API_KEY", "abc"),
            ("HTTP_TIMEOUT_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "HTTP_TIMEOUT_SECS", .. }));
    }

    #[test]
    fn test_parse_station_list() {
        assert_eq!(
            parse_station_list(" menlo_park, palo_alto ,,san_francisco"),
            vec!["menlo_park", "palo_alto", "san_francisco"]
        );
        assert!(parse_station_list("").is_empty());
    }
}
