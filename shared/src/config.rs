use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::Duration;
use log::{info, warn};

pub const DEFAULT_TABLE_NAME: &str = "evites";
pub const DEFAULT_CACHE_DIR: &str = "./.evite-cache";
pub const DEFAULT_CACHE_SLOT: &str = "evites";
pub const DEFAULT_TOMBSTONE_WINDOW_SECS: i64 = 30;
pub const MAX_TOMBSTONE_WINDOW_SECS: i64 = 24 * 60 * 60;

/// Storage settings read from the environment.
#[derive(Debug, Clone)]
pub struct EviteConfig {
    pub table_name: String,
    /// Custom DynamoDB endpoint, e.g. DynamoDB Local during development.
    pub dynamodb_endpoint: Option<String>,
    pub cache_dir: PathBuf,
    pub cache_slot: String,
    pub tombstone_window: Duration,
}

impl Default for EviteConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            dynamodb_endpoint: None,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            cache_slot: DEFAULT_CACHE_SLOT.to_string(),
            tombstone_window: Duration::seconds(DEFAULT_TOMBSTONE_WINDOW_SECS),
        }
    }
}

impl EviteConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let tombstone_window = tombstone_window(parse_or(
            "EVITE_TOMBSTONE_WINDOW_SECS",
            DEFAULT_TOMBSTONE_WINDOW_SECS,
        ));

        let config = Self {
            table_name: env::var("EVITES_TABLE_NAME").unwrap_or(defaults.table_name),
            dynamodb_endpoint: env::var("DYNAMODB_ENDPOINT").ok().filter(|v| !v.is_empty()),
            cache_dir: env::var("EVITE_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            cache_slot: env::var("EVITE_CACHE_SLOT").unwrap_or(defaults.cache_slot),
            tombstone_window,
        };

        info!(
            "Evite storage config: table={}, cache_dir={}, tombstone_window={}s",
            config.table_name,
            config.cache_dir.display(),
            config.tombstone_window.num_seconds()
        );
        config
    }
}

/// Negative windows fall back to the default; oversized ones are capped at a day.
fn tombstone_window(secs: i64) -> Duration {
    if secs < 0 {
        warn!(
            "EVITE_TOMBSTONE_WINDOW_SECS must not be negative, using {}",
            DEFAULT_TOMBSTONE_WINDOW_SECS
        );
        return Duration::seconds(DEFAULT_TOMBSTONE_WINDOW_SECS);
    }
    if secs > MAX_TOMBSTONE_WINDOW_SECS {
        warn!(
            "EVITE_TOMBSTONE_WINDOW_SECS={} exceeds the maximum, using {}",
            secs, MAX_TOMBSTONE_WINDOW_SECS
        );
        return Duration::seconds(MAX_TOMBSTONE_WINDOW_SECS);
    }
    Duration::seconds(secs)
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid {} value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EviteConfig::default();
        assert_eq!(config.table_name, "evites");
        assert_eq!(config.cache_slot, "evites");
        assert_eq!(config.tombstone_window, Duration::seconds(30));
        assert!(config.dynamodb_endpoint.is_none());
    }

    #[test]
    fn test_tombstone_window_bounds() {
        assert_eq!(tombstone_window(45), Duration::seconds(45));
        assert_eq!(tombstone_window(-1), Duration::seconds(30));
        assert_eq!(tombstone_window(i64::MAX), Duration::seconds(86_400));
    }

    #[test]
    fn test_parse_or_falls_back_on_garbage() {
        env::set_var("EVITE_TEST_PARSE_OR", "not-a-number");
        assert_eq!(parse_or("EVITE_TEST_PARSE_OR", 7i64), 7);
        env::set_var("EVITE_TEST_PARSE_OR", " 12 ");
        assert_eq!(parse_or("EVITE_TEST_PARSE_OR", 7i64), 12);
        env::remove_var("EVITE_TEST_PARSE_OR");
        assert_eq!(parse_or("EVITE_TEST_PARSE_OR", 7i64), 7);
    }
}
