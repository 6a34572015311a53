//! Configuration Module
//!
//! Handles loading coordinator configuration from environment variables.

use std::env;
use std::time::Duration;

/// Coordinator-wide configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// TTL in milliseconds for queries without their own override
    pub default_ttl_ms: u64,
    /// Buffered change notifications before slow subscribers lag
    pub event_capacity: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `QUERY_CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `QUERY_CACHE_EVENT_CAPACITY` - Notification buffer size (default: 256)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_ttl_ms: env::var("QUERY_CACHE_DEFAULT_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_ttl_ms),
            event_capacity: env::var("QUERY_CACHE_EVENT_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|capacity| *capacity > 0)
                .unwrap_or(defaults.event_capacity),
        }
    }

    /// Sets the default TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Default TTL as a Duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl_ms: 5 * 60 * 1000,
            event_capacity: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.default_ttl_ms, 300_000);
        assert_eq!(config.event_capacity, 256);
        assert_eq!(config.default_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_config_from_env_defaults() {
        env::remove_var("QUERY_CACHE_DEFAULT_TTL_MS");
        env::remove_var("QUERY_CACHE_EVENT_CAPACITY");

        let config = Config::from_env();
        assert_eq!(config.default_ttl_ms, 300_000);
        assert_eq!(config.event_capacity, 256);
    }

    #[test]
    fn test_with_default_ttl() {
        let config = Config::default().with_default_ttl(Duration::from_millis(1500));
        assert_eq!(config.default_ttl_ms, 1500);
    }

    #[test]
    fn test_with_default_ttl_saturates() {
        let config = Config::default().with_default_ttl(Duration::MAX);
        assert_eq!(config.default_ttl_ms, u64::MAX);
    }
}
