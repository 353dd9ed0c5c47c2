//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development. A `.env` file in the working
//! directory is read first when present.

use std::net::SocketAddr;
use std::path::PathBuf;

use kampus_shared::constants::{APP_NAME, DEFAULT_HTTP_PORT};

/// Signing secret used when `JWT_SECRET` is not set. Development only.
pub const DEV_JWT_SECRET: &str = "kampus-dev-secret-change-me";

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:5000`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `None`, meaning the platform data directory.
    pub database_path: Option<PathBuf>,

    /// HS256 secret for bearer tokens.
    /// Env: `JWT_SECRET`
    pub jwt_secret: String,

    /// Token lifetime in hours.
    /// Env: `JWT_EXPIRE_HOURS`
    /// Default: `168` (seven days)
    pub jwt_expire_hours: i64,

    /// Human-readable name for this instance.
    /// Env: `INSTANCE_NAME`
    pub instance_name: String,

    /// Sustained requests per second allowed per client IP.
    /// Env: `RATE_LIMIT_PER_SEC`
    pub rate_limit_per_sec: f64,

    /// Burst capacity of each client's token bucket.
    /// Env: `RATE_LIMIT_BURST`
    pub rate_limit_burst: f64,

    /// Whether new accounts can be created.
    /// Env: `REGISTRATION_OPEN` (true/false)
    /// Default: `true`
    pub registration_open: bool,
}

// The secret stays out of logs.
impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field("database_path", &self.database_path)
            .field("jwt_secret", &"<redacted>")
            .field("jwt_expire_hours", &self.jwt_expire_hours)
            .field("instance_name", &self.instance_name)
            .field("rate_limit_per_sec", &self.rate_limit_per_sec)
            .field("rate_limit_burst", &self.rate_limit_burst)
            .field("registration_open", &self.registration_open)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_expire_hours: 168,
            instance_name: APP_NAME.to_string(),
            rate_limit_per_sec: 10.0,
            rate_limit_burst: 30.0,
            registration_open: true,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup. Invalid values
    /// are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            match addr.parse::<SocketAddr>() {
                Ok(parsed) => config.http_addr = parsed,
                Err(_) => tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default"),
            }
        }

        if let Some(path) = lookup("DATABASE_PATH") {
            if !path.trim().is_empty() {
                config.database_path = Some(PathBuf::from(path));
            }
        }

        match lookup("JWT_SECRET") {
            Some(secret) if !secret.is_empty() => config.jwt_secret = secret,
            _ => tracing::warn!("JWT_SECRET not set, using the development secret"),
        }

        if let Some(val) = lookup("JWT_EXPIRE_HOURS") {
            match val.parse::<i64>() {
                Ok(hours) if hours > 0 => config.jwt_expire_hours = hours,
                _ => tracing::warn!(value = %val, "Invalid JWT_EXPIRE_HOURS, using default"),
            }
        }

        if let Some(name) = lookup("INSTANCE_NAME") {
            config.instance_name = name;
        }

        if let Some(val) = lookup("RATE_LIMIT_PER_SEC") {
            match val.parse::<f64>() {
                Ok(rate) if rate > 0.0 => config.rate_limit_per_sec = rate,
                _ => tracing::warn!(value = %val, "Invalid RATE_LIMIT_PER_SEC, using default"),
            }
        }

        if let Some(val) = lookup("RATE_LIMIT_BURST") {
            match val.parse::<f64>() {
                Ok(burst) if burst >= 1.0 => config.rate_limit_burst = burst,
                _ => tracing::warn!(value = %val, "Invalid RATE_LIMIT_BURST, using default"),
            }
        }

        if let Some(val) = lookup("REGISTRATION_OPEN") {
            config.registration_open = val != "false" && val != "0";
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> ServerConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = from_pairs(&[]);
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 5000).into());
        assert_eq!(config.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(config.jwt_expire_hours, 168);
        assert!(config.registration_open);
        assert!(config.database_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("HTTP_ADDR", "127.0.0.1:8081"),
            ("DATABASE_PATH", "/tmp/kampus.db"),
            ("JWT_SECRET", "s3cret"),
            ("JWT_EXPIRE_HOURS", "2"),
            ("REGISTRATION_OPEN", "false"),
            ("RATE_LIMIT_BURST", "5"),
        ]);
        assert_eq!(config.http_addr, ([127, 0, 0, 1], 8081).into());
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/kampus.db")));
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.jwt_expire_hours, 2);
        assert!(!config.registration_open);
        assert_eq!(config.rate_limit_burst, 5.0);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = from_pairs(&[
            ("HTTP_ADDR", "not-an-addr"),
            ("JWT_EXPIRE_HOURS", "-3"),
            ("RATE_LIMIT_PER_SEC", "fast"),
        ]);
        let defaults = ServerConfig::default();
        assert_eq!(config.http_addr, defaults.http_addr);
        assert_eq!(config.jwt_expire_hours, defaults.jwt_expire_hours);
        assert_eq!(config.rate_limit_per_sec, defaults.rate_limit_per_sec);
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = from_pairs(&[("JWT_SECRET", "hunter2")]);
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
