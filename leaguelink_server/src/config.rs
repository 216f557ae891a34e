//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use leaguelink::db::DatabaseConfig;
use std::net::SocketAddr;

const DEFAULT_BIND: &str = "127.0.0.1:8080";
const DEFAULT_DATABASE_URL: &str = "postgres://postgres@localhost/leaguelink";
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Security configuration
    pub security: SecurityConfig,
    /// Prometheus exporter address; no exporter when unset
    pub metrics_bind: Option<SocketAddr>,
}

/// Security-related configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// JWT signing secret (required)
    pub jwt_secret: String,
    /// Password hashing pepper (required)
    pub password_pepper: String,
    /// Access token lifetime in hours
    pub token_ttl_hours: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        Self::from_source(
            |key| std::env::var(key).ok(),
            bind_override,
            database_url_override,
        )
    }

    /// Load configuration from an arbitrary key lookup
    fn from_source<F>(
        lookup: F,
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_required_or(&lookup, "SERVER_BIND", DEFAULT_BIND)?,
        };

        // Database configuration
        let database_url = database_url_override
            .or_else(|| lookup("DATABASE_URL"))
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let database = DatabaseConfig {
            database_url,
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 20),
            min_connections: parse_or(&lookup, "DB_MIN_CONNECTIONS", 2),
            connection_timeout_secs: parse_or(&lookup, "DB_CONNECTION_TIMEOUT_SECS", 10),
            idle_timeout_secs: parse_or(&lookup, "DB_IDLE_TIMEOUT_SECS", 600),
            max_lifetime_secs: parse_or(&lookup, "DB_MAX_LIFETIME_SECS", 1800),
        };

        // Security configuration (REQUIRED)
        let jwt_secret = lookup("JWT_SECRET").ok_or_else(|| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Generate with: openssl rand -hex 32".to_string(),
        })?;

        let password_pepper =
            lookup("PASSWORD_PEPPER").ok_or_else(|| ConfigError::MissingRequired {
                var: "PASSWORD_PEPPER".to_string(),
                hint: "Generate with: openssl rand -hex 16".to_string(),
            })?;

        let security = SecurityConfig {
            jwt_secret,
            password_pepper,
            token_ttl_hours: parse_or(&lookup, "TOKEN_TTL_HOURS", 24),
        };

        let metrics_bind = match lookup("METRICS_BIND") {
            Some(value) => Some(value.parse().map_err(|_| ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("'{value}' is not a socket address"),
            })?),
            None => None,
        };

        let config = ServerConfig {
            bind,
            database,
            security,
            metrics_bind,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.len() < 32 {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: "Must be at least 32 characters (128-bit security)".to_string(),
            });
        }

        if self.security.password_pepper.len() < 16 {
            return Err(ConfigError::Invalid {
                var: "PASSWORD_PEPPER".to_string(),
                reason: "Must be at least 16 characters (64-bit security)".to_string(),
            });
        }

        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&self.security.token_ttl_hours) {
            return Err(ConfigError::Invalid {
                var: "TOKEN_TTL_HOURS".to_string(),
                reason: format!("Must be between 1 and {MAX_TOKEN_TTL_HOURS}"),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed DB_MAX_CONNECTIONS ({})",
                    self.database.max_connections
                ),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse a variable with default fallback
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Like `parse_or`, but a present and malformed value is an error
fn parse_required_or<F, T>(lookup: &F, key: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let value = lookup(key).unwrap_or_else(|| default.to_string());
    value.parse().map_err(|_| ConfigError::Invalid {
        var: key.to_string(),
        reason: format!("cannot parse '{value}'"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_source(|key| vars.get(key).cloned(), None, None)
    }

    fn secrets() -> Vec<(&'static str, &'static str)> {
        vec![
            ("JWT_SECRET", "0123456789abcdef0123456789abcdef"),
            ("PASSWORD_PEPPER", "0123456789abcdef"),
        ]
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Use openssl".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("JWT_SECRET"));
        assert!(msg.contains("Use openssl"));
    }

    #[test]
    fn test_defaults_applied() {
        let config = load(&secrets()).unwrap();
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.database.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.security.token_ttl_hours, 24);
        assert!(config.metrics_bind.is_none());
    }

    #[test]
    fn test_missing_secret_rejected() {
        let err = load(&[("PASSWORD_PEPPER", "0123456789abcdef")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { ref var, .. } if var == "JWT_SECRET"));
    }

    #[test]
    fn test_short_secret_rejected() {
        let err = load(&[
            ("JWT_SECRET", "too_short"),
            ("PASSWORD_PEPPER", "0123456789abcdef"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "JWT_SECRET"));
    }

    #[test]
    fn test_bad_bind_address_rejected() {
        let mut vars = secrets();
        vars.push(("SERVER_BIND", "not-an-address"));
        assert!(matches!(load(&vars), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_overrides_win() {
        let vars: HashMap<String, String> = secrets()
            .into_iter()
            .chain([("DATABASE_URL", "postgres://env/db"), ("METRICS_BIND", "0.0.0.0:9100")])
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config = ServerConfig::from_source(
            |key| vars.get(key).cloned(),
            Some("0.0.0.0:3000".parse().unwrap()),
            Some("postgres://cli/db".to_string()),
        )
        .unwrap();
        assert_eq!(config.bind.port(), 3000);
        assert_eq!(config.database.database_url, "postgres://cli/db");
        assert_eq!(config.metrics_bind.map(|a| a.port()), Some(9100));
    }

    #[test]
    fn test_pool_bounds_validated() {
        let mut vars = secrets();
        vars.push(("DB_MIN_CONNECTIONS", "50"));
        vars.push(("DB_MAX_CONNECTIONS", "10"));
        assert!(matches!(load(&vars), Err(ConfigError::Invalid { .. })));
    }
}
