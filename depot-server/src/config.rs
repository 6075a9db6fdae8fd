//! Depot server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Session lifetime used when the configured value is missing or unusable
pub const DEFAULT_SESSION_TTL_HOURS: f64 = 12.0;
/// Longest accepted session lifetime (one year)
pub const MAX_SESSION_TTL_HOURS: f64 = 24.0 * 365.0;

/// Depot server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// Connection pool size
    pub database_max_connections: u32,
    /// HTTP listen port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// Signing secret for admin sessions
    pub admin_session_secret: String,
    /// Signing secret for location sessions
    pub location_session_secret: String,
    /// Signing secret for runner sessions
    pub runner_session_secret: String,
    pub admin_session_ttl_hours: f64,
    pub location_session_ttl_hours: f64,
    pub runner_session_ttl_hours: f64,
    /// PIN that unlocks the admin area (unset disables admin unlock)
    pub admin_access_pin: Option<String>,
    /// Shared runner PIN for unlocks without a runner id
    pub runner_access_pin: Option<String>,
    /// Unlock attempts allowed per client IP and route per minute
    pub unlock_rate_limit_per_minute: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, BoxError> {
        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".into());

        let config = Self {
            database_url: lookup("DATABASE_URL").ok_or("DATABASE_URL must be set")?,
            database_max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            http_port: lookup("HTTP_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            admin_session_secret: require_secret(&lookup, "ADMIN_SESSION_SECRET", &environment)?,
            location_session_secret: require_secret(
                &lookup,
                "LOCATION_SESSION_SECRET",
                &environment,
            )?,
            runner_session_secret: require_secret(&lookup, "RUNNER_SESSION_SECRET", &environment)?,
            admin_session_ttl_hours: ttl_hours(lookup("ADMIN_SESSION_TTL_HOURS")),
            location_session_ttl_hours: ttl_hours(lookup("LOCATION_SESSION_TTL_HOURS")),
            runner_session_ttl_hours: ttl_hours(lookup("RUNNER_SESSION_TTL_HOURS")),
            admin_access_pin: lookup("ADMIN_ACCESS_PIN")
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            runner_access_pin: lookup("RUNNER_ACCESS_PIN")
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            unlock_rate_limit_per_minute: lookup("UNLOCK_RATE_LIMIT_PER_MINUTE")
                .and_then(|v| v.parse().ok())
                .filter(|v: &u32| *v > 0)
                .unwrap_or(10),
            environment,
        };

        if !config.is_development() {
            let secrets = [
                &config.admin_session_secret,
                &config.location_session_secret,
                &config.runner_session_secret,
            ];
            if secrets[0] == secrets[1] || secrets[0] == secrets[2] || secrets[1] == secrets[2] {
                return Err(format!(
                    "session secrets must be distinct per kind in {} environment",
                    config.environment
                )
                .into());
            }
        }

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Cookies are marked `Secure` only in production
    pub fn cookie_secure(&self) -> bool {
        self.environment == "production"
    }
}

/// Require a secret variable: must be set and non-empty outside development.
fn require_secret(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    environment: &str,
) -> Result<String, BoxError> {
    let val = match lookup(name) {
        Some(v) => v,
        None => {
            if environment != "development" {
                return Err(format!("{name} must be set in {environment} environment").into());
            }
            format!("dev-{name}-not-for-production")
        }
    };
    if val.is_empty() && environment != "development" {
        return Err(format!("{name} must not be empty in {environment} environment").into());
    }
    Ok(val)
}

/// Parse an hours value; non-numeric, non-finite or non-positive falls back.
/// Values above [`MAX_SESSION_TTL_HOURS`] are capped.
fn ttl_hours(raw: Option<String>) -> f64 {
    raw.and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|h| h.is_finite() && *h > 0.0)
        .map(|h| h.min(MAX_SESSION_TTL_HOURS))
        .unwrap_or(DEFAULT_SESSION_TTL_HOURS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_development_defaults() {
        let config = Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")]))
            .expect("development config loads");

        assert_eq!(config.http_port, 8080);
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.admin_session_ttl_hours, 12.0);
        assert_eq!(config.unlock_rate_limit_per_minute, 10);
        assert!(config.admin_access_pin.is_none());
        assert_ne!(config.admin_session_secret, config.runner_session_secret);
        assert!(!config.cookie_secure());
    }

    #[test]
    fn test_database_url_required() {
        assert!(Config::from_lookup(lookup_from(&[])).is_err());
    }

    #[test]
    fn test_ttl_fallbacks() {
        assert_eq!(ttl_hours(Some("0.5".into())), 0.5);
        assert_eq!(ttl_hours(Some("0".into())), 12.0);
        assert_eq!(ttl_hours(Some("-3".into())), 12.0);
        assert_eq!(ttl_hours(Some("NaN".into())), 12.0);
        assert_eq!(ttl_hours(Some("inf".into())), 12.0);
        assert_eq!(ttl_hours(Some("soon".into())), 12.0);
        assert_eq!(ttl_hours(None), 12.0);
        assert_eq!(ttl_hours(Some("1e16".into())), MAX_SESSION_TTL_HOURS);
        assert_eq!(ttl_hours(Some("8760".into())), 8760.0);
    }

    #[test]
    fn test_production_requires_secrets() {
        let result = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("ENVIRONMENT", "production"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_production_rejects_shared_secret() {
        let result = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("ENVIRONMENT", "production"),
            ("ADMIN_SESSION_SECRET", "same"),
            ("LOCATION_SESSION_SECRET", "same"),
            ("RUNNER_SESSION_SECRET", "other"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_production_config() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("ENVIRONMENT", "production"),
            ("ADMIN_SESSION_SECRET", "a"),
            ("LOCATION_SESSION_SECRET", "l"),
            ("RUNNER_SESSION_SECRET", "r"),
            ("ADMIN_ACCESS_PIN", " 4321 "),
        ]))
        .expect("production config loads");

        assert!(config.cookie_secure());
        assert_eq!(config.admin_access_pin.as_deref(), Some("4321"));
    }
}
