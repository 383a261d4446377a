//! Server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub const DEFAULT_SESSION_HOURS: i64 = 4;
pub const MIN_SESSION_HOURS: i64 = 1;
pub const MAX_SESSION_HOURS: i64 = 24;

/// Cache backend used when no Redis URL is configured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Memory,
    None,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment: development | staging | production
    pub environment: String,
    /// `postgres://…` or `memory://`
    pub database_url: String,
    /// Redis URL; takes precedence over `cache_backend`
    pub redis_url: Option<String>,
    pub cache_backend: CacheBackend,
    /// HTTP port
    pub http_port: u16,
    /// JWT secret for staff authentication
    pub jwt_secret: String,
    /// Default session lifetime (hours, clamped to 1..=24)
    pub session_expiration_hours: i64,
    /// Service fee applied at checkout, in percent of the subtotal
    pub service_fee_percent: f64,
    pub session_cache_ttl_secs: u64,
    pub menu_cache_ttl_secs: u64,
    /// Expired-session sweep interval; 0 disables the sweep
    pub cleanup_interval_secs: u64,
}

/// Numeric env var, falling back to `default` with a warning when malformed
fn env_parse<T: std::str::FromStr + std::fmt::Display + Copy>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("{name}={raw} is not valid, using {default}");
            default
        }),
        Err(_) => default,
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
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

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let cache_backend = match env_opt("CACHE_BACKEND").as_deref() {
            Some("memory") => CacheBackend::Memory,
            Some("none") | None => CacheBackend::None,
            Some(other) => {
                return Err(format!("CACHE_BACKEND must be memory or none, got {other}").into());
            }
        };

        let service_fee_percent: f64 = env_parse("SERVICE_FEE_PERCENT", 10.0);
        if !(0.0..=100.0).contains(&service_fee_percent) {
            return Err(format!("SERVICE_FEE_PERCENT out of range: {service_fee_percent}").into());
        }

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            redis_url: env_opt("REDIS_URL"),
            cache_backend,
            http_port: env_parse("HTTP_PORT", 8080),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            session_expiration_hours: env_parse("SESSION_EXPIRATION_HOURS", DEFAULT_SESSION_HOURS)
                .clamp(MIN_SESSION_HOURS, MAX_SESSION_HOURS),
            service_fee_percent,
            session_cache_ttl_secs: env_parse("SESSION_CACHE_TTL_SECS", 3600),
            menu_cache_ttl_secs: env_parse("MENU_CACHE_TTL_SECS", 300),
            cleanup_interval_secs: env_parse("CLEANUP_INTERVAL_SECS", 900),
            environment,
        })
    }

    /// In-process configuration for local runs and tests
    pub fn in_memory() -> Self {
        Self {
            environment: "development".into(),
            database_url: "memory://".into(),
            redis_url: None,
            cache_backend: CacheBackend::Memory,
            http_port: 8080,
            jwt_secret: "dev-JWT_SECRET-not-for-production".into(),
            session_expiration_hours: DEFAULT_SESSION_HOURS,
            service_fee_percent: 10.0,
            session_cache_ttl_secs: 3600,
            menu_cache_ttl_secs: 300,
            cleanup_interval_secs: 0,
        }
    }
}
