use serde::Deserialize;
use std::net::{AddrParseError, SocketAddr};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    /// Bearer-token verification for redeemer identity
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub redemption: RedemptionConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Redemption attempts allowed per client per minute (0 disables)
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,

    /// Hex SHA-256 of the admin key; empty disables admin routes
    #[serde(default)]
    pub admin_key_hash: String,

    #[serde(default)]
    pub hsts_enabled: bool,

    /// Key redemption rate limits on the first `X-Forwarded-For` hop. Only
    /// enable behind a reverse proxy that overwrites the header.
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

/// Verification keys for bearer tokens presented by scanning clients.
///
/// Tokens are issued by the external auth system. With neither key set every
/// redemption is recorded as anonymous.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityConfig {
    /// RSA public key in PEM format (RS256)
    #[serde(default)]
    pub public_key: String,

    /// Shared secret (HS256), used when no public key is configured
    #[serde(default)]
    pub shared_secret: String,

    /// Clock skew tolerance in seconds
    #[serde(default = "default_jwt_leeway")]
    pub leeway_secs: u64,
}

impl IdentityConfig {
    pub fn is_enabled(&self) -> bool {
        !self.public_key.is_empty() || !self.shared_secret.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedemptionConfig {
    /// Total attempts when the store reports a concurrent-update conflict
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for RedemptionConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_home_limit")]
    pub home_limit: u32,

    #[serde(default = "default_nearby_radius_km")]
    pub nearby_radius_km: f64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            home_limit: default_home_limit(),
            nearby_radius_km: default_nearby_radius_km(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_expire_offers_interval")]
    pub expire_offers_interval_secs: u64,

    #[serde(default = "default_urgent_alerts_interval")]
    pub urgent_alerts_interval_secs: u64,

    #[serde(default = "default_urgency_window")]
    pub urgency_window_minutes: i64,

    #[serde(default = "default_pool_metrics_interval")]
    pub pool_metrics_interval_secs: u64,

    #[serde(default = "default_rate_limit_cleanup_interval")]
    pub rate_limit_cleanup_interval_secs: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            expire_offers_interval_secs: default_expire_offers_interval(),
            urgent_alerts_interval_secs: default_urgent_alerts_interval(),
            urgency_window_minutes: default_urgency_window(),
            pool_metrics_interval_secs: default_pool_metrics_interval(),
            rate_limit_cleanup_interval_secs: default_rate_limit_cleanup_interval(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_body_size() -> usize {
    16_384
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    2
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_rate_limit() -> u32 {
    30
}
fn default_jwt_leeway() -> u64 {
    shared::jwt::DEFAULT_LEEWAY_SECS
}
fn default_max_attempts() -> u32 {
    domain::services::DEFAULT_MAX_ATTEMPTS
}
fn default_home_limit() -> u32 {
    domain::services::HOME_FEED_LIMIT
}
fn default_nearby_radius_km() -> f64 {
    5.0
}
fn default_true() -> bool {
    true
}
fn default_expire_offers_interval() -> u64 {
    60
}
fn default_urgent_alerts_interval() -> u64 {
    30
}
fn default_urgency_window() -> i64 {
    domain::services::DEFAULT_URGENCY_WINDOW_MINUTES
}
fn default_pool_metrics_interval() -> u64 {
    10
}
fn default_rate_limit_cleanup_interval() -> u64 {
    60
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with FLASHY__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("FLASHY")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Defaults are embedded so tests do not depend on the working directory.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30

            [database]
            url = ""
            max_connections = 20
            min_connections = 2

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []
            rate_limit_per_minute = 30
            admin_key_hash = ""

            [identity]
            shared_secret = ""
            leeway_secs = 30

            [redemption]
            max_attempts = 3

            [feed]
            home_limit = 10

            [jobs]
            enabled = false
            urgency_window_minutes = 20
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        // Skip validation in tests to allow partial configs
        Ok(cfg)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "FLASHY__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.socket_addr().is_err() {
            return Err(ConfigValidationError::InvalidValue(format!(
                "Invalid listen address {}:{}",
                self.server.host, self.server.port
            )));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.redemption.max_attempts == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "redemption.max_attempts must be at least 1".to_string(),
            ));
        }

        if self.feed.home_limit == 0 || self.feed.home_limit > shared::pagination::MAX_PAGE_SIZE {
            return Err(ConfigValidationError::InvalidValue(format!(
                "feed.home_limit must be between 1 and {}",
                shared::pagination::MAX_PAGE_SIZE
            )));
        }

        if shared::validation::validate_radius_km(self.feed.nearby_radius_km).is_err() {
            return Err(ConfigValidationError::InvalidValue(
                "feed.nearby_radius_km must be greater than 0 and at most 50".to_string(),
            ));
        }

        if self.jobs.urgency_window_minutes <= 0 {
            return Err(ConfigValidationError::InvalidValue(
                "jobs.urgency_window_minutes must be positive".to_string(),
            ));
        }

        if !self.security.admin_key_hash.is_empty()
            && (self.security.admin_key_hash.len() != 64
                || hex::decode(&self.security.admin_key_hash).is_err())
        {
            return Err(ConfigValidationError::InvalidValue(
                "security.admin_key_hash must be a hex SHA-256 digest".to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}
