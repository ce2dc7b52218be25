//! Application configuration.

use serde::Deserialize;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Complaint feed configuration.
    #[serde(default)]
    pub feed: FeedConfig,
    /// The locality this deployment serves.
    #[serde(default)]
    pub locality: LocalityConfig,
    /// Moderation policies.
    #[serde(default)]
    pub moderation: ModerationConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL (`postgres://` or `sqlite:`).
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Upper bound for a single service-level store operation.
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
}

/// Complaint feed configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Maximum number of complaints per page.
    #[serde(default = "default_page_limit")]
    pub page_limit: u64,
}

/// Supported locality.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalityConfig {
    /// City name.
    #[serde(default = "default_city")]
    pub city: String,
    /// Two-letter state code.
    #[serde(default = "default_uf")]
    pub uf: String,
}

/// Moderation policies.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModerationConfig {
    /// Allow auditors to change the status of an already reviewed complaint.
    #[serde(default)]
    pub allow_remoderation: bool,
    /// Refuse publisher edits once a complaint has been reviewed.
    #[serde(default)]
    pub lock_reviewed_edits: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_limit: default_page_limit(),
        }
    }
}

impl Default for LocalityConfig {
    fn default() -> Self {
        Self {
            city: default_city(),
            uf: default_uf(),
        }
    }
}

impl DatabaseConfig {
    /// Operation timeout as a [`Duration`].
    #[must_use]
    pub const fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

impl LocalityConfig {
    /// Whether `city`/`uf` name this locality.
    #[must_use]
    pub fn matches(&self, city: &str, uf: &str) -> bool {
        self.city == city && self.uf == uf
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_operation_timeout_ms() -> u64 {
    5000
}

const fn default_page_limit() -> u64 {
    10
}

fn default_city() -> String {
    "Brumadinho".to_string()
}

fn default_uf() -> String {
    "MG".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `DENUNCIA_ENV`)
    /// 3. Environment variables with `DENUNCIA_` prefix, e.g. `DENUNCIA_DATABASE__URL`
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("DENUNCIA_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("DENUNCIA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no deployment can serve with.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.feed.page_limit < 1 {
            return Err(config::ConfigError::Message(
                "feed.page_limit must be at least 1".to_string(),
            ));
        }
        if self.database.operation_timeout_ms == 0 {
            return Err(config::ConfigError::Message(
                "database.operation_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Configuration for the given database URL with every other value defaulted.
    #[must_use]
    pub fn for_database(url: impl Into<String>) -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: url.into(),
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                operation_timeout_ms: default_operation_timeout_ms(),
            },
            feed: FeedConfig::default(),
            locality: LocalityConfig::default(),
            moderation: ModerationConfig::default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_source() {
        let config: Config = config::Config::builder()
            .set_override("database.url", "sqlite::memory:")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.feed.page_limit, 10);
        assert_eq!(config.locality.city, "Brumadinho");
        assert_eq!(config.locality.uf, "MG");
        assert!(!config.moderation.allow_remoderation);
        assert!(!config.moderation.lock_reviewed_edits);
        assert_eq!(config.database.operation_timeout(), Duration::from_secs(5));
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_overrides() {
        let config: Config = config::Config::builder()
            .set_override("database.url", "postgres://localhost/denuncia")
            .unwrap()
            .set_override("feed.page_limit", 25)
            .unwrap()
            .set_override("moderation.allow_remoderation", true)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.feed.page_limit, 25);
        assert!(config.moderation.allow_remoderation);
    }

    #[test]
    fn test_locality_matches() {
        let locality = LocalityConfig::default();
        assert!(locality.matches("Brumadinho", "MG"));
        assert!(!locality.matches("Belo Horizonte", "MG"));
        assert!(!locality.matches("Brumadinho", "SP"));
    }

    #[test]
    fn test_zero_page_limit_rejected() {
        let mut config = Config::for_database("sqlite::memory:");
        assert!(config.validate().is_ok());

        config.feed.page_limit = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("page_limit"));

        config.feed.page_limit = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_operation_timeout_rejected() {
        let mut config = Config::for_database("sqlite::memory:");
        config.database.operation_timeout_ms = 0;
        assert!(config.validate().is_err());
    }
}
