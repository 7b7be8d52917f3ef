//! API configuration

use serde::Deserialize;

/// API configuration
///
/// Loaded from `ERP_*` environment variables (`ERP_PORT`, `ERP_JWT_SECRET`,
/// `ERP_DATABASE_URL`, ...); anything unset keeps its default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// HS256 secret for bearer tokens
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Database URL
    pub database_url: String,
    pub database_max_connections: u32,
    /// Log filter directive, e.g. `info` or `interface_api=debug,sqlx=warn`
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub log_json: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: "postgres://localhost/erp".to_string(),
            database_max_connections: 10,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from the environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("ERP").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert!(!config.log_json);
    }

    #[test]
    fn test_partial_source_keeps_defaults() {
        let config: ApiConfig = config::Config::builder()
            .set_override("port", 9090)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.database_url, "postgres://localhost/erp");
    }
}
