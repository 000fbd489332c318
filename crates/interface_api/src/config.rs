//! API configuration

use serde::Deserialize;

use domain_payment::GatewayConfig;

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Database URL
    pub database_url: String,
    /// Log level
    pub log_level: String,
    /// Directory for locally stored proof documents
    pub blob_dir: String,
    /// Public base URL under which stored blobs are served
    pub blob_base_url: String,
    /// Card gateway base URL; empty leaves the gateway unconfigured
    pub gateway_base_url: String,
    /// Card gateway API key
    pub gateway_api_key: String,
    /// Shared secret for webhook signatures
    pub gateway_webhook_secret: Option<String>,
    /// Outbound gateway call timeout
    pub gateway_timeout_secs: u64,
    /// Force the gateway's simulated path (development)
    pub gateway_simulate: bool,
    /// Bank-transfer target account
    pub bank_name: String,
    pub bank_account_number: String,
    pub bank_account_holder: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: "postgres://localhost/printforge".to_string(),
            log_level: "info".to_string(),
            blob_dir: "./data/blobs".to_string(),
            blob_base_url: "http://localhost:8080/files".to_string(),
            gateway_base_url: String::new(),
            gateway_api_key: String::new(),
            gateway_webhook_secret: None,
            gateway_timeout_secs: 15,
            gateway_simulate: true,
            bank_name: "First Print Bank".to_string(),
            bank_account_number: "000123456".to_string(),
            bank_account_holder: "PrintForge SAS".to_string(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The gateway provider configuration slice of this config
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            base_url: self.gateway_base_url.clone(),
            api_key: self.gateway_api_key.clone(),
            webhook_secret: self.gateway_webhook_secret.clone(),
            timeout_secs: self.gateway_timeout_secs,
            link_ttl_minutes: 60,
            simulate: self.gateway_simulate,
        }
    }
}
