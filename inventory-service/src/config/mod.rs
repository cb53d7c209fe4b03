use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct InventoryConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub mongodb: MongoConfig,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Mongodb,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    #[serde(default = "default_uri")]
    pub uri: Secret<String>,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,
}

fn default_uri() -> Secret<String> {
    Secret::new("mongodb://localhost:27017".to_string())
}

fn default_database() -> String {
    "ims_database".to_string()
}

fn default_collection() -> String {
    "inventory".to_string()
}

fn default_operation_timeout_secs() -> u64 {
    10
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            database: default_database(),
            collection: default_collection(),
            operation_timeout_secs: default_operation_timeout_secs(),
        }
    }
}

impl MongoConfig {
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}

impl InventoryConfig {
    pub fn load() -> Result<Self, AppError> {
        let config: Self = core_config::load()?;
        if config.store.mongodb.operation_timeout_secs == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "store.mongodb.operation_timeout_secs must be greater than zero"
            )));
        }
        Ok(config)
    }

    /// In-memory configuration, used by tests and local runs without MongoDB.
    pub fn in_memory() -> Self {
        Self {
            common: core_config::Config {
                port: 0,
                ..core_config::Config::default()
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
                mongodb: MongoConfig::default(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn defaults_target_local_ims_database() {
        let config: InventoryConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.common.port, 9000);
        assert_eq!(config.store.backend, StoreBackend::Mongodb);
        assert_eq!(config.store.mongodb.database, "ims_database");
        assert_eq!(config.store.mongodb.collection, "inventory");
        assert_eq!(
            config.store.mongodb.uri.expose_secret(),
            "mongodb://localhost:27017"
        );
        assert_eq!(
            config.store.mongodb.operation_timeout(),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn nested_store_settings_override_defaults() {
        let config: InventoryConfig = serde_json::from_value(serde_json::json!({
            "port": 8080,
            "store": {
                "backend": "memory",
                "mongodb": { "database": "other", "operation_timeout_secs": 3 }
            }
        }))
        .unwrap();

        assert_eq!(config.common.port, 8080);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.mongodb.database, "other");
        assert_eq!(config.store.mongodb.collection, "inventory");
        assert_eq!(
            config.store.mongodb.operation_timeout(),
            Duration::from_secs(3)
        );
    }
}
