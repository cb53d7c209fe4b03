use inventory_service::config::{InventoryConfig, StoreBackend};
use inventory_service::startup::Application;
use secrecy::Secret;
use uuid::Uuid;

pub const TEST_MONGODB_URI: &str = "mongodb://localhost:27017";

pub struct TestApp {
    pub address: String,
    pub db_name: String,
}

impl TestApp {
    /// Start the real server against a throwaway MongoDB database.
    pub async fn spawn() -> Self {
        let uri = std::env::var("MONGODB_URI").unwrap_or_else(|_| TEST_MONGODB_URI.to_string());
        let db_name = format!("inventory_test_{}", Uuid::new_v4().simple());

        let mut config = InventoryConfig::in_memory();
        config.common.host = "127.0.0.1".to_string();
        config.store.backend = StoreBackend::Mongodb;
        config.store.mongodb.uri = Secret::new(uri);
        config.store.mongodb.database = db_name.clone();

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let address = format!("http://127.0.0.1:{}", app.port());

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to accept connections
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            db_name,
        }
    }

    /// Drop the per-test database.
    pub async fn cleanup(&self) {
        let uri = std::env::var("MONGODB_URI").unwrap_or_else(|_| TEST_MONGODB_URI.to_string());
        if let Ok(client) = mongodb::Client::with_uri_str(&uri).await {
            let _ = client.database(&self.db_name).drop(None).await;
        }
    }
}
