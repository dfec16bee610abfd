#![allow(dead_code)]

use person_service::config::{MongoConfig, PersonConfig, TimeoutConfig};
use person_service::services::PersonDb;
use person_service::startup::{build_router, AppState, Application};
use service_core::config::Config as CoreConfig;
use std::time::Duration;

pub fn test_config(uri: &str) -> PersonConfig {
    PersonConfig {
        common: CoreConfig {
            port: 0, // Random port
            log_level: "info".to_string(),
        },
        mongodb: MongoConfig {
            uri: uri.to_string(),
            database: format!("person_test_{}", uuid::Uuid::new_v4().simple()),
            collection: "people".to_string(),
            app_name: "person-service-test".to_string(),
        },
        timeouts: TimeoutConfig::default(),
    }
}

/// Router over a lazily-connected client: fine for requests that are
/// rejected before they reach MongoDB.
pub async fn offline_router() -> axum::Router {
    router_for(test_config("mongodb://localhost:27017")).await
}

/// Router whose MongoDB is guaranteed unreachable, with short timeouts.
pub async fn unreachable_router() -> axum::Router {
    let mut config = test_config("mongodb://127.0.0.1:1/?directConnection=true");
    config.timeouts = TimeoutConfig {
        connect: Duration::from_millis(500),
        write: Duration::from_secs(5),
        read: Duration::from_secs(5),
    };
    router_for(config).await
}

async fn router_for(config: PersonConfig) -> axum::Router {
    let db = PersonDb::new(&config.mongodb, &config.timeouts)
        .await
        .expect("Failed to build MongoDB client");
    build_router(AppState { db })
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub db: PersonDb,
    pub database: mongodb::Database,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let uri = std::env::var("TEST_MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

        let config = test_config(&uri);
        let database = mongodb::Client::with_uri_str(&uri)
            .await
            .expect("Failed to create MongoDB client")
            .database(&config.mongodb.database);

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);
        let db = app.db().clone();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            db,
            database,
            client,
        }
    }

    pub async fn post_person(&self, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/person", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Create a person and return its id.
    pub async fn create_person(&self, body: serde_json::Value) -> String {
        let response = self.post_person(body).await;
        assert_eq!(response.status(), 201);
        let ack: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        ack["inserted_id"]
            .as_str()
            .expect("inserted_id missing")
            .to_string()
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub fn contact_url(&self, id: &str) -> String {
        format!("{}/person/{}/contact", self.address, id)
    }

    /// Drop the per-test database.
    pub async fn cleanup(&self) {
        self.database
            .drop(None)
            .await
            .expect("Failed to drop test database");
    }
}
