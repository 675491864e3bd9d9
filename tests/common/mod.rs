//! Common test utilities for E2E tests

use chrono::Utc;
use cliptube::auth::hash_password;
use cliptube::data::{EntityId, User};
use cliptube::{AppState, build_router, config};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        // Create test configuration
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                domain: "test.example.com".to_string(),
                protocol: "http".to_string(),
                request_timeout_seconds: 10,
                max_body_bytes: 8 * 1024 * 1024,
            },
            database: config::DatabaseConfig {
                path: db_path.clone(),
            },
            storage: config::StorageConfig {
                bucket: "test-media".to_string(),
                public_url: "https://media.test.example.com".to_string(),
                endpoint: "https://storage.test.example.com".to_string(),
                access_key_id: "test-key".to_string(),
                secret_access_key: "test-secret".to_string(),
            },
            auth: config::AuthConfig {
                token_secret: "test-secret-key-32-bytes-long!!!".to_string(),
                access_token_ttl: 900,
                refresh_token_ttl: 604800,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        // Build router
        let app = build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Seed a user directly in the database
    ///
    /// Registration goes through media storage for the avatar upload, so
    /// E2E tests that only need an authenticated user insert one here and
    /// log in over HTTP.
    pub async fn create_test_user(&self, username: &str, password: &str) -> User {
        let now = Utc::now();
        let user = User {
            id: EntityId::new().0,
            username: username.to_string(),
            email: format!("{username}@test.example.com"),
            display_name: format!("{username} display"),
            avatar_url: "https://media.test.example.com/avatars/test.png".to_string(),
            cover_image_url: None,
            password_hash: hash_password(password).unwrap(),
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        self.state.db.insert_user(&user).await.unwrap();
        user
    }

    /// Log in over HTTP and return the session body as JSON
    pub async fn login(&self, identifier: &str, password: &str) -> serde_json::Value {
        let response = self
            .client
            .post(self.url("/api/v1/users/login"))
            .json(&serde_json::json!({
                "identifier": identifier,
                "password": password,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        response.json().await.unwrap()
    }

    /// Seed a user and return a bearer token for them
    pub async fn create_authenticated_user(&self, username: &str) -> (User, String) {
        let user = self.create_test_user(username, "sufficiently-long-pass").await;
        let session = self.login(username, "sufficiently-long-pass").await;
        let token = session["data"]["access_token"]
            .as_str()
            .unwrap()
            .to_string();
        (user, token)
    }
}
