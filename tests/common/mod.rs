//! Common test utilities for E2E tests

use peerfeed::{AppState, auth::USER_ID_HEADER, config};
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
            },
            database: config::DatabaseConfig {
                path: db_path.clone(),
            },
            feed: config::FeedConfig {
                default_page_size: 10,
                max_page_size: 50,
                notifications_cap: 50,
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
        let app = peerfeed::build_router(state.clone());

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

    /// GET a path as the given (gateway-authenticated) user
    pub fn get_as(&self, user_id: &str, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).header(USER_ID_HEADER, user_id)
    }

    /// POST a JSON body as the given user
    pub fn post_as(
        &self,
        user_id: &str,
        path: &str,
        body: &serde_json::Value,
    ) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .header(USER_ID_HEADER, user_id)
            .json(body)
    }

    /// PATCH a JSON body as the given user
    pub fn patch_as(
        &self,
        user_id: &str,
        path: &str,
        body: &serde_json::Value,
    ) -> reqwest::RequestBuilder {
        self.client
            .patch(self.url(path))
            .header(USER_ID_HEADER, user_id)
            .json(body)
    }

    /// DELETE a path as the given user
    pub fn delete_as(&self, user_id: &str, path: &str) -> reqwest::RequestBuilder {
        self.client
            .delete(self.url(path))
            .header(USER_ID_HEADER, user_id)
    }

    /// Create a post directly in the database with a controlled timestamp
    pub async fn seed_post(
        &self,
        id: &str,
        author_id: &str,
        secs: i64,
        tags: &[&str],
    ) -> peerfeed::data::Post {
        use chrono::TimeZone;

        let at = chrono::Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap();
        let post = peerfeed::data::Post {
            id: id.to_string(),
            author_id: author_id.to_string(),
            content: format!("post {}", id),
            image_url: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: at,
            updated_at: at,
        };
        self.state.db.insert_post(&post).await.unwrap();
        post
    }

    /// Establish an accepted friendship between two users via the API
    pub async fn befriend(&self, a: &str, b: &str) {
        let response = self
            .post_as(a, "/friend-requests", &serde_json::json!({ "recipient_id": b }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        let request: serde_json::Value = response.json().await.unwrap();
        let request_id = request["id"].as_str().unwrap();

        let response = self
            .patch_as(
                b,
                &format!("/friend-requests/{}", request_id),
                &serde_json::json!({ "action": "accept" }),
            )
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }
}
