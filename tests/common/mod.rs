#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;
use uuid::Uuid;

use notes_api_rust::auth::{generate_jwt, sign_claims, Claims};
use notes_api_rust::config::AppConfig;
use notes_api_rust::state::AppState;
use notes_api_rust::store::MemoryNoteStore;

pub const TEST_SECRET: &str = "integration-test-secret";

/// An in-process server on a free port, backed by the memory store.
///
/// Each test gets its own server: a `#[tokio::test]` runtime is torn down when
/// the test ends, taking any spawned server with it.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub store: Arc<MemoryNoteStore>,
    pub config: AppConfig,
    pub client: reqwest::Client,
}

impl TestServer {
    async fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let config = AppConfig::from_lookup(|key| match key {
            "JWT_SECRET" => Some(TEST_SECRET.to_string()),
            "APP_ENV" => Some("development".to_string()),
            _ => None,
        })?;

        let store = Arc::new(MemoryNoteStore::new());
        let app = notes_api_rust::app(AppState::new(config.clone(), store.clone()));

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind {}", base_url))?;

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            port,
            base_url,
            store,
            config,
            client: reqwest::Client::new(),
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/api/health", self.base_url);
            if let Ok(resp) = self.client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// A valid token for `user`, signed with the server's secret.
    pub fn token_for(&self, user: Uuid) -> String {
        generate_jwt(&self.config.security, user).expect("sign test token")
    }

    /// A token for `user` whose expiry is already in the past.
    pub fn expired_token_for(&self, user: Uuid) -> String {
        let mut claims = Claims::new(user, 1).expect("build claims");
        claims.exp = chrono::Utc::now().timestamp() - 60;
        sign_claims(&self.config.security, &claims).expect("sign expired token")
    }

    pub fn get(&self, path: &str, user: Uuid) -> RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(self.token_for(user))
    }

    pub fn post(&self, path: &str, user: Uuid) -> RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(self.token_for(user))
    }

    pub fn put(&self, path: &str, user: Uuid) -> RequestBuilder {
        self.client.put(self.url(path)).bearer_auth(self.token_for(user))
    }

    pub fn delete(&self, path: &str, user: Uuid) -> RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(self.token_for(user))
    }

    /// Create a note for `user` and return its id.
    pub async fn create_note(&self, user: Uuid, body: Value) -> Result<String> {
        let res = self.post("/api/notes", user).json(&body).send().await?;
        anyhow::ensure!(
            res.status() == StatusCode::CREATED,
            "create failed with {}",
            res.status()
        );
        let body = res.json::<Value>().await?;
        body["data"]["note"]["id"]
            .as_str()
            .map(str::to_string)
            .context("create response missing note id")
    }
}

pub async fn spawn_server() -> Result<TestServer> {
    let server = TestServer::spawn().await?;
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}
