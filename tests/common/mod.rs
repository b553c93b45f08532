#![allow(dead_code)]

use std::sync::{Arc, Once};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use discussion_board::auth::{generate_jwt, Claims};
use discussion_board::config::{PipelineConfig, SecurityConfig};
use discussion_board::database::models::{Discussion, User};
use discussion_board::database::{DiscussionStore, Expand, MemoryStore};
use discussion_board::testing::TestContext;
use discussion_board::views::JsonViewEngine;
use discussion_board::{app, AppState};
use tracing_subscriber::EnvFilter;

pub use discussion_board::testing::FailingStore;

pub const SECRET: &str = "integration-secret";

pub fn security() -> SecurityConfig {
    SecurityConfig {
        enable_cors: false,
        jwt_secret: SECRET.to_string(),
        jwt_expiry_hours: 1,
    }
}

static TRACING: Once = Once::new();

/// Route test logs through the test harness; `RUST_LOG` raises the level
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
            .with_test_writer()
            .try_init();
    });
}

/// Build the full router around any store
pub fn router(store: Arc<dyn DiscussionStore>, pipeline: &PipelineConfig) -> Router {
    init_tracing();
    let state = AppState::new(store, Arc::new(JsonViewEngine::new()), pipeline, security());
    app(state)
}

/// In-process application over a memory store with one registered user
pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub user: User,
    pub token: String,
    fixture: TestContext,
}

impl TestApp {
    pub async fn spawn() -> Result<Self> {
        Self::with_config(PipelineConfig::default()).await
    }

    pub async fn with_config(pipeline: PipelineConfig) -> Result<Self> {
        let fixture = TestContext::new().await;
        let token = generate_jwt(&Claims::new(fixture.user.id, fixture.user.name.clone(), 1), SECRET)
            .context("failed to sign test token")?;

        Ok(Self {
            router: router(fixture.store(), &pipeline),
            store: fixture.memory.clone(),
            user: fixture.user.clone(),
            token,
            fixture,
        })
    }

    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        send(&self.router, request).await
    }

    pub async fn get(&self, path: &str) -> Result<TestResponse> {
        self.send(request(Method::GET, path, None, None)?).await
    }

    /// Send a JSON body as the fixture user
    pub async fn send_json(&self, method: Method, path: &str, body: Value) -> Result<TestResponse> {
        self.send(request(method, path, Some(body), Some(&self.token))?).await
    }

    pub async fn delete(&self, path: &str) -> Result<TestResponse> {
        self.send(request(Method::DELETE, path, None, Some(&self.token))?).await
    }

    /// Insert a discussion authored by the fixture user, bypassing HTTP
    pub async fn seed(&self, title: &str) -> Result<Discussion> {
        Ok(self.fixture.seed(title).await)
    }

    pub async fn stored(&self, id: Uuid) -> Result<Discussion> {
        self.store
            .find_by_id(&id.to_string(), Expand::NONE)
            .await?
            .context("discussion should exist")
    }

    /// Poll until the stored views counter reaches `expected`
    pub async fn wait_for_views(&self, id: Uuid, expected: i64) -> Result<i64> {
        let mut views = self.stored(id).await?.views;
        for _ in 0..100 {
            if views == expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
            views = self.stored(id).await?.views;
        }
        Ok(views)
    }
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: Value,
}

pub fn request(method: Method, path: &str, body: Option<Value>, token: Option<&str>) -> Result<Request<Body>> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };
    Ok(request)
}

pub async fn send(router: &Router, request: Request<Body>) -> Result<TestResponse> {
    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).context("response body should be JSON")?
    };

    Ok(TestResponse { status, location, body })
}
