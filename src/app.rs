use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::{PipelineConfig, SecurityConfig};
use crate::database::store::DiscussionStore;
use crate::discussions::{routes, DiscussionPipelines};
use crate::views::ViewEngine;

/// Shared handler state. Pipelines are built once and reused by every request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DiscussionStore>,
    pub pipelines: Arc<DiscussionPipelines>,
    pub security: SecurityConfig,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DiscussionStore>,
        engine: Arc<dyn ViewEngine>,
        pipeline: &PipelineConfig,
        security: SecurityConfig,
    ) -> Self {
        let pipelines = DiscussionPipelines::new(store.clone(), engine, pipeline);
        Self {
            store,
            pipelines: Arc::new(pipelines),
            security,
        }
    }
}

pub fn app(state: AppState) -> Router {
    let enable_cors = state.security.enable_cors;

    let router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(routes::routes(state.clone()))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Discussion Board",
            "version": version,
            "description": "Discussion board request pipelines served over Axum",
            "endpoints": {
                "home": "/",
                "health": "/health",
                "index": "GET /discussions",
                "new": "GET /discussions/new",
                "create": "POST /discussions/create",
                "show": "GET /discussions/:id",
                "edit": "GET /discussions/:id/edit",
                "update": "PUT /discussions/:id/update",
                "delete": "DELETE /discussions/:id/delete",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "store": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "store unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "store_error": e.to_string()
                    }
                })),
            )
        }
    }
}
