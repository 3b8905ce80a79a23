//! HTTP API for the daylist server.
//!
//! Axum router over the storage seam plus the Glean client. Every handler
//! is a stateless unit of work; errors surface as `{"error": ...}` JSON.

pub mod glean;
pub mod settings;
pub mod todos;

use axum::body::Bytes;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::glean::GleanClient;
use crate::store::TodoStore;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn TodoStore>,
    glean: GleanClient,
}

impl AppState {
    pub fn new(store: Arc<dyn TodoStore>, glean: GleanClient) -> Self {
        Self { store, glean }
    }

    pub fn store(&self) -> &Arc<dyn TodoStore> {
        &self.store
    }

    pub fn glean(&self) -> &GleanClient {
        &self.glean
    }
}

/// Parse a request body as loose JSON. Empty bodies read as `null`;
/// malformed bodies are a validation error (400), not axum's default 422.
pub(crate) fn parse_body(bytes: &Bytes) -> ApiResult<Value> {
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes)
        .map_err(|e| ApiError::Validation(format!("invalid JSON body: {}", e)))
}

/// Health check endpoint.
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

/// Build the router with all routes.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Task routes
        .route("/api/todos", get(todos::list).post(todos::create))
        .route(
            "/api/todos/{id}",
            patch(todos::update).delete(todos::remove),
        )
        .route("/api/todos/{id}/children", post(todos::add_child))
        // Settings routes
        .route(
            "/api/settings/{key}",
            get(settings::get_by_key).put(settings::put_by_key),
        )
        // Glean integration routes
        .route(
            "/api/glean/config",
            get(glean::get_config).post(glean::put_config),
        )
        .route("/api/glean/search", post(glean::search))
        .route("/api/health", get(health))
        // Add middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until ctrl-c.
pub async fn start_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("daylist listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("daylist shutting down");
}
