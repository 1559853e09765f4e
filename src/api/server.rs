//! HTTP server implementation for the API

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use uuid::Uuid;

use super::{handlers, models::error_body, models::TickRequest};
use crate::config::Config;
use crate::orchestrator::Orchestrator;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub config: Arc<Config>,
}

/// Configure and start the HTTP server
pub async fn start_http_server(
    orchestrator: Arc<Orchestrator>,
    config: Arc<Config>,
    port: u16,
) -> Result<()> {
    info!("🚀 Starting HTTP server on port {}", port);

    let enable_cors = config.server.enable_cors;
    let app_state = AppState {
        orchestrator,
        config,
    };

    // Build the application with routes
    let mut app = Router::new()
        // Health check endpoints (both paths for compatibility)
        .route("/health", get(health_handler))
        .route("/api/health", get(health_handler))
        // Tick endpoint: one reap/evaluate/dispatch cycle per call
        .route("/api/process", post(process_handler))
        // Read-only course progress
        .route("/api/courses/:id/status", get(course_status_handler))
        // Add state and middleware
        .with_state(app_state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    if enable_cors {
        // The web UI polls this service directly from the browser
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);
        app = app.layer(cors);
    }

    // Bind and serve
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("🌐 API server listening on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check handler
async fn health_handler() -> impl IntoResponse {
    match handlers::health_check().await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(error_body(e.to_string())),
        )
            .into_response(),
    }
}

/// Tick invocation handler
async fn process_handler(
    State(state): State<AppState>,
    Json(request): Json<TickRequest>,
) -> impl IntoResponse {
    match handlers::process_course(&state.orchestrator, request.course_id, request.check_only)
        .await
    {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(error_body(e.to_string())),
        )
            .into_response(),
    }
}

/// Course status handler
async fn course_status_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match handlers::get_course_status(&state.orchestrator, id).await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(error_body(e.to_string())),
        )
            .into_response(),
    }
}
