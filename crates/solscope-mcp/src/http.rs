//! HTTP transport
//!
//! Serves the MCP handler on `POST /mcp` alongside a `GET /health` probe.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::tools::{handle_request, JsonRpcRequest, SolscopeTools};

pub fn create_router(tools: Arc<SolscopeTools>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/mcp", post(handle_mcp))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(tools)
}

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339()
    }))
}

async fn handle_mcp(
    State(tools): State<Arc<SolscopeTools>>,
    Json(request): Json<JsonRpcRequest>,
) -> Response {
    tracing::debug!(method = %request.method, "Received HTTP request");

    match handle_request(&tools, request).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

pub async fn serve(addr: SocketAddr, tools: Arc<SolscopeTools>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, create_router(tools)).await?;
    Ok(())
}
