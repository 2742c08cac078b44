//! Page endpoints
//!
//! - `GET /api/v1/admin/pages`: every stored page, admin only
//! - `GET /pages/{slug}`: a published page rendered as HTML
//! - `GET /health`: database liveness

use axum::{
    extract::{Extension, Path, State},
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::api::middleware::{AdminAccess, ApiError, AppState};
use crate::models::Page;

pub fn admin_router() -> Router<AppState> {
    Router::new().route("/admin/pages", get(list_pages))
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/pages/{slug}", get(show_page))
        .route("/health", get(health))
}

#[derive(Serialize)]
struct PagesResponse {
    pages: Vec<Page>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn list_pages(
    State(state): State<AppState>,
    Extension(access): Extension<AdminAccess>,
) -> Result<impl IntoResponse, ApiError> {
    if !access.0 {
        return Err(ApiError::forbidden("Admin access required"));
    }
    let pages = state
        .page_service
        .list()
        .await
        .map_err(|e| ApiError::internal_logged("Failed to load pages", &e))?;
    Ok(Json(PagesResponse { pages }))
}

async fn show_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .page_service
        .get_published_by_slug(&slug)
        .await
        .map_err(|e| ApiError::internal_logged("Failed to load page", &e))?
        .ok_or_else(|| ApiError::not_found("Page not found"))?;

    let body = state
        .views
        .page(&page)
        .map_err(|e| ApiError::internal_logged("Failed to render page", &e))?;
    Ok(Html(body))
}

async fn health(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    state.pool.ping().await.map_err(|e| {
        tracing::warn!("Health check failed: {:#}", e);
        ApiError::unavailable("Database unavailable")
    })?;
    Ok(Json(HealthResponse { status: "ok" }))
}
