//! API layer - HTTP handlers and routing
//!
//! - Import form and upload handling (`/admin/import`)
//! - Admin page listing (`/api/v1/admin/pages`)
//! - Published page rendering (`/pages/{slug}`)
//! - Health check (`/health`)

pub mod import;
pub mod middleware;
pub mod pages;

use axum::{extract::DefaultBodyLimit, middleware as axum_middleware, Router};
use tower_http::trace::TraceLayer;

pub use middleware::{AdminAccess, ApiError, AppState};

/// Room left in the request body for the nonce field and multipart framing
const FORM_OVERHEAD: usize = 64 * 1024;

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.upload_config.max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(FORM_OVERHEAD);

    Router::new()
        .merge(import::router())
        .nest("/api/v1", pages::admin_router())
        .merge(pages::public_router())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::resolve_admin_access,
        ))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
