//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The JSON error type used by API handlers
//! - Admin access resolution (token from header or cookie)

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::UploadConfig;
use crate::services::{AdminAuthorizer, Importer, NonceService, PageService};
use crate::views::Views;

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: crate::db::DynDatabasePool,
    pub page_service: Arc<PageService>,
    pub importer: Arc<Importer>,
    pub nonce: Arc<NonceService>,
    pub authorizer: Arc<AdminAuthorizer>,
    pub views: Arc<Views>,
    pub upload_config: Arc<UploadConfig>,
}

/// Whether the current request carries a valid admin token.
///
/// Inserted into request extensions by [`resolve_admin_access`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdminAccess(pub bool);

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    /// Log `err` in full and answer with `message` only, so driver and
    /// template details stay out of the response body.
    pub fn internal_logged(message: &'static str, err: &anyhow::Error) -> Self {
        tracing::error!("{}: {:#}", message, err);
        Self::internal_error(message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new("UNAVAILABLE", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "UNAVAILABLE" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

/// Extract the admin token from a `Bearer` header or a `session` cookie.
/// The header wins when both are present.
fn extract_token(request: &Request) -> Option<String> {
    if let Some(auth_header) = request.headers().get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = request.headers().get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("session=") {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}

/// Resolve admin access once per request and store it as [`AdminAccess`].
///
/// Never rejects; handlers decide what an unauthorized caller gets.
pub async fn resolve_admin_access(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = extract_token(&request);
    let authorizer = state.authorizer.clone();

    let allowed = match token {
        // Argon2 verification is CPU-bound
        Some(token) => tokio::task::spawn_blocking(move || authorizer.is_authorized(Some(&token)))
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Admin token check panicked: {}", e);
                false
            }),
        None => false,
    };

    request.extensions_mut().insert(AdminAccess(allowed));
    next.run(request).await
}
