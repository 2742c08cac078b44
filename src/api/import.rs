//! HTML import endpoints
//!
//! - `GET /admin/import`: the upload form, with the notice from the last import
//! - `POST /admin/import`: run one import, then redirect back to the form
//!
//! The POST handler always answers with a redirect carrying a
//! `(status, message)` pair unless storage itself is broken.

use axum::{
    extract::{
        multipart::{Field, MultipartRejection},
        Extension, Multipart, Query, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::api::middleware::{AdminAccess, ApiError, AppState};
use crate::models::{ImportFailure, UploadedFile};
use crate::services::{
    notice_params, resolve_notice, NoticeStatus, ALLOWED_EXTENSIONS, IMPORT_ACTION,
};
use crate::views::{ImportFormView, NoticeView};

/// Path of the import form, also the redirect target
pub const IMPORT_PATH: &str = "/admin/import";

/// Multipart field holding the HTML file
pub const FILE_FIELD: &str = "html_file";

/// Multipart field holding the anti-forgery nonce
pub const NONCE_FIELD: &str = "import_nonce";

pub fn router() -> Router<AppState> {
    Router::new().route(IMPORT_PATH, get(import_form).post(import_submit))
}

#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub status: Option<String>,
    pub message: Option<String>,
}

impl NoticeQuery {
    fn notice(&self) -> Option<NoticeView> {
        let status = self.status.as_deref()?.parse::<NoticeStatus>().ok()?;
        resolve_notice(status, self.message.as_deref().unwrap_or_default()).map(NoticeView::from)
    }
}

/// Fields received from the upload form
#[derive(Debug, Default)]
struct ImportForm {
    file: Option<UploadedFile>,
    nonce: Option<String>,
}

/// GET /admin/import - Render the upload form
async fn import_form(
    State(state): State<AppState>,
    Extension(access): Extension<AdminAccess>,
    Query(query): Query<NoticeQuery>,
) -> Result<Response, ApiError> {
    if !access.0 {
        let body = state
            .views
            .denied(ImportFailure::Permission.message())
            .map_err(|e| ApiError::internal_logged("Failed to render page", &e))?;
        return Ok((StatusCode::FORBIDDEN, Html(body)).into_response());
    }

    let nonce = state.nonce.create(IMPORT_ACTION);
    let accept = ALLOWED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{}", ext))
        .collect::<Vec<_>>()
        .join(",");

    let body = state
        .views
        .import_form(&ImportFormView {
            action: IMPORT_PATH,
            nonce: &nonce,
            nonce_field: NONCE_FIELD,
            file_field: FILE_FIELD,
            accept,
            notice: query.notice(),
        })
        .map_err(|e| ApiError::internal_logged("Failed to render page", &e))?;

    Ok(Html(body).into_response())
}

/// POST /admin/import - Import one HTML file
async fn import_submit(
    State(state): State<AppState>,
    Extension(access): Extension<AdminAccess>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Redirect, ApiError> {
    let form = match multipart {
        Ok(multipart) => read_import_form(multipart, state.upload_config.max_file_size).await,
        Err(rejection) => {
            tracing::debug!("Import request is not multipart: {}", rejection);
            ImportForm::default()
        }
    };

    let token_valid = form
        .nonce
        .as_deref()
        .map(|nonce| state.nonce.verify(IMPORT_ACTION, nonce))
        .unwrap_or(false);

    let result = state
        .importer
        .import(form.file, access.0, token_valid)
        .await
        // Already logged by the importer
        .map_err(|_| ApiError::internal_error(ImportFailure::Insert.message()))?;

    let (status, code) = notice_params(&result);
    Ok(Redirect::to(&notice_location(status, code)))
}

/// Where the browser lands after an import
pub fn notice_location(status: NoticeStatus, code: &str) -> String {
    format!(
        "{}?status={}&message={}",
        IMPORT_PATH,
        status.as_str(),
        urlencoding::encode(code)
    )
}

/// Read the nonce and file fields in whatever order they arrive.
///
/// The file is read chunk by chunk so an oversized upload is cut off at
/// `max_file_size` instead of being buffered whole. A problem with the file
/// is recorded on it and the remaining fields are still read; only a broken
/// multipart stream ends the loop.
async fn read_import_form(mut multipart: Multipart, max_file_size: u64) -> ImportForm {
    let mut form = ImportForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Failed to read multipart: {}", e);
                if form.file.is_none() {
                    form.file = Some(UploadedFile {
                        upload_error: Some(e.body_text()),
                        ..Default::default()
                    });
                }
                break;
            }
        };

        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some(NONCE_FIELD) => {
                form.nonce = field.text().await.ok();
            }
            Some(FILE_FIELD) => {
                form.file = Some(read_file_field(field, max_file_size).await);
            }
            _ => {}
        }
    }

    form
}

/// Receive one file field. Whatever is left of the field after an error is
/// skipped by the next `next_field` call.
async fn read_file_field(mut field: Field<'_>, max_file_size: u64) -> UploadedFile {
    let mut file = UploadedFile {
        name: field.file_name().unwrap_or_default().to_string(),
        ..Default::default()
    };

    if file.name.is_empty() {
        file.upload_error = Some("No file was uploaded".to_string());
        return file;
    }

    let mut buf = Vec::new();
    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                file.size_bytes += chunk.len() as u64;
                if file.size_bytes > max_file_size {
                    file.upload_error = Some(format!(
                        "File exceeds the maximum size of {} bytes",
                        max_file_size
                    ));
                    return file;
                }
                buf.extend_from_slice(&chunk);
            }
            Ok(None) => break,
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                file.upload_error = Some(e.body_text());
                return file;
            }
            Err(e) => {
                tracing::warn!(file = %file.name, "Failed to read upload: {}", e);
                return file;
            }
        }
    }

    file.bytes = Some(buf);
    file
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_location_success() {
        assert_eq!(
            notice_location(NoticeStatus::Success, "imported"),
            "/admin/import?status=success&message=imported"
        );
    }

    #[test]
    fn test_notice_location_error() {
        assert_eq!(
            notice_location(NoticeStatus::Error, "type"),
            "/admin/import?status=error&message=type"
        );
    }

    #[test]
    fn test_notice_query_resolves() {
        let query = NoticeQuery {
            status: Some("error".to_string()),
            message: Some("nonce".to_string()),
        };
        let notice = query.notice().expect("notice");
        assert_eq!(notice.css_class, "notice-error");
        assert_eq!(notice.message, ImportFailure::Nonce.message());
    }

    #[test]
    fn test_notice_query_ignores_unknown_status() {
        let query = NoticeQuery {
            status: Some("info".to_string()),
            message: Some("imported".to_string()),
        };
        assert!(query.notice().is_none());
        assert!(NoticeQuery::default().notice().is_none());
    }
}
