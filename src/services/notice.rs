//! Post-redirect notices
//!
//! After an import the browser is redirected with a `(status, code)` pair in
//! the query string. [`resolve_notice`] turns that pair into the one message
//! shown above the upload form.

use serde::Serialize;

use crate::models::{ImportFailure, ImportResult};

/// Code sent with a successful import
pub const SUCCESS_CODE: &str = "imported";

pub const SUCCESS_MESSAGE: &str = "HTML file imported successfully.";

pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeStatus {
    Success,
    Error,
}

impl NoticeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for NoticeStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            _ => Err(anyhow::anyhow!("Invalid notice status: {}", s)),
        }
    }
}

/// A message ready to be rendered (escaping is up to the renderer)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub status: NoticeStatus,
    pub message: &'static str,
}

impl Notice {
    pub fn css_class(&self) -> &'static str {
        match self.status {
            NoticeStatus::Success => "notice-success",
            NoticeStatus::Error => "notice-error",
        }
    }
}

/// Map a redirect `(status, code)` pair to the message to display.
///
/// Every error code yields a message; unknown ones get the generic text.
/// Success with any code other than [`SUCCESS_CODE`] yields nothing.
pub fn resolve_notice(status: NoticeStatus, code: &str) -> Option<Notice> {
    let message = match status {
        NoticeStatus::Success if code == SUCCESS_CODE => SUCCESS_MESSAGE,
        NoticeStatus::Success => return None,
        NoticeStatus::Error => code
            .parse::<ImportFailure>()
            .map(ImportFailure::message)
            .unwrap_or(UNKNOWN_ERROR_MESSAGE),
    };

    Some(Notice { status, message })
}

/// The `(status, code)` pair to redirect with after an import
pub fn notice_params(result: &ImportResult) -> (NoticeStatus, &'static str) {
    match result {
        ImportResult::Success { .. } => (NoticeStatus::Success, SUCCESS_CODE),
        ImportResult::Failure(reason) => (NoticeStatus::Error, reason.code()),
    }
}
