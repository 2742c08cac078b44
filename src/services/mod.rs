//! Services layer - business logic
//!
//! - `importer`: validation, extraction and storage of uploaded HTML files
//! - `notice`: redirect `(status, code)` pairs to user-facing messages
//! - `page`: page creation with unique slugs, page lookups
//! - `nonce`: action-scoped anti-forgery tokens
//! - `auth`: admin token hashing and checking
//! - `sanitize`: text, file name and HTML cleaning

pub mod auth;
pub mod importer;
pub mod nonce;
pub mod notice;
pub mod page;
pub mod sanitize;

pub use auth::{hash_token, verify_token, AdminAuthorizer};
pub use importer::{
    extract, is_extension_allowed, Importer, PageStore, StoreError, ALLOWED_EXTENSIONS,
    DEFAULT_TITLE,
};
pub use nonce::{NonceService, IMPORT_ACTION};
pub use notice::{notice_params, resolve_notice, Notice, NoticeStatus};
pub use page::{generate_slug, PageService};
