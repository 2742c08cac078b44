//! Data models
//!
//! - `Page`: the stored page record
//! - Import types: the uploaded file, the extracted document and the
//!   import outcome

mod import;
mod page;

pub use import::{ImportFailure, ImportResult, ParsedDocument, UploadedFile};
pub use page::{Page, PageStatus, PageType};
