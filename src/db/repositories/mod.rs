//! Database repositories
//!
//! Repository pattern implementations for database access.

pub mod page;

pub use page::{PageRepository, SqlxPageRepository};
