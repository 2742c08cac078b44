//! Database layer
//!
//! Pages are stored in SQLite (default) or MySQL, selected by
//! `database.driver`. Repositories work against the `DatabasePool` trait
//! and dispatch to the backend-specific queries.
//!
//! ```ignore
//! let pool = db::create_pool(&config.database).await?;
//! db::migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
