//! Database layer
//!
//! Persistence for content tables plus the read side of users and sessions.
//! SQLite is the default backend; MySQL is selected through configuration.
//!
//! ```ignore
//! use viewkit::config::DatabaseConfig;
//! use viewkit::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
