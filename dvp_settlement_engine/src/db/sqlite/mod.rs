//! SQLite backend for the settlement record store.
mod db;

pub mod accounts;
pub mod settlements;

use std::env;

pub use db::SqliteDatabase;
use log::info;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::traits::StoreError;

const SQLITE_DB_URL: &str = "sqlite://data/dvp_store.db";

pub fn db_url() -> String {
    let result = env::var("DVP_DATABASE_URL").unwrap_or_else(|_| {
        info!("DVP_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

/// Sqlite offers no read-after-write guarantee across pooled connections, and the coordinator
/// relies on every pass seeing the transitions the previous pass committed. A single connection
/// keeps all reads on the connection that committed the last write.
pub async fn new_pool(url: &str) -> Result<SqlitePool, StoreError> {
    let pool = SqlitePoolOptions::new().max_connections(1).connect(url).await?;
    Ok(pool)
}
