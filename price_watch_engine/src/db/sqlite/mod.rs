pub mod db;
mod errors;

pub mod anomalies;
pub mod audit;
pub mod catalog;
pub mod labels;
pub mod notifications;
pub mod orders;
pub mod users;
pub mod watches;

use std::{env, str::FromStr, time::Duration};

pub use errors::SqliteDatabaseError;
use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};

const SQLITE_DB_URL: &str = "sqlite://data/price_watch.db";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub fn db_url() -> String {
    let result = env::var("PW_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ PW_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

/// Opens a pool on the rollback journal with a busy timeout. Overlapping scan cycles wait on each other's writes
/// instead of failing with `SQLITE_BUSY`, and every read sees the last committed write.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqliteDatabaseError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Delete)
        .busy_timeout(BUSY_TIMEOUT)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
