use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{NewAuditEntry, WatchAuditEntry, WatchId},
};

pub async fn append_entry(
    entry: NewAuditEntry,
    conn: &mut SqliteConnection,
) -> Result<WatchAuditEntry, SqliteDatabaseError> {
    let record = sqlx::query_as::<_, WatchAuditEntry>(
        r#"
            INSERT INTO watch_audit_log (
                watch_id,
                action,
                observed_price,
                success,
                error_message,
                execution_time_ms,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(entry.watch_id)
    .bind(entry.action)
    .bind(entry.observed_price)
    .bind(entry.success)
    .bind(entry.error_message)
    .bind(entry.execution_time_ms)
    .bind(entry.created_at)
    .fetch_one(conn)
    .await?;
    Ok(record)
}

pub async fn fetch_entries(
    watch_id: WatchId,
    conn: &mut SqliteConnection,
) -> Result<Vec<WatchAuditEntry>, SqliteDatabaseError> {
    let entries = sqlx::query_as::<_, WatchAuditEntry>(
        "SELECT * FROM watch_audit_log WHERE watch_id = $1 ORDER BY created_at, id",
    )
    .bind(watch_id)
    .fetch_all(conn)
    .await?;
    Ok(entries)
}
