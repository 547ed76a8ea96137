use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{NewAnomaly, ReconciliationAnomaly},
};

pub async fn insert_anomaly(
    anomaly: NewAnomaly,
    conn: &mut SqliteConnection,
) -> Result<ReconciliationAnomaly, SqliteDatabaseError> {
    let record = sqlx::query_as::<_, ReconciliationAnomaly>(
        r#"
            INSERT INTO reconciliation_queue (watch_id, item_id, order_id, reason, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(anomaly.watch_id)
    .bind(anomaly.item_id)
    .bind(anomaly.order_id)
    .bind(anomaly.reason)
    .bind(anomaly.created_at)
    .fetch_one(conn)
    .await?;
    Ok(record)
}

pub async fn fetch_unresolved(conn: &mut SqliteConnection) -> Result<Vec<ReconciliationAnomaly>, SqliteDatabaseError> {
    let anomalies = sqlx::query_as::<_, ReconciliationAnomaly>(
        "SELECT * FROM reconciliation_queue WHERE resolved_at IS NULL ORDER BY id",
    )
    .fetch_all(conn)
    .await?;
    Ok(anomalies)
}
