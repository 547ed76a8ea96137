use chrono::Utc;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{Notification, NotificationKind, UserId},
};

pub async fn insert_notification(
    user: UserId,
    kind: NotificationKind,
    title: &str,
    body: &str,
    conn: &mut SqliteConnection,
) -> Result<Notification, SqliteDatabaseError> {
    let record = sqlx::query_as::<_, Notification>(
        r#"
            INSERT INTO notifications (user_id, kind, title, body, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(user)
    .bind(kind)
    .bind(title)
    .bind(body)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    Ok(record)
}

pub async fn fetch_notifications_for_user(
    user: UserId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Notification>, SqliteDatabaseError> {
    let notifications = sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE user_id = $1 ORDER BY id")
        .bind(user)
        .fetch_all(conn)
        .await?;
    Ok(notifications)
}
