//! Watch persistence. Every status change in here is a single conditional `UPDATE`, so the row itself is the lock.
use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{ItemId, NewWatch, UserId, Watch, WatchId, WatchStatus, WatchTransition},
};

pub async fn insert_watch(watch: NewWatch, conn: &mut SqliteConnection) -> Result<Watch, SqliteDatabaseError> {
    let record = sqlx::query_as::<_, Watch>(
        r#"
            INSERT INTO watches (
                buyer_id,
                item_id,
                max_price,
                status,
                payment_authorized,
                payment_method_ref,
                auth_token_ref,
                authorized_amount,
                payment_expires_at,
                use_registered_address,
                recipient_name,
                recipient_phone,
                recipient_postal_code,
                recipient_region,
                recipient_city,
                recipient_address_line1,
                recipient_address_line2,
                delivery_time_slot,
                expires_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, 'active', 1, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $18)
            RETURNING *;
        "#,
    )
    .bind(watch.buyer_id)
    .bind(watch.item_id)
    .bind(watch.max_price)
    .bind(watch.payment.payment_method_ref)
    .bind(watch.payment.auth_token_ref)
    .bind(watch.payment.authorized_amount)
    .bind(watch.payment.expires_at)
    .bind(watch.use_registered_address)
    .bind(watch.recipient.name)
    .bind(watch.recipient.phone)
    .bind(watch.recipient.postal_code)
    .bind(watch.recipient.region)
    .bind(watch.recipient.city)
    .bind(watch.recipient.address_line1)
    .bind(watch.recipient.address_line2)
    .bind(watch.delivery_time_slot)
    .bind(watch.expires_at)
    .bind(watch.created_at)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Watch {} armed for {} on {} at {}", record.id, record.buyer_id, record.item_id, record.max_price);
    Ok(record)
}

pub async fn fetch_watch(id: WatchId, conn: &mut SqliteConnection) -> Result<Option<Watch>, SqliteDatabaseError> {
    let watch = sqlx::query_as::<_, Watch>("SELECT * FROM watches WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(watch)
}

pub async fn fetch_watches_for_buyer(
    buyer: UserId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Watch>, SqliteDatabaseError> {
    let watches = sqlx::query_as::<_, Watch>("SELECT * FROM watches WHERE buyer_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(buyer)
        .fetch_all(conn)
        .await?;
    Ok(watches)
}

pub async fn fetch_active_watches_for_item(
    item: ItemId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Watch>, SqliteDatabaseError> {
    let watches =
        sqlx::query_as::<_, Watch>("SELECT * FROM watches WHERE item_id = $1 AND status = 'active' ORDER BY id")
            .bind(item)
            .fetch_all(conn)
            .await?;
    Ok(watches)
}

pub async fn fetch_eligible_watches(
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Watch>, SqliteDatabaseError> {
    let watches = sqlx::query_as::<_, Watch>(
        r#"
            SELECT * FROM watches
            WHERE status = 'active' AND payment_authorized = 1 AND expires_at > $1
            ORDER BY item_id, id;
        "#,
    )
    .bind(now)
    .fetch_all(conn)
    .await?;
    trace!("🗃️ {} eligible watches at {now}", watches.len());
    Ok(watches)
}

/// Conditional status update. See [`crate::traits::WatchManagement::transition_watch`] for the contract.
pub async fn transition_watch(
    id: WatchId,
    expected: WatchStatus,
    transition: WatchTransition,
    conn: &mut SqliteConnection,
) -> Result<Watch, SqliteDatabaseError> {
    if !transition.is_well_formed() || expected.is_terminal() {
        return Err(SqliteDatabaseError::InvalidTransition(format!(
            "{id} cannot move from {expected} to {}",
            transition.status
        )));
    }
    let executed_at = (transition.status == WatchStatus::Executed).then_some(transition.at);
    let updated = sqlx::query_as::<_, Watch>(
        r#"
            UPDATE watches SET
                status = $1,
                order_id = COALESCE($2, order_id),
                executed_at = COALESCE($3, executed_at),
                lease_token = NULL,
                lease_expires_at = NULL,
                updated_at = $4
            WHERE id = $5 AND status = $6 AND (
                ($7 IS NOT NULL AND lease_token = $7) OR
                ($7 IS NULL AND (lease_token IS NULL OR lease_expires_at <= $4))
            )
            RETURNING *;
        "#,
    )
    .bind(transition.status)
    .bind(transition.order_id)
    .bind(executed_at)
    .bind(transition.at)
    .bind(id)
    .bind(expected)
    .bind(transition.lease_token.as_deref())
    .fetch_optional(&mut *conn)
    .await?;
    match updated {
        Some(watch) => {
            debug!("🗃️ Watch {id} moved from {expected} to {}", watch.status);
            Ok(watch)
        },
        None => match fetch_watch(id, conn).await? {
            Some(_) => Err(SqliteDatabaseError::StatusConflict { id, expected }),
            None => Err(SqliteDatabaseError::NotFound(id.to_string())),
        },
    }
}

pub async fn acquire_lease(
    id: WatchId,
    token: &str,
    now: DateTime<Utc>,
    until: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query(
        r#"
            UPDATE watches SET lease_token = $1, lease_expires_at = $2, updated_at = $3
            WHERE id = $4 AND status = 'active' AND (lease_token IS NULL OR lease_expires_at <= $3);
        "#,
    )
    .bind(token)
    .bind(until)
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    let acquired = result.rows_affected() == 1;
    trace!("🗃️ Lease on {id} {}", if acquired { "acquired" } else { "refused" });
    Ok(acquired)
}

pub async fn release_lease(id: WatchId, token: &str, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    sqlx::query("UPDATE watches SET lease_token = NULL, lease_expires_at = NULL WHERE id = $1 AND lease_token = $2")
        .bind(id)
        .bind(token)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn record_price_check(
    id: WatchId,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    sqlx::query("UPDATE watches SET last_checked_at = $1 WHERE id = $2").bind(at).bind(id).execute(conn).await?;
    Ok(())
}

pub async fn expire_watches(now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<Vec<Watch>, SqliteDatabaseError> {
    let expired = sqlx::query_as::<_, Watch>(
        r#"
            UPDATE watches SET status = 'expired', lease_token = NULL, lease_expires_at = NULL, updated_at = $1
            WHERE status = 'active' AND expires_at <= $1 AND (lease_token IS NULL OR lease_expires_at <= $1)
            RETURNING *;
        "#,
    )
    .bind(now)
    .fetch_all(conn)
    .await?;
    if !expired.is_empty() {
        debug!("🗃️ {} watches expired", expired.len());
    }
    Ok(expired)
}
