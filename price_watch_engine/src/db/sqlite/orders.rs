use chrono::Utc;
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{ItemId, NewOrder, Order, OrderId, WatchId},
};

/// Inserts the order for the watch unless one already exists, and returns whichever order is stored.
///
/// A retried call after a lost response therefore never creates a second order. An insert for an item that already
/// has an order from a different watch violates the `item_id` unique constraint and fails.
pub async fn idempotent_insert(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, SqliteDatabaseError> {
    let watch_id = order.watch_id;
    let result = sqlx::query(
        r#"
            INSERT INTO orders (
                watch_id,
                buyer_id,
                seller_id,
                item_id,
                price,
                status,
                payment_method_ref,
                recipient_name,
                recipient_phone,
                recipient_postal_code,
                recipient_region,
                recipient_city,
                recipient_address_line1,
                recipient_address_line2,
                delivery_time_slot,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $15)
            ON CONFLICT (watch_id) DO NOTHING;
        "#,
    )
    .bind(order.watch_id)
    .bind(order.buyer_id)
    .bind(order.seller_id)
    .bind(order.item_id)
    .bind(order.price)
    .bind(order.payment_method_ref)
    .bind(order.recipient.name)
    .bind(order.recipient.phone)
    .bind(order.recipient.postal_code)
    .bind(order.recipient.region)
    .bind(order.recipient.city)
    .bind(order.recipient.address_line1)
    .bind(order.recipient.address_line2)
    .bind(order.delivery_time_slot)
    .bind(order.created_at)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 0 {
        trace!("🗃️ Order for {watch_id} already exists. Returning the stored one");
    }
    let stored = fetch_order_for_watch(watch_id, conn)
        .await?
        .ok_or_else(|| SqliteDatabaseError::NotFound(format!("order for {watch_id}")))?;
    debug!("🗃️ {} stored for {watch_id} at {}", stored.id, stored.price);
    Ok(stored)
}

pub async fn fetch_order(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, SqliteDatabaseError> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_for_watch(
    watch_id: WatchId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE watch_id = $1")
        .bind(watch_id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_orders_for_item(item: ItemId, conn: &mut SqliteConnection) -> Result<Vec<Order>, SqliteDatabaseError> {
    let orders =
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE item_id = $1 ORDER BY id").bind(item).fetch_all(conn).await?;
    Ok(orders)
}

pub async fn attach_shipping_label(
    id: OrderId,
    label_ref: &str,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    let result = sqlx::query("UPDATE orders SET shipping_label_ref = $1, updated_at = $2 WHERE id = $3")
        .bind(label_ref)
        .bind(Utc::now())
        .bind(id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(SqliteDatabaseError::NotFound(id.to_string()));
    }
    Ok(())
}
