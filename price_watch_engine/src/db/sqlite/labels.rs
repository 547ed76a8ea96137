use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{LabelRequest, OrderId, ShippingLabel},
};

pub const CARRIER: &str = "yamato";

fn new_label_ref() -> String {
    format!("LBL-{:016x}", rand::random::<u64>())
}

/// Writes a label for the order and returns it. The reference is random and opaque.
pub async fn insert_label(request: &LabelRequest, conn: &mut SqliteConnection) -> Result<ShippingLabel, SqliteDatabaseError> {
    let sender = &request.sender;
    let sender_address = [&sender.region, &sender.city, &sender.address_line1, &sender.address_line2]
        .into_iter()
        .filter(|s| !s.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");
    let recipient = &request.recipient;
    let label = sqlx::query_as::<_, ShippingLabel>(
        r#"
            INSERT INTO shipping_labels (
                label_ref,
                order_id,
                carrier,
                package_size,
                weight_kg,
                sender_name,
                sender_postal_code,
                sender_address,
                recipient_name,
                recipient_phone,
                recipient_postal_code,
                recipient_region,
                recipient_city,
                recipient_address_line1,
                recipient_address_line2,
                delivery_time_slot,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING *;
        "#,
    )
    .bind(new_label_ref())
    .bind(request.order_id)
    .bind(CARRIER)
    .bind(request.package_size())
    .bind(request.parcel_weight_kg)
    .bind(&sender.name)
    .bind(&sender.postal_code)
    .bind(sender_address)
    .bind(&recipient.name)
    .bind(&recipient.phone)
    .bind(&recipient.postal_code)
    .bind(&recipient.region)
    .bind(&recipient.city)
    .bind(&recipient.address_line1)
    .bind(&recipient.address_line2)
    .bind(request.delivery_time_slot.as_deref())
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Label {} ({} size {}) issued for {}", label.label_ref, label.carrier, label.package_size, label.order_id);
    Ok(label)
}

pub async fn fetch_label_for_order(
    order_id: OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<ShippingLabel>, SqliteDatabaseError> {
    let label = sqlx::query_as::<_, ShippingLabel>("SELECT * FROM shipping_labels WHERE order_id = $1")
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    Ok(label)
}
