use chrono::Utc;
use log::debug;
use pw_common::Yen;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{ItemId, ItemSnapshot, ItemStatus, NewItem},
};

pub async fn insert_item(item: NewItem, conn: &mut SqliteConnection) -> Result<ItemSnapshot, SqliteDatabaseError> {
    let now = Utc::now();
    let record = sqlx::query_as::<_, ItemSnapshot>(
        r#"
            INSERT INTO items (seller_id, title, price, status, weight_kg, created_at, updated_at)
            VALUES ($1, $2, $3, 'active', $4, $5, $5)
            RETURNING id, seller_id, title, price, status, weight_kg;
        "#,
    )
    .bind(item.seller_id)
    .bind(item.title)
    .bind(item.price)
    .bind(item.weight_kg)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(record)
}

pub async fn fetch_item(id: ItemId, conn: &mut SqliteConnection) -> Result<Option<ItemSnapshot>, SqliteDatabaseError> {
    let item = sqlx::query_as::<_, ItemSnapshot>(
        "SELECT id, seller_id, title, price, status, weight_kg FROM items WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(item)
}

/// The single compare-and-swap that decides which watch gets the item.
pub async fn claim_item(id: ItemId, ceiling: Yen, conn: &mut SqliteConnection) -> Result<Option<Yen>, SqliteDatabaseError> {
    let price = sqlx::query_scalar::<_, Yen>(
        r#"
            UPDATE items SET status = 'sold', updated_at = $1
            WHERE id = $2 AND status = 'active' AND price <= $3
            RETURNING price;
        "#,
    )
    .bind(Utc::now())
    .bind(id)
    .bind(ceiling)
    .fetch_optional(conn)
    .await?;
    if let Some(p) = price {
        debug!("🗃️ {id} claimed at {p}");
    }
    Ok(price)
}

pub async fn set_item_price(id: ItemId, price: Yen, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    let result = sqlx::query("UPDATE items SET price = $1, updated_at = $2 WHERE id = $3")
        .bind(price)
        .bind(Utc::now())
        .bind(id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(SqliteDatabaseError::NotFound(id.to_string()));
    }
    debug!("🗃️ {id} repriced to {price}");
    Ok(())
}

pub async fn set_item_status(
    id: ItemId,
    status: ItemStatus,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    let result = sqlx::query("UPDATE items SET status = $1, updated_at = $2 WHERE id = $3")
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(SqliteDatabaseError::NotFound(id.to_string()));
    }
    Ok(())
}
