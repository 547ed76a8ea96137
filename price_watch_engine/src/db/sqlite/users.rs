use chrono::Utc;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{RecipientAddress, UserId, UserProfile},
};

const USER_COLUMNS: &str = "id, display_name, phone, postal_code, region, city, address_line1, address_line2";

pub async fn insert_user(
    address: RecipientAddress,
    conn: &mut SqliteConnection,
) -> Result<UserProfile, SqliteDatabaseError> {
    let sql = format!(
        r#"
            INSERT INTO users (display_name, phone, postal_code, region, city, address_line1, address_line2, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS};
        "#
    );
    let user = sqlx::query_as::<_, UserProfile>(&sql)
        .bind(address.name)
        .bind(address.phone)
        .bind(address.postal_code)
        .bind(address.region)
        .bind(address.city)
        .bind(address.address_line1)
        .bind(address.address_line2)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;
    Ok(user)
}

pub async fn fetch_user(id: UserId, conn: &mut SqliteConnection) -> Result<Option<UserProfile>, SqliteDatabaseError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let user = sqlx::query_as::<_, UserProfile>(&sql).bind(id).fetch_optional(conn).await?;
    Ok(user)
}
