use chrono::{Duration, Utc};
use log::*;
use pw_common::Yen;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::{
    db_types::{ItemSnapshot, NewItem, PaymentAuthorization, RecipientAddress, UserId, UserProfile},
    events::EventProducers,
    pw_api::{pipeline::ClaimPipeline, scanner::PriceScanner, watch_objects::ScanConfig},
    MockPreAuthGateway,
    SqliteDatabase,
    WatchFlowApi,
};
pub use crate::{SqliteScanner, SqliteWatchApi};

/// Creates a fresh database at `url`, runs the migrations and returns a handle to it.
pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    let db = SqliteDatabase::new_with_url(url, 25).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    db
}

pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/pw_test_store_{:x}.db", dir.display(), rand::random::<u64>())
}

pub async fn create_database(url: &str) {
    if Sqlite::database_exists(url).await.unwrap_or(false) {
        if let Err(e) = Sqlite::drop_database(url).await {
            warn!("Error dropping database {url}: {e:?}");
        }
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("Created Sqlite database {url}");
}

pub fn sqlite_scanner(db: &SqliteDatabase, producers: EventProducers, config: ScanConfig) -> SqliteScanner {
    let pipeline = ClaimPipeline::new(db.clone(), db.clone(), db.clone(), db.clone(), db.clone(), producers, config);
    PriceScanner::new(pipeline)
}

pub fn sqlite_watch_api(db: &SqliteDatabase) -> SqliteWatchApi {
    let policy = ScanConfig::default().policy;
    WatchFlowApi::new(db.clone(), db.clone(), db.clone(), MockPreAuthGateway::new(), db.clone(), policy)
}

pub fn test_address(name: &str) -> RecipientAddress {
    RecipientAddress {
        name: name.to_string(),
        phone: "090-1234-5678".into(),
        postal_code: "150-0001".into(),
        region: "Tokyo".into(),
        city: "Shibuya-ku".into(),
        address_line1: "1-2-3 Jingumae".into(),
        address_line2: String::new(),
    }
}

/// A valid authorization for `amount` that lasts a month.
pub fn test_authorization(amount: i64) -> PaymentAuthorization {
    PaymentAuthorization {
        payment_method_ref: format!("pm_test_{:x}", rand::random::<u64>()),
        auth_token_ref: format!("auth_test_{:x}", rand::random::<u64>()),
        authorized_amount: Yen::from(amount),
        expires_at: Utc::now() + Duration::days(30),
    }
}

pub async fn seed_user(db: &SqliteDatabase, name: &str) -> UserProfile {
    db.insert_user(test_address(name)).await.expect("Error inserting user")
}

pub async fn seed_item(db: &SqliteDatabase, seller: UserId, title: &str, price: i64) -> ItemSnapshot {
    db.insert_item(NewItem::new(seller, title, Yen::from(price)).with_weight(3.5)).await.expect("Error inserting item")
}
