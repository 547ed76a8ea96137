use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use pw_common::Yen;
use sqlx::{migrate, pool::PoolConnection, Sqlite, SqlitePool};

use super::{
    anomalies,
    audit,
    catalog,
    db_url,
    labels,
    new_pool,
    notifications,
    orders,
    users,
    watches,
    SqliteDatabaseError,
};
use crate::{
    db_types::{
        ItemId,
        ItemSnapshot,
        ItemStatus,
        LabelRequest,
        NewAnomaly,
        NewAuditEntry,
        NewItem,
        NewOrder,
        NewWatch,
        Notification,
        NotificationKind,
        Order,
        OrderId,
        RecipientAddress,
        ReconciliationAnomaly,
        ShippingLabel,
        UserId,
        UserProfile,
        Watch,
        WatchAuditEntry,
        WatchId,
        WatchStatus,
        WatchTransition,
    },
    traits::{
        AuditLog,
        Catalog,
        CollaboratorError,
        NotificationSink,
        OrderManagement,
        ReconciliationQueue,
        ShippingLabelGenerator,
        StoreError,
        UserDirectory,
        WatchManagement,
    },
};

/// One SQLite file backing every storage trait, and also standing in for the catalog, the user directory, the label
/// generator and the notification sink when the server runs stand-alone.
#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using `PW_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<(), SqliteDatabaseError> {
        migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete");
        Ok(())
    }

    async fn conn(&self) -> Result<PoolConnection<Sqlite>, SqliteDatabaseError> {
        Ok(self.pool.acquire().await?)
    }

    pub async fn insert_item(&self, item: NewItem) -> Result<ItemSnapshot, SqliteDatabaseError> {
        let mut conn = self.conn().await?;
        catalog::insert_item(item, &mut conn).await
    }

    pub async fn set_item_price(&self, id: ItemId, price: Yen) -> Result<(), SqliteDatabaseError> {
        let mut conn = self.conn().await?;
        catalog::set_item_price(id, price, &mut conn).await
    }

    pub async fn set_item_status(&self, id: ItemId, status: ItemStatus) -> Result<(), SqliteDatabaseError> {
        let mut conn = self.conn().await?;
        catalog::set_item_status(id, status, &mut conn).await
    }

    /// Registers a user whose profile address is `address`. The address name becomes the display name.
    pub async fn insert_user(&self, address: RecipientAddress) -> Result<UserProfile, SqliteDatabaseError> {
        let mut conn = self.conn().await?;
        users::insert_user(address, &mut conn).await
    }

    pub async fn fetch_notifications_for_user(&self, user: UserId) -> Result<Vec<Notification>, SqliteDatabaseError> {
        let mut conn = self.conn().await?;
        notifications::fetch_notifications_for_user(user, &mut conn).await
    }

    pub async fn fetch_orders_for_item(&self, item: ItemId) -> Result<Vec<Order>, SqliteDatabaseError> {
        let mut conn = self.conn().await?;
        orders::fetch_orders_for_item(item, &mut conn).await
    }

    pub async fn fetch_shipping_label(&self, order: OrderId) -> Result<Option<ShippingLabel>, SqliteDatabaseError> {
        let mut conn = self.conn().await?;
        labels::fetch_label_for_order(order, &mut conn).await
    }
}

impl WatchManagement for SqliteDatabase {
    async fn insert_watch(&self, watch: NewWatch) -> Result<Watch, StoreError> {
        let mut conn = self.conn().await?;
        Ok(watches::insert_watch(watch, &mut conn).await?)
    }

    async fn fetch_watch(&self, id: WatchId) -> Result<Option<Watch>, StoreError> {
        let mut conn = self.conn().await?;
        Ok(watches::fetch_watch(id, &mut conn).await?)
    }

    async fn fetch_watches_for_buyer(&self, buyer: UserId) -> Result<Vec<Watch>, StoreError> {
        let mut conn = self.conn().await?;
        Ok(watches::fetch_watches_for_buyer(buyer, &mut conn).await?)
    }

    async fn fetch_active_watches_for_item(&self, item: ItemId) -> Result<Vec<Watch>, StoreError> {
        let mut conn = self.conn().await?;
        Ok(watches::fetch_active_watches_for_item(item, &mut conn).await?)
    }

    async fn fetch_eligible_watches(&self, now: DateTime<Utc>) -> Result<Vec<Watch>, StoreError> {
        let mut conn = self.conn().await?;
        Ok(watches::fetch_eligible_watches(now, &mut conn).await?)
    }

    async fn transition_watch(
        &self,
        id: WatchId,
        expected: WatchStatus,
        transition: WatchTransition,
    ) -> Result<Watch, StoreError> {
        let mut conn = self.conn().await?;
        Ok(watches::transition_watch(id, expected, transition, &mut conn).await?)
    }

    async fn acquire_lease(
        &self,
        id: WatchId,
        token: &str,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn().await?;
        Ok(watches::acquire_lease(id, token, now, until, &mut conn).await?)
    }

    async fn release_lease(&self, id: WatchId, token: &str) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        Ok(watches::release_lease(id, token, &mut conn).await?)
    }

    async fn record_price_check(&self, id: WatchId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        Ok(watches::record_price_check(id, at, &mut conn).await?)
    }

    async fn expire_watches(&self, now: DateTime<Utc>) -> Result<Vec<Watch>, StoreError> {
        let mut conn = self.conn().await?;
        Ok(watches::expire_watches(now, &mut conn).await?)
    }
}

impl AuditLog for SqliteDatabase {
    async fn append_audit_entry(&self, entry: NewAuditEntry) -> Result<WatchAuditEntry, StoreError> {
        let mut conn = self.conn().await?;
        Ok(audit::append_entry(entry, &mut conn).await?)
    }

    async fn fetch_audit_entries(&self, watch: WatchId) -> Result<Vec<WatchAuditEntry>, StoreError> {
        let mut conn = self.conn().await?;
        Ok(audit::fetch_entries(watch, &mut conn).await?)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn create_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut conn = self.conn().await?;
        Ok(orders::idempotent_insert(order, &mut conn).await?)
    }

    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let mut conn = self.conn().await?;
        Ok(orders::fetch_order(id, &mut conn).await?)
    }

    async fn attach_shipping_label(&self, id: OrderId, label_ref: &str) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        Ok(orders::attach_shipping_label(id, label_ref, &mut conn).await?)
    }
}

impl ReconciliationQueue for SqliteDatabase {
    async fn record_anomaly(&self, anomaly: NewAnomaly) -> Result<ReconciliationAnomaly, StoreError> {
        let mut conn = self.conn().await?;
        Ok(anomalies::insert_anomaly(anomaly, &mut conn).await?)
    }

    async fn fetch_unresolved_anomalies(&self) -> Result<Vec<ReconciliationAnomaly>, StoreError> {
        let mut conn = self.conn().await?;
        Ok(anomalies::fetch_unresolved(&mut conn).await?)
    }
}

impl Catalog for SqliteDatabase {
    async fn fetch_item(&self, id: ItemId) -> Result<Option<ItemSnapshot>, CollaboratorError> {
        let mut conn = self.conn().await?;
        Ok(catalog::fetch_item(id, &mut conn).await?)
    }

    async fn claim_item(&self, id: ItemId, ceiling: Yen) -> Result<Option<Yen>, CollaboratorError> {
        let mut conn = self.conn().await?;
        Ok(catalog::claim_item(id, ceiling, &mut conn).await?)
    }
}

impl UserDirectory for SqliteDatabase {
    async fn fetch_user(&self, id: UserId) -> Result<Option<UserProfile>, CollaboratorError> {
        let mut conn = self.conn().await?;
        Ok(users::fetch_user(id, &mut conn).await?)
    }
}

impl ShippingLabelGenerator for SqliteDatabase {
    async fn generate_label(&self, request: &LabelRequest) -> Result<String, CollaboratorError> {
        let mut conn = self.conn().await?;
        let label = labels::insert_label(request, &mut conn).await?;
        Ok(label.label_ref)
    }
}

impl NotificationSink for SqliteDatabase {
    async fn notify(&self, user: UserId, kind: NotificationKind, title: &str, body: &str) -> Result<(), CollaboratorError> {
        let mut conn = self.conn().await?;
        let note = notifications::insert_notification(user, kind, title, body, &mut conn).await?;
        trace!("🗃️ Notification #{} ({kind}) queued for {user}", note.id);
        Ok(())
    }
}
