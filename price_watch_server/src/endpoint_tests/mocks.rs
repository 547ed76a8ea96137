use chrono::{DateTime, Utc};
use mockall::mock;
use price_watch_engine::{
    db_types::{
        ItemId,
        NewAnomaly,
        NewAuditEntry,
        NewOrder,
        NewWatch,
        Order,
        OrderId,
        ReconciliationAnomaly,
        UserId,
        Watch,
        WatchAuditEntry,
        WatchId,
        WatchStatus,
        WatchTransition,
    },
    traits::{
        AuditLog,
        AuthorizationOutcome,
        CollaboratorError,
        OrderManagement,
        PaymentGateway,
        PaymentInstrument,
        ReconciliationQueue,
        StoreError,
        WatchManagement,
    },
};
use pw_common::Yen;

mock! {
    pub WatchStore {}
    impl WatchManagement for WatchStore {
        async fn insert_watch(&self, watch: NewWatch) -> Result<Watch, StoreError>;
        async fn fetch_watch(&self, id: WatchId) -> Result<Option<Watch>, StoreError>;
        async fn fetch_watches_for_buyer(&self, buyer: UserId) -> Result<Vec<Watch>, StoreError>;
        async fn fetch_active_watches_for_item(&self, item: ItemId) -> Result<Vec<Watch>, StoreError>;
        async fn fetch_eligible_watches(&self, now: DateTime<Utc>) -> Result<Vec<Watch>, StoreError>;
        async fn transition_watch(&self, id: WatchId, expected: WatchStatus, transition: WatchTransition) -> Result<Watch, StoreError>;
        async fn acquire_lease(&self, id: WatchId, token: &str, now: DateTime<Utc>, until: DateTime<Utc>) -> Result<bool, StoreError>;
        async fn release_lease(&self, id: WatchId, token: &str) -> Result<(), StoreError>;
        async fn record_price_check(&self, id: WatchId, at: DateTime<Utc>) -> Result<(), StoreError>;
        async fn expire_watches(&self, now: DateTime<Utc>) -> Result<Vec<Watch>, StoreError>;
    }
    impl AuditLog for WatchStore {
        async fn append_audit_entry(&self, entry: NewAuditEntry) -> Result<WatchAuditEntry, StoreError>;
        async fn fetch_audit_entries(&self, watch: WatchId) -> Result<Vec<WatchAuditEntry>, StoreError>;
    }
    impl OrderManagement for WatchStore {
        async fn create_order(&self, order: NewOrder) -> Result<Order, StoreError>;
        async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, StoreError>;
        async fn attach_shipping_label(&self, id: OrderId, label_ref: &str) -> Result<(), StoreError>;
    }
    impl ReconciliationQueue for WatchStore {
        async fn record_anomaly(&self, anomaly: NewAnomaly) -> Result<ReconciliationAnomaly, StoreError>;
        async fn fetch_unresolved_anomalies(&self) -> Result<Vec<ReconciliationAnomaly>, StoreError>;
    }
}

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        async fn authorize(&self, instrument: &PaymentInstrument, amount: Yen) -> Result<AuthorizationOutcome, CollaboratorError>;
    }
}
