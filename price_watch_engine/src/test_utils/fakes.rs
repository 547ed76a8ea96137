//! In-memory collaborators for tests.
//!
//! Each fake is a cheap `Clone` over shared state, so a test keeps one handle for assertions and hands another to
//! the engine. Locks are never held across an `.await`.
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};

use pw_common::Yen;
use tokio::sync::Notify;

use crate::{
    db_types::{ItemId, ItemSnapshot, ItemStatus, LabelRequest, NotificationKind, UserId, UserProfile},
    traits::{Catalog, CollaboratorError, NotificationSink, ShippingLabelGenerator, UserDirectory},
};

#[derive(Default)]
struct CatalogState {
    items: HashMap<ItemId, ItemSnapshot>,
    unreachable: HashSet<ItemId>,
    claim_error: Option<CollaboratorError>,
    claim_delay: Option<Duration>,
    claims_to_lose: usize,
    attempts: Vec<(ItemId, Yen)>,
    claims: Vec<(ItemId, Yen)>,
}

/// A catalog whose claim is a compare-and-swap under a mutex.
#[derive(Clone, Default)]
pub struct FakeCatalog {
    state: Arc<Mutex<CatalogState>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(self, item: ItemSnapshot) -> Self {
        self.put_item(item);
        self
    }

    pub fn put_item(&self, item: ItemSnapshot) {
        self.state.lock().unwrap().items.insert(item.id, item);
    }

    pub fn set_price(&self, id: ItemId, price: Yen) {
        if let Some(item) = self.state.lock().unwrap().items.get_mut(&id) {
            item.price = price;
        }
    }

    pub fn set_status(&self, id: ItemId, status: ItemStatus) {
        if let Some(item) = self.state.lock().unwrap().items.get_mut(&id) {
            item.status = status;
        }
    }

    pub fn item(&self, id: ItemId) -> Option<ItemSnapshot> {
        self.state.lock().unwrap().items.get(&id).cloned()
    }

    /// `fetch_item` for this item fails with `Unavailable`.
    pub fn make_unreachable(&self, id: ItemId) {
        self.state.lock().unwrap().unreachable.insert(id);
    }

    pub fn fail_claims_with(&self, error: CollaboratorError) {
        self.state.lock().unwrap().claim_error = Some(error);
    }

    /// Every claim sleeps this long before touching the item.
    pub fn delay_claims(&self, delay: Duration) {
        self.state.lock().unwrap().claim_delay = Some(delay);
    }

    /// The next `count` claims report the item as gone, as if another buyer got there first.
    pub fn lose_next_claims(&self, count: usize) {
        self.state.lock().unwrap().claims_to_lose = count;
    }

    /// Every claim that reached the catalog, as `(item, ceiling)`, in order.
    pub fn claim_attempts(&self) -> Vec<(ItemId, Yen)> {
        self.state.lock().unwrap().attempts.clone()
    }

    /// Successful claims, in order.
    pub fn claims(&self) -> Vec<(ItemId, Yen)> {
        self.state.lock().unwrap().claims.clone()
    }
}

impl Catalog for FakeCatalog {
    async fn fetch_item(&self, id: ItemId) -> Result<Option<ItemSnapshot>, CollaboratorError> {
        let state = self.state.lock().unwrap();
        if state.unreachable.contains(&id) {
            return Err(CollaboratorError::Unavailable(format!("catalog cannot reach {id}")));
        }
        Ok(state.items.get(&id).cloned())
    }

    async fn claim_item(&self, id: ItemId, ceiling: Yen) -> Result<Option<Yen>, CollaboratorError> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            state.attempts.push((id, ceiling));
            state.claim_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock().unwrap();
        if let Some(e) = state.claim_error.clone() {
            return Err(e);
        }
        if state.claims_to_lose > 0 {
            state.claims_to_lose -= 1;
            return Ok(None);
        }
        let claimed = match state.items.get_mut(&id) {
            Some(item) if item.status == ItemStatus::Active && item.price <= ceiling => {
                item.status = ItemStatus::Sold;
                Some(item.price)
            },
            _ => None,
        };
        if let Some(price) = claimed {
            state.claims.push((id, price));
        }
        Ok(claimed)
    }
}

/// Wraps a catalog so that each claim stops at a gate until the test opens it.
///
/// `entered` is signalled when a claim reaches the gate, which lets a test interleave another operation between
/// "watch leased" and "item claimed" deterministically.
#[derive(Clone)]
pub struct GatedCatalog<C> {
    inner: C,
    entered: Arc<Notify>,
    gate: Arc<Notify>,
}

impl<C> GatedCatalog<C> {
    pub fn new(inner: C) -> Self {
        Self { inner, entered: Arc::new(Notify::new()), gate: Arc::new(Notify::new()) }
    }

    pub async fn wait_for_claim(&self) {
        self.entered.notified().await;
    }

    pub fn open_gate(&self) {
        self.gate.notify_one();
    }
}

impl<C: Catalog> Catalog for GatedCatalog<C> {
    async fn fetch_item(&self, id: ItemId) -> Result<Option<ItemSnapshot>, CollaboratorError> {
        self.inner.fetch_item(id).await
    }

    async fn claim_item(&self, id: ItemId, ceiling: Yen) -> Result<Option<Yen>, CollaboratorError> {
        self.entered.notify_one();
        self.gate.notified().await;
        self.inner.claim_item(id, ceiling).await
    }
}

#[derive(Clone, Default)]
pub struct FakeUsers {
    users: Arc<Mutex<HashMap<UserId, UserProfile>>>,
}

impl FakeUsers {
    pub fn with_user(self, user: UserProfile) -> Self {
        self.users.lock().unwrap().insert(user.id, user);
        self
    }
}

impl UserDirectory for FakeUsers {
    async fn fetch_user(&self, id: UserId) -> Result<Option<UserProfile>, CollaboratorError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }
}

#[derive(Clone, Default)]
pub struct FakeLabels {
    requests: Arc<Mutex<Vec<LabelRequest>>>,
    failing: Arc<Mutex<bool>>,
}

impl FakeLabels {
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn requests(&self) -> Vec<LabelRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl ShippingLabelGenerator for FakeLabels {
    async fn generate_label(&self, request: &LabelRequest) -> Result<String, CollaboratorError> {
        if *self.failing.lock().unwrap() {
            return Err(CollaboratorError::Unavailable("carrier is down".into()));
        }
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        Ok(format!("LBL-FAKE-{}", requests.len()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub user: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
}

#[derive(Clone, Default)]
pub struct FakeNotifier {
    sent: Arc<Mutex<Vec<SentNotification>>>,
    failing: Arc<Mutex<bool>>,
}

impl FakeNotifier {
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, user: UserId) -> Vec<NotificationKind> {
        self.sent.lock().unwrap().iter().filter(|n| n.user == user).map(|n| n.kind).collect()
    }
}

impl NotificationSink for FakeNotifier {
    async fn notify(&self, user: UserId, kind: NotificationKind, title: &str, body: &str) -> Result<(), CollaboratorError> {
        if *self.failing.lock().unwrap() {
            return Err(CollaboratorError::Unavailable("mail relay is down".into()));
        }
        let note = SentNotification { user, kind, title: title.to_string(), body: body.to_string() };
        self.sent.lock().unwrap().push(note);
        Ok(())
    }
}

#[cfg(feature = "sqlite")]
pub use outage::OrderOutage;

#[cfg(feature = "sqlite")]
mod outage {
    use chrono::{DateTime, Utc};

    use crate::{
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
        traits::{AuditLog, OrderManagement, ReconciliationQueue, StoreError, WatchManagement},
        SqliteDatabase,
    };

    /// A real database whose order table refuses every insert.
    #[derive(Clone)]
    pub struct OrderOutage(pub SqliteDatabase);

    impl OrderManagement for OrderOutage {
        async fn create_order(&self, _order: NewOrder) -> Result<Order, StoreError> {
            Err(StoreError::Backend("database or disk is full".into()))
        }

        async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
            self.0.fetch_order(id).await
        }

        async fn attach_shipping_label(&self, id: OrderId, label_ref: &str) -> Result<(), StoreError> {
            self.0.attach_shipping_label(id, label_ref).await
        }
    }

    impl WatchManagement for OrderOutage {
        async fn insert_watch(&self, watch: NewWatch) -> Result<Watch, StoreError> {
            self.0.insert_watch(watch).await
        }

        async fn fetch_watch(&self, id: WatchId) -> Result<Option<Watch>, StoreError> {
            self.0.fetch_watch(id).await
        }

        async fn fetch_watches_for_buyer(&self, buyer: UserId) -> Result<Vec<Watch>, StoreError> {
            self.0.fetch_watches_for_buyer(buyer).await
        }

        async fn fetch_active_watches_for_item(&self, item: ItemId) -> Result<Vec<Watch>, StoreError> {
            self.0.fetch_active_watches_for_item(item).await
        }

        async fn fetch_eligible_watches(&self, now: DateTime<Utc>) -> Result<Vec<Watch>, StoreError> {
            self.0.fetch_eligible_watches(now).await
        }

        async fn transition_watch(
            &self,
            id: WatchId,
            expected: WatchStatus,
            transition: WatchTransition,
        ) -> Result<Watch, StoreError> {
            self.0.transition_watch(id, expected, transition).await
        }

        async fn acquire_lease(
            &self,
            id: WatchId,
            token: &str,
            now: DateTime<Utc>,
            until: DateTime<Utc>,
        ) -> Result<bool, StoreError> {
            self.0.acquire_lease(id, token, now, until).await
        }

        async fn release_lease(&self, id: WatchId, token: &str) -> Result<(), StoreError> {
            self.0.release_lease(id, token).await
        }

        async fn record_price_check(&self, id: WatchId, at: DateTime<Utc>) -> Result<(), StoreError> {
            self.0.record_price_check(id, at).await
        }

        async fn expire_watches(&self, now: DateTime<Utc>) -> Result<Vec<Watch>, StoreError> {
            self.0.expire_watches(now).await
        }
    }

    impl AuditLog for OrderOutage {
        async fn append_audit_entry(&self, entry: NewAuditEntry) -> Result<WatchAuditEntry, StoreError> {
            self.0.append_audit_entry(entry).await
        }

        async fn fetch_audit_entries(&self, watch: WatchId) -> Result<Vec<WatchAuditEntry>, StoreError> {
            self.0.fetch_audit_entries(watch).await
        }
    }

    impl ReconciliationQueue for OrderOutage {
        async fn record_anomaly(&self, anomaly: NewAnomaly) -> Result<ReconciliationAnomaly, StoreError> {
            self.0.record_anomaly(anomaly).await
        }

        async fn fetch_unresolved_anomalies(&self) -> Result<Vec<ReconciliationAnomaly>, StoreError> {
            self.0.fetch_unresolved_anomalies().await
        }
    }
}
