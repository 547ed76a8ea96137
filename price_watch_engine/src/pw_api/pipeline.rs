//! The claim-and-execute pipeline.
//!
//! One call to [`ClaimPipeline::execute`] drives one watch from "trigger condition observed" to either an executed
//! purchase or a clean, non-destructive failure. The steps are:
//!
//! 1. Take the watch lease. Whoever holds it is the only worker allowed to move the watch.
//! 2. Re-check the payment authorization.
//! 3. Claim the item with the catalog's compare-and-swap. This is the only thing that decides who gets the item.
//! 4. Create the order, idempotently on the watch.
//! 5. Mark the watch `executed`.
//! 6. Request a shipping label (best effort).
//! 7. Notify buyer and seller (best effort).
//!
//! Once step 3 succeeds the item is gone. Any failure after that is never rolled back: it is written to the
//! reconciliation queue, published as an [`AnomalyDetectedEvent`] and logged at `error`.
use std::time::Instant;

use chrono::{DateTime, Utc};
use log::*;
use pw_common::Yen;

use crate::{
    db_types::{
        ItemSnapshot,
        LabelRequest,
        NewAnomaly,
        NewAuditEntry,
        NewOrder,
        NotificationKind,
        Order,
        OrderId,
        UserId,
        Watch,
        WatchStatus,
        WatchTransition,
    },
    events::{AnomalyDetectedEvent, EventProducers, WatchExecutedEvent},
    pw_api::{
        retry::CallPolicy,
        watch_objects::{ClaimOutcome, ScanConfig},
    },
    traits::{
        AuditLog,
        Catalog,
        CollaboratorError,
        NotificationSink,
        OrderManagement,
        ReconciliationQueue,
        ShippingLabelGenerator,
        UserDirectory,
        WatchManagement,
    },
};

pub struct ClaimPipeline<B, C, U, L, N> {
    db: B,
    catalog: C,
    users: U,
    labels: L,
    notifier: N,
    producers: EventProducers,
    config: ScanConfig,
}

fn new_lease_token() -> String {
    format!("{:032x}", rand::random::<u128>())
}

impl<B, C, U, L, N> ClaimPipeline<B, C, U, L, N> {
    pub fn new(db: B, catalog: C, users: U, labels: L, notifier: N, producers: EventProducers, config: ScanConfig) -> Self {
        Self { db, catalog, users, labels, notifier, producers, config }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn producers(&self) -> &EventProducers {
        &self.producers
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn policy(&self) -> &CallPolicy {
        &self.config.policy
    }
}

impl<B, C, U, L, N> ClaimPipeline<B, C, U, L, N>
where
    B: WatchManagement + AuditLog + OrderManagement + ReconciliationQueue,
    C: Catalog,
    U: UserDirectory,
    L: ShippingLabelGenerator,
    N: NotificationSink,
{
    /// Attempts to execute `watch` against the observed `item`. Never panics and never returns an error; the
    /// [`ClaimOutcome`] says what happened.
    pub async fn execute(&self, watch: &Watch, item: &ItemSnapshot, now: DateTime<Utc>) -> ClaimOutcome {
        let started = Instant::now();
        let policy = self.policy();
        let token = new_lease_token();
        let ttl = chrono::Duration::from_std(self.config.lease_ttl).unwrap_or_else(|_| chrono::Duration::seconds(60));
        match policy.with_timeout(self.db.acquire_lease(watch.id, &token, now, now + ttl)).await {
            Ok(true) => trace!("🔒️ Lease on {} taken", watch.id),
            Ok(false) => {
                trace!("🔒️ {} is leased by another worker or no longer active", watch.id);
                return ClaimOutcome::LostRace;
            },
            Err(e) => {
                warn!("🔒️ Could not lease {}: {e}", watch.id);
                return ClaimOutcome::Unavailable(e.to_string());
            },
        }
        self.audit(NewAuditEntry::attempt(watch.id, item.price).at(now)).await;

        if !watch.payment_is_current(now) {
            let reason = "payment authorization expired";
            self.fail(watch, item.price, reason, &token, started, now).await;
            return ClaimOutcome::Rejected(reason.to_string());
        }

        let price = match policy.with_timeout(self.catalog.claim_item(item.id, watch.max_price)).await {
            Ok(Some(price)) => price,
            Ok(None) => {
                self.fail(watch, item.price, "item unavailable", &token, started, now).await;
                return ClaimOutcome::ItemUnavailable;
            },
            Err(CollaboratorError::Timeout(after)) => {
                let reason = format!("claim on {} timed out after {after:?}; outcome unknown", item.id);
                self.release(watch, &token).await;
                return self.raise_anomaly(watch, None, item.price, reason, started, now).await;
            },
            Err(e) => {
                let reason = format!("catalog unavailable: {e}");
                self.fail(watch, item.price, &reason, &token, started, now).await;
                return ClaimOutcome::Unavailable(reason);
            },
        };
        info!("🔒️ {} claimed {} at {price}", watch.id, item.id);

        let new_order = NewOrder::for_watch(watch, item, price, now);
        let db = &self.db;
        let order = match policy.with_retry("🔒️ Order creation", move || db.create_order(new_order.clone())).await {
            Ok(order) => order,
            Err(e) => {
                let reason = format!("{} claimed at {price} but order creation failed: {e}", item.id);
                self.release(watch, &token).await;
                return self.raise_anomaly(watch, None, price, reason, started, now).await;
            },
        };

        let transition = WatchTransition::execute(order.id, now, token.clone());
        let executed =
            match policy.with_timeout(self.db.transition_watch(watch.id, WatchStatus::Active, transition)).await {
                Ok(w) => w,
                Err(e) => {
                    let reason = format!("{} created for {} but the watch could not be marked executed: {e}", order.id, watch.id);
                    self.release(watch, &token).await;
                    return self.raise_anomaly(watch, Some(order.id), price, reason, started, now).await;
                },
            };
        self.audit(NewAuditEntry::success(watch.id, price, started.elapsed()).at(now)).await;
        info!("🔒️ {} executed as {} for {price}", watch.id, order.id);

        let order = self.issue_shipping_label(order, item).await;
        self.notify_parties(&executed, &order, item).await;
        self.producers.publish_executed(WatchExecutedEvent::new(executed, order.clone())).await;
        ClaimOutcome::Executed(order.id)
    }

    async fn audit(&self, entry: NewAuditEntry) {
        let watch_id = entry.watch_id;
        let action = entry.action;
        if let Err(e) = self.policy().with_timeout(self.db.append_audit_entry(entry)).await {
            warn!("🔒️ Could not write {action} audit entry for {watch_id}: {e}");
        }
    }

    async fn release(&self, watch: &Watch, token: &str) {
        if let Err(e) = self.policy().with_timeout(self.db.release_lease(watch.id, token)).await {
            // The lease lapses on its own after the TTL.
            warn!("🔒️ Could not release lease on {}: {e}", watch.id);
        }
    }

    async fn fail(&self, watch: &Watch, observed: Yen, reason: &str, token: &str, started: Instant, now: DateTime<Utc>) {
        debug!("🔒️ Claim for {} failed: {reason}", watch.id);
        self.audit(NewAuditEntry::failed(watch.id, observed, reason, started.elapsed()).at(now)).await;
        self.release(watch, token).await;
    }

    async fn raise_anomaly(
        &self,
        watch: &Watch,
        order_id: Option<OrderId>,
        price: Yen,
        reason: String,
        started: Instant,
        now: DateTime<Utc>,
    ) -> ClaimOutcome {
        error!("🚨️ Reconciliation required for {} on {}: {reason}", watch.id, watch.item_id);
        self.audit(NewAuditEntry::failed(watch.id, price, &reason, started.elapsed()).at(now)).await;
        let anomaly = NewAnomaly {
            watch_id: watch.id,
            item_id: watch.item_id,
            order_id,
            reason: reason.clone(),
            created_at: now,
        };
        let db = &self.db;
        let recorded = match self.policy().with_retry("🚨️ Anomaly record", move || db.record_anomaly(anomaly.clone())).await {
            Ok(a) => Some(a),
            Err(e) => {
                error!("🚨️ Could not write the anomaly for {} to the reconciliation queue: {e}", watch.id);
                None
            },
        };
        let event = AnomalyDetectedEvent {
            watch_id: watch.id,
            item_id: watch.item_id,
            reason: reason.clone(),
            detected_at: now,
            anomaly: recorded,
        };
        self.producers.publish_anomaly(event).await;
        ClaimOutcome::ReconciliationRequired(reason)
    }

    /// Failure here is logged and otherwise ignored. The order stands without a label.
    async fn issue_shipping_label(&self, order: Order, item: &ItemSnapshot) -> Order {
        let policy = self.policy();
        let seller = match policy.with_timeout(self.users.fetch_user(item.seller_id)).await {
            Ok(Some(seller)) => seller,
            Ok(None) => {
                warn!("🔒️ Seller {} not found. No label for {}", item.seller_id, order.id);
                return order;
            },
            Err(e) => {
                warn!("🔒️ Could not look up seller {}: {e}. No label for {}", item.seller_id, order.id);
                return order;
            },
        };
        let request = LabelRequest {
            order_id: order.id,
            sender: seller.address(),
            recipient: order.recipient.clone(),
            item_title: item.title.clone(),
            parcel_weight_kg: item.weight_kg,
            delivery_time_slot: order.delivery_time_slot.clone(),
        };
        let labels = &self.labels;
        let label_ref = match policy.with_retry("🔒️ Shipping label", || labels.generate_label(&request)).await {
            Ok(r) => r,
            Err(e) => {
                warn!("🔒️ Shipping label for {} failed: {e}", order.id);
                return order;
            },
        };
        match policy.with_timeout(self.db.attach_shipping_label(order.id, &label_ref)).await {
            Ok(()) => Order { shipping_label_ref: Some(label_ref), ..order },
            Err(e) => {
                warn!("🔒️ Label {label_ref} issued but could not be attached to {}: {e}", order.id);
                order
            },
        }
    }

    async fn notify_parties(&self, watch: &Watch, order: &Order, item: &ItemSnapshot) {
        let buyer_body = format!("Your price watch bought \"{}\" for {}.", item.title, order.price);
        self.send(watch.buyer_id, NotificationKind::AutoPurchaseExecuted, "Auto-purchase completed", &buyer_body).await;
        let seller_body = format!("\"{}\" sold for {}. Please prepare it for shipping.", item.title, order.price);
        self.send(order.seller_id, NotificationKind::ProductSold, "Your item sold", &seller_body).await;
    }

    async fn send(&self, user: UserId, kind: NotificationKind, title: &str, body: &str) {
        let notifier = &self.notifier;
        if let Err(e) = self.policy().with_retry("🔒️ Notification", || notifier.notify(user, kind, title, body)).await {
            warn!("🔒️ Could not send {kind} notification to {user}: {e}");
        }
    }
}
