//! The price-trigger scanner.
//!
//! A scan cycle is a pure function of storage state. It holds no memory between runs, so any number of cycles may
//! overlap (a periodic worker plus a manual `POST /api/scan`, or several server instances on one database) without
//! double-executing anything.
use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt};
use log::*;

use crate::{
    db_types::{ItemId, ItemSnapshot, NewAuditEntry, NotificationKind, Watch},
    events::WatchExpiredEvent,
    pw_api::{
        pipeline::ClaimPipeline,
        resolver,
        watch_objects::{ClaimOutcome, ScanSummary},
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

pub struct PriceScanner<B, C, U, L, N> {
    pipeline: ClaimPipeline<B, C, U, L, N>,
}

impl<B, C, U, L, N> PriceScanner<B, C, U, L, N> {
    pub fn new(pipeline: ClaimPipeline<B, C, U, L, N>) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &ClaimPipeline<B, C, U, L, N> {
        &self.pipeline
    }
}

type Observation = Result<Option<ItemSnapshot>, CollaboratorError>;

impl<B, C, U, L, N> PriceScanner<B, C, U, L, N>
where
    B: WatchManagement + AuditLog + OrderManagement + ReconciliationQueue,
    C: Catalog,
    U: UserDirectory,
    L: ShippingLabelGenerator,
    N: NotificationSink,
{
    pub async fn run_scan_cycle(&self) -> ScanSummary {
        self.run_scan_cycle_at(Utc::now()).await
    }

    /// One full sweep as of `now`: observe prices, resolve contention per item, execute winners, expire stale
    /// watches.
    pub async fn run_scan_cycle_at(&self, now: DateTime<Utc>) -> ScanSummary {
        let mut summary = ScanSummary::default();
        let policy = self.pipeline.policy();
        let watches = match policy.with_timeout(self.pipeline.db().fetch_eligible_watches(now)).await {
            Ok(w) => w,
            Err(e) => {
                error!("🔍️ Could not load eligible watches: {e}");
                Vec::new()
            },
        };
        debug!("🔍️ Scan at {now}: {} eligible watches", watches.len());

        let observations = self.observe_items(&watches).await;
        let mut groups: BTreeMap<ItemId, (ItemSnapshot, Vec<Watch>)> = BTreeMap::new();
        for watch in watches {
            summary.checked += 1;
            let observation = observations.get(&watch.item_id);
            let entry = match observation {
                Some(Ok(Some(item))) => NewAuditEntry::price_check(watch.id, item.price),
                Some(Ok(None)) => NewAuditEntry::price_check_failed(watch.id, "item not found in catalog"),
                Some(Err(e)) => NewAuditEntry::price_check_failed(watch.id, e),
                None => NewAuditEntry::price_check_failed(watch.id, "item was not observed"),
            };
            if !entry.success {
                summary.failed += 1;
            }
            self.record_check(entry.at(now), &watch, now).await;
            if let Some(Ok(Some(item))) = observation {
                if watch.is_triggered_by(item) {
                    groups.entry(item.id).or_insert_with(|| (item.clone(), Vec::new())).1.push(watch);
                }
            }
        }

        if !groups.is_empty() {
            debug!("🔍️ {} items triggered", groups.len());
        }
        let pipeline = &self.pipeline;
        let resolutions = stream::iter(groups.into_values())
            .map(|(item, candidates)| async move { resolver::resolve(pipeline, &item, candidates, now).await })
            .buffer_unordered(self.concurrency())
            .collect::<Vec<_>>()
            .await;
        for resolution in resolutions {
            if resolution.winner.is_some() {
                summary.executed += 1;
            }
            summary.failed += resolution.failures();
            for (watch_id, outcome) in &resolution.attempts {
                if let ClaimOutcome::ReconciliationRequired(reason) = outcome {
                    warn!("🔍️ {watch_id} needs reconciliation: {reason}");
                }
            }
        }

        summary.expired = self.expire_watches(now).await;
        info!(
            "🔍️ Scan complete. checked: {}, executed: {}, expired: {}, failed: {}",
            summary.checked, summary.executed, summary.expired, summary.failed
        );
        summary
    }

    fn concurrency(&self) -> usize {
        self.pipeline.config().max_concurrent_items.max(1)
    }

    /// Fetches every distinct item once.
    async fn observe_items(&self, watches: &[Watch]) -> HashMap<ItemId, Observation> {
        let ids = watches.iter().map(|w| w.item_id).collect::<BTreeSet<_>>();
        let catalog = self.pipeline.catalog();
        let policy = self.pipeline.policy();
        stream::iter(ids)
            .map(|id| async move {
                let observation = policy.with_timeout(catalog.fetch_item(id)).await;
                if let Err(e) = &observation {
                    warn!("🔍️ Price check for {id} failed: {e}");
                }
                (id, observation)
            })
            .buffer_unordered(self.concurrency())
            .collect()
            .await
    }

    async fn record_check(&self, entry: NewAuditEntry, watch: &Watch, now: DateTime<Utc>) {
        let policy = self.pipeline.policy();
        let db = self.pipeline.db();
        if let Err(e) = policy.with_timeout(db.append_audit_entry(entry)).await {
            warn!("🔍️ Could not write price check for {}: {e}", watch.id);
        }
        if let Err(e) = policy.with_timeout(db.record_price_check(watch.id, now)).await {
            warn!("🔍️ Could not update last_checked_at for {}: {e}", watch.id);
        }
    }

    /// Expires stale watches and tells their owners. Returns how many were expired.
    pub async fn expire_watches(&self, now: DateTime<Utc>) -> usize {
        let policy = self.pipeline.policy();
        let expired = match policy.with_timeout(self.pipeline.db().expire_watches(now)).await {
            Ok(expired) => expired,
            Err(e) => {
                error!("🔍️ Expiry sweep failed: {e}");
                return 0;
            },
        };
        let count = expired.len();
        let notifier = self.pipeline.notifier();
        for watch in expired {
            info!("🔍️ {} expired without triggering", watch.id);
            let body = format!("Your price watch on {} (ceiling {}) expired without a purchase.", watch.item_id, watch.max_price);
            let (buyer, kind) = (watch.buyer_id, NotificationKind::AutoPurchaseWatchExpired);
            if let Err(e) = policy.with_retry("🔍️ Expiry notice", || notifier.notify(buyer, kind, "Price watch expired", &body)).await {
                warn!("🔍️ Could not send expiry notice for {}: {e}", watch.id);
            }
            self.pipeline.producers().publish_expired(WatchExpiredEvent::new(watch)).await;
        }
        count
    }
}
