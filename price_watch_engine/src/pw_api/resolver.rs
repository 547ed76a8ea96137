//! Contention resolution: when several watches on one item trigger together, decide who goes first.
//!
//! Priority is the highest ceiling, then the oldest watch, then the lowest id. The order only decides who *tries*
//! first. Exclusivity itself comes from the catalog claim, so a lower-priority watch that loses the claim simply
//! reports [`ClaimOutcome::ItemUnavailable`].
use chrono::{DateTime, Utc};
use log::*;

use crate::{
    db_types::{ItemSnapshot, OrderId, Watch, WatchId},
    pw_api::{pipeline::ClaimPipeline, watch_objects::ClaimOutcome},
    traits::{
        AuditLog,
        Catalog,
        NotificationSink,
        OrderManagement,
        ReconciliationQueue,
        ShippingLabelGenerator,
        UserDirectory,
        WatchManagement,
    },
};

/// Sorts candidates into attempt order.
pub fn rank_candidates(mut candidates: Vec<Watch>) -> Vec<Watch> {
    candidates.sort_by(|a, b| {
        b.max_price.cmp(&a.max_price).then_with(|| a.created_at.cmp(&b.created_at)).then_with(|| a.id.cmp(&b.id))
    });
    candidates
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub winner: Option<(WatchId, OrderId)>,
    /// Every attempt made, in attempt order.
    pub attempts: Vec<(WatchId, ClaimOutcome)>,
}

impl Resolution {
    /// Attempts that ended in a real failure. Losing a lease race is not counted.
    pub fn failures(&self) -> usize {
        self.attempts.iter().filter(|(_, o)| !matches!(o, ClaimOutcome::Executed(_) | ClaimOutcome::LostRace)).count()
    }
}

/// Walks the ranked candidates through the pipeline until one executes or the item is otherwise settled.
pub async fn resolve<B, C, U, L, N>(
    pipeline: &ClaimPipeline<B, C, U, L, N>,
    item: &ItemSnapshot,
    candidates: Vec<Watch>,
    now: DateTime<Utc>,
) -> Resolution
where
    B: WatchManagement + AuditLog + OrderManagement + ReconciliationQueue,
    C: Catalog,
    U: UserDirectory,
    L: ShippingLabelGenerator,
    N: NotificationSink,
{
    let ranked = rank_candidates(candidates);
    debug!("⚖️ {} candidates for {} at {}", ranked.len(), item.id, item.price);
    let mut resolution = Resolution::default();
    for watch in ranked {
        let outcome = pipeline.execute(&watch, item, now).await;
        trace!("⚖️ {} -> {outcome:?}", watch.id);
        let settled = outcome.item_is_settled();
        if let ClaimOutcome::Executed(order_id) = outcome {
            resolution.winner = Some((watch.id, order_id));
        }
        resolution.attempts.push((watch.id, outcome));
        if settled {
            break;
        }
    }
    match resolution.winner {
        Some((watch_id, order_id)) => info!("⚖️ {} went to {watch_id} ({order_id})", item.id),
        None => debug!("⚖️ No candidate executed on {}", item.id),
    }
    resolution
}
