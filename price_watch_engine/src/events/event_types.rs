use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db_types::{ItemId, Order, ReconciliationAnomaly, Watch, WatchId};

/// A watch fired and its order exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchExecutedEvent {
    pub watch: Watch,
    pub order: Order,
}

impl WatchExecutedEvent {
    pub fn new(watch: Watch, order: Order) -> Self {
        Self { watch, order }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchExpiredEvent {
    pub watch: Watch,
}

impl WatchExpiredEvent {
    pub fn new(watch: Watch) -> Self {
        Self { watch }
    }
}

/// An item was claimed but the purchase could not be completed. Someone has to look at this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnomalyDetectedEvent {
    pub watch_id: WatchId,
    pub item_id: ItemId,
    pub reason: String,
    pub detected_at: DateTime<Utc>,
    /// `None` when the anomaly could not even be written to the reconciliation queue.
    pub anomaly: Option<ReconciliationAnomaly>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    WatchExecuted(WatchExecutedEvent),
    WatchExpired(WatchExpiredEvent),
    AnomalyDetected(AnomalyDetectedEvent),
}
