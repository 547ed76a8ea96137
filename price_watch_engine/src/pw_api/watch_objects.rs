use std::time::Duration;

use pw_common::Yen;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{ItemId, OrderId, PaymentAuthorization, RecipientAddress},
    pw_api::retry::CallPolicy,
};

/// What a buyer submits to arm a watch.
#[derive(Debug, Clone, Deserialize)]
pub struct ArmWatchRequest {
    pub item_id: ItemId,
    pub max_price: Yen,
    /// The authorization previously obtained from the payment gate.
    pub payment: Option<PaymentAuthorization>,
    #[serde(default)]
    pub use_registered_address: bool,
    /// Required unless `use_registered_address` is set.
    pub recipient: Option<RecipientAddress>,
    pub delivery_time_slot: Option<String>,
    /// Defaults to 30 days.
    pub expires_in_days: Option<i64>,
}

impl ArmWatchRequest {
    pub fn new(item_id: ItemId, max_price: Yen, payment: PaymentAuthorization) -> Self {
        Self {
            item_id,
            max_price,
            payment: Some(payment),
            use_registered_address: true,
            recipient: None,
            delivery_time_slot: None,
            expires_in_days: None,
        }
    }

    pub fn ship_to(mut self, recipient: RecipientAddress) -> Self {
        self.use_registered_address = false;
        self.recipient = Some(recipient);
        self
    }

    pub fn expires_in_days(mut self, days: i64) -> Self {
        self.expires_in_days = Some(days);
        self
    }
}

/// How a single claim attempt ended. The pipeline never returns an error; every failure is one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The watch executed and this order was created.
    Executed(OrderId),
    /// Another worker or a cancellation got to the watch first.
    LostRace,
    /// The watch's payment authorization is no longer valid.
    Rejected(String),
    /// The item was already sold, withdrawn or repriced above the ceiling.
    ItemUnavailable,
    /// A collaborator failed before anything was claimed. The watch remains active.
    Unavailable(String),
    /// The item was (or may have been) claimed but the purchase could not be completed.
    ReconciliationRequired(String),
}

impl ClaimOutcome {
    /// True when the item is spoken for and no other candidate should be tried.
    pub fn item_is_settled(&self) -> bool {
        matches!(self, ClaimOutcome::Executed(_) | ClaimOutcome::ReconciliationRequired(_))
    }
}

/// Result counters for one scan cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Eligible watches whose price was checked.
    pub checked: usize,
    pub executed: usize,
    pub expired: usize,
    /// Price checks or claim attempts that failed.
    pub failed: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct ScanConfig {
    /// How long a claimed watch stays locked to its worker. A crashed worker's lease lapses after this.
    pub lease_ttl: Duration,
    pub max_concurrent_items: usize,
    pub policy: CallPolicy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self { lease_ttl: Duration::from_secs(60), max_concurrent_items: 8, policy: CallPolicy::default() }
    }
}
