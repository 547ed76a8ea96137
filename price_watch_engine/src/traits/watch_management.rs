use chrono::{DateTime, Utc};

use crate::{
    db_types::{ItemId, NewWatch, UserId, Watch, WatchId, WatchStatus, WatchTransition},
    traits::StoreError,
};

/// The watch store.
///
/// Implementations must make [`Self::transition_watch`], [`Self::acquire_lease`] and [`Self::expire_watches`] single
/// atomic conditional updates. The engine never reads a status and then writes it back.
#[allow(async_fn_in_trait)]
pub trait WatchManagement {
    /// Persists a new watch in the `active` state and returns the stored record.
    async fn insert_watch(&self, watch: NewWatch) -> Result<Watch, StoreError>;

    async fn fetch_watch(&self, id: WatchId) -> Result<Option<Watch>, StoreError>;

    /// All watches belonging to `buyer`, newest first.
    async fn fetch_watches_for_buyer(&self, buyer: UserId) -> Result<Vec<Watch>, StoreError>;

    async fn fetch_active_watches_for_item(&self, item: ItemId) -> Result<Vec<Watch>, StoreError>;

    /// Watches that a scan cycle should consider: `active`, payment-authorized and with `expires_at > now`.
    async fn fetch_eligible_watches(&self, now: DateTime<Utc>) -> Result<Vec<Watch>, StoreError>;

    /// Moves the watch to `transition.status` iff it is currently in `expected` and the lease condition holds.
    ///
    /// If `transition.lease_token` is set, the stored lease must carry that token. Otherwise the watch must not be
    /// under a live lease at `transition.at`. The lease is cleared on success.
    ///
    /// Returns [`StoreError::StatusConflict`] when the condition does not hold, and
    /// [`StoreError::InvalidTransition`] when the transition itself is malformed.
    async fn transition_watch(
        &self,
        id: WatchId,
        expected: WatchStatus,
        transition: WatchTransition,
    ) -> Result<Watch, StoreError>;

    /// Takes the per-watch claim lease. Succeeds only if the watch is `active` and no other live lease exists.
    async fn acquire_lease(
        &self,
        id: WatchId,
        token: &str,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Drops the lease if `token` still holds it. Releasing a lease you do not hold is a no-op.
    async fn release_lease(&self, id: WatchId, token: &str) -> Result<(), StoreError>;

    /// Sets `last_checked_at`. Permitted in any status.
    async fn record_price_check(&self, id: WatchId, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Flips every unleased active watch with `expires_at <= now` to `expired` and returns them.
    async fn expire_watches(&self, now: DateTime<Utc>) -> Result<Vec<Watch>, StoreError>;
}
