use std::fmt::Debug;

use chrono::{DateTime, Duration, Utc};
use log::*;
use pw_common::Yen;

use crate::{
    db_types::{
        ItemId,
        NewWatch,
        NotificationKind,
        UserId,
        Watch,
        WatchAuditEntry,
        WatchId,
        WatchStatus,
        WatchTransition,
        DEFAULT_WATCH_LIFETIME_DAYS,
        MAX_WATCH_LIFETIME_DAYS,
    },
    pw_api::{errors::WatchApiError, retry::CallPolicy, watch_objects::ArmWatchRequest},
    traits::{
        AuditLog,
        AuthorizationOutcome,
        Catalog,
        NotificationSink,
        PaymentGateway,
        PaymentInstrument,
        UserDirectory,
        WatchManagement,
    },
};

/// `WatchFlowApi` is the buyer-facing API: pre-authorize, arm, inspect and cancel watches.
pub struct WatchFlowApi<B, C, U, G, N> {
    db: B,
    catalog: C,
    users: U,
    gateway: G,
    notifier: N,
    policy: CallPolicy,
}

impl<B, C, U, G, N> Debug for WatchFlowApi<B, C, U, G, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WatchFlowApi")
    }
}

impl<B, C, U, G, N> WatchFlowApi<B, C, U, G, N> {
    pub fn new(db: B, catalog: C, users: U, gateway: G, notifier: N, policy: CallPolicy) -> Self {
        Self { db, catalog, users, gateway, notifier, policy }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, C, U, G, N> WatchFlowApi<B, C, U, G, N>
where
    B: WatchManagement + AuditLog,
    C: Catalog,
    U: UserDirectory,
    G: PaymentGateway,
    N: NotificationSink,
{
    /// Asks the gate to hold `amount`. A decline comes back as `authorized == false`; only an unreachable gate is an
    /// error.
    pub async fn authorize_payment(
        &self,
        instrument: &PaymentInstrument,
        amount: Yen,
    ) -> Result<AuthorizationOutcome, WatchApiError> {
        let outcome = self.policy.with_timeout(self.gateway.authorize(instrument, amount)).await?;
        Ok(outcome)
    }

    /// Arms a new watch for `buyer`.
    ///
    /// The request is validated in full before anything is written. When `use_registered_address` is set, the
    /// buyer's current profile address is copied onto the watch. The buyer is notified, but a failed notification
    /// does not fail the call.
    pub async fn arm(&self, buyer: UserId, request: ArmWatchRequest) -> Result<Watch, WatchApiError> {
        self.arm_at(buyer, request, Utc::now()).await
    }

    pub async fn arm_at(
        &self,
        buyer: UserId,
        request: ArmWatchRequest,
        now: DateTime<Utc>,
    ) -> Result<Watch, WatchApiError> {
        if !request.max_price.is_positive() {
            return Err(WatchApiError::ValidationError("max_price must be greater than zero".into()));
        }
        let payment = request
            .payment
            .clone()
            .ok_or_else(|| WatchApiError::ValidationError("a payment authorization is required".into()))?;
        if payment.payment_method_ref.is_empty() || payment.auth_token_ref.is_empty() {
            return Err(WatchApiError::ValidationError("the payment authorization is incomplete".into()));
        }
        if payment.expires_at <= now {
            return Err(WatchApiError::ValidationError("the payment authorization has expired".into()));
        }
        if payment.authorized_amount < request.max_price {
            return Err(WatchApiError::ValidationError(format!(
                "authorized amount {} is below the ceiling {}",
                payment.authorized_amount, request.max_price
            )));
        }
        let lifetime_days = request.expires_in_days.unwrap_or(DEFAULT_WATCH_LIFETIME_DAYS);
        if !(1..=MAX_WATCH_LIFETIME_DAYS).contains(&lifetime_days) {
            return Err(WatchApiError::ValidationError(format!(
                "expires_in_days must be between 1 and {MAX_WATCH_LIFETIME_DAYS}"
            )));
        }
        let expires_at = now
            .checked_add_signed(Duration::days(lifetime_days))
            .ok_or_else(|| WatchApiError::ValidationError("expires_in_days is out of range".into()))?;

        let item = self
            .policy
            .with_timeout(self.catalog.fetch_item(request.item_id))
            .await?
            .ok_or_else(|| WatchApiError::NotFound(request.item_id.to_string()))?;
        if item.seller_id == buyer {
            return Err(WatchApiError::ValidationError("you cannot watch your own item".into()));
        }
        if !item.purchasable() {
            return Err(WatchApiError::ValidationError(format!("{} is {} and cannot be bought", item.id, item.status)));
        }

        let recipient = if request.use_registered_address {
            let profile = self
                .policy
                .with_timeout(self.users.fetch_user(buyer))
                .await?
                .ok_or_else(|| WatchApiError::NotFound(buyer.to_string()))?;
            let address = profile.address();
            let missing = address.missing_fields();
            if !missing.is_empty() {
                return Err(WatchApiError::ValidationError(format!(
                    "registered address is incomplete: missing {}",
                    missing.join(", ")
                )));
            }
            address
        } else {
            let address = request.recipient.clone().ok_or_else(|| {
                WatchApiError::ValidationError("a delivery address is required when not using the registered one".into())
            })?;
            let missing = address.missing_fields();
            if !missing.is_empty() {
                return Err(WatchApiError::ValidationError(format!(
                    "delivery address is incomplete: missing {}",
                    missing.join(", ")
                )));
            }
            address
        };

        let new_watch = NewWatch {
            buyer_id: buyer,
            item_id: item.id,
            max_price: request.max_price,
            payment,
            use_registered_address: request.use_registered_address,
            recipient,
            delivery_time_slot: request.delivery_time_slot,
            expires_at,
            created_at: now,
        };
        let watch = self.policy.with_timeout(self.db.insert_watch(new_watch)).await?;
        info!("👀️ {buyer} armed {} on \"{}\" at {}", watch.id, item.title, watch.max_price);
        let body = format!("We will buy \"{}\" for you once it drops to {} or less.", item.title, watch.max_price);
        self.notify(buyer, NotificationKind::AutoPurchaseWatchCreated, "Price watch armed", &body).await;
        Ok(watch)
    }

    /// Fetches a watch. Only its owner may see it.
    pub async fn watch(&self, id: WatchId, buyer: UserId) -> Result<Watch, WatchApiError> {
        let watch = self
            .policy
            .with_timeout(self.db.fetch_watch(id))
            .await?
            .ok_or_else(|| WatchApiError::NotFound(id.to_string()))?;
        if watch.buyer_id != buyer {
            return Err(WatchApiError::AuthorizationError(format!("{id} does not belong to {buyer}")));
        }
        Ok(watch)
    }

    pub async fn watches_for_buyer(&self, buyer: UserId) -> Result<Vec<Watch>, WatchApiError> {
        Ok(self.policy.with_timeout(self.db.fetch_watches_for_buyer(buyer)).await?)
    }

    pub async fn active_watches_for_item(&self, item: ItemId) -> Result<Vec<Watch>, WatchApiError> {
        Ok(self.policy.with_timeout(self.db.fetch_active_watches_for_item(item)).await?)
    }

    pub async fn eligible_watches(&self, now: DateTime<Utc>) -> Result<Vec<Watch>, WatchApiError> {
        Ok(self.policy.with_timeout(self.db.fetch_eligible_watches(now)).await?)
    }

    /// The audit trail of a watch, oldest first. This is where a buyer finds out why a purchase did not happen.
    pub async fn history(&self, id: WatchId, buyer: UserId) -> Result<Vec<WatchAuditEntry>, WatchApiError> {
        let watch = self.watch(id, buyer).await?;
        Ok(self.policy.with_timeout(self.db.fetch_audit_entries(watch.id)).await?)
    }

    /// Cancels an active watch.
    ///
    /// If a scan cycle holds the watch's lease at this moment, the cancellation loses and a `ConflictError` is
    /// returned; the claim in progress decides the watch's fate.
    pub async fn cancel(&self, id: WatchId, buyer: UserId) -> Result<Watch, WatchApiError> {
        self.cancel_at(id, buyer, Utc::now()).await
    }

    pub async fn cancel_at(&self, id: WatchId, buyer: UserId, now: DateTime<Utc>) -> Result<Watch, WatchApiError> {
        let watch = self.watch(id, buyer).await?;
        if watch.status != WatchStatus::Active {
            return Err(WatchApiError::StateError(format!("{id} is already {}", watch.status)));
        }
        if watch.is_leased(now) {
            return Err(WatchApiError::ConflictError(format!("{id} is being purchased right now")));
        }
        let cancelled = self
            .policy
            .with_timeout(self.db.transition_watch(id, WatchStatus::Active, WatchTransition::cancel(now)))
            .await?;
        info!("👀️ {buyer} cancelled {id}");
        let body = format!("Your price watch on {} has been cancelled.", cancelled.item_id);
        self.notify(buyer, NotificationKind::AutoPurchaseWatchCancelled, "Price watch cancelled", &body).await;
        Ok(cancelled)
    }

    async fn notify(&self, user: UserId, kind: NotificationKind, title: &str, body: &str) {
        let notifier = &self.notifier;
        if let Err(e) = self.policy.with_retry("👀️ Notification", || notifier.notify(user, kind, title, body)).await {
            warn!("👀️ Could not send {kind} notification to {user}: {e}");
        }
    }
}
