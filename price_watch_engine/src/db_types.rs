use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use log::error;
use pw_common::Yen;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

pub const DEFAULT_WATCH_LIFETIME_DAYS: i64 = 30;
pub const MAX_WATCH_LIFETIME_DAYS: i64 = 365;

macro_rules! id_type {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Type, Serialize, Deserialize)]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", $prefix, self.0)
            }
        }

        impl $name {
            pub fn value(&self) -> i64 {
                self.0
            }
        }
    };
}

id_type!(WatchId, "watch");
id_type!(ItemId, "item");
id_type!(UserId, "user");
id_type!(OrderId, "order");

#[derive(Debug, Clone, Error)]
#[error("Invalid value for {kind}: {value}")]
pub struct ConversionError {
    pub kind: &'static str,
    pub value: String,
}

//--------------------------------------     WatchStatus       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    /// The watch is armed and will fire once the price condition is met.
    Active,
    /// The watch fired and an order was created.
    Executed,
    /// The buyer called the watch off.
    Cancelled,
    /// The watch reached its deadline without firing.
    Expired,
}

impl WatchStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WatchStatus::Active)
    }
}

impl Display for WatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatchStatus::Active => write!(f, "active"),
            WatchStatus::Executed => write!(f, "executed"),
            WatchStatus::Cancelled => write!(f, "cancelled"),
            WatchStatus::Expired => write!(f, "expired"),
        }
    }
}

impl FromStr for WatchStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "executed" => Ok(Self::Executed),
            "cancelled" => Ok(Self::Cancelled),
            "expired" => Ok(Self::Expired),
            s => Err(ConversionError { kind: "watch status", value: s.to_string() }),
        }
    }
}

//--------------------------------------   RecipientAddress    ---------------------------------------------------------
/// A delivery address snapshot. Copied onto the watch at arming time and onto the order at execution time, so later
/// edits to the buyer's profile never change where an already-armed purchase ships.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct RecipientAddress {
    #[sqlx(rename = "recipient_name")]
    pub name: String,
    #[sqlx(rename = "recipient_phone")]
    pub phone: String,
    #[sqlx(rename = "recipient_postal_code")]
    pub postal_code: String,
    #[sqlx(rename = "recipient_region")]
    pub region: String,
    #[sqlx(rename = "recipient_city")]
    pub city: String,
    #[sqlx(rename = "recipient_address_line1")]
    pub address_line1: String,
    #[sqlx(rename = "recipient_address_line2")]
    pub address_line2: String,
}

impl RecipientAddress {
    /// Returns the names of the mandatory fields that are blank. `address_line2` is optional.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("phone", &self.phone),
            ("postal_code", &self.postal_code),
            ("region", &self.region),
            ("city", &self.city),
            ("address_line1", &self.address_line1),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect()
    }
}

//--------------------------------------        Watch          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Watch {
    pub id: WatchId,
    pub buyer_id: UserId,
    pub item_id: ItemId,
    pub max_price: Yen,
    pub status: WatchStatus,
    pub payment_authorized: bool,
    pub payment_method_ref: String,
    #[serde(skip_serializing)]
    pub auth_token_ref: String,
    pub authorized_amount: Yen,
    pub payment_expires_at: DateTime<Utc>,
    pub use_registered_address: bool,
    #[sqlx(flatten)]
    pub recipient: RecipientAddress,
    pub delivery_time_slot: Option<String>,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub executed_at: Option<DateTime<Utc>>,
    pub order_id: Option<OrderId>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub lease_token: Option<String>,
    #[serde(skip_serializing)]
    pub lease_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Watch {
    /// Active, payment-authorized and not yet past its deadline.
    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        self.status == WatchStatus::Active && self.payment_authorized && self.expires_at > now
    }

    /// The trigger condition: the item can be bought and the observed price is at or below the ceiling.
    pub fn is_triggered_by(&self, item: &ItemSnapshot) -> bool {
        item.purchasable() && item.price <= self.max_price
    }

    pub fn payment_is_current(&self, now: DateTime<Utc>) -> bool {
        self.payment_authorized && self.payment_expires_at > now
    }

    pub fn is_leased(&self, now: DateTime<Utc>) -> bool {
        matches!((&self.lease_token, self.lease_expires_at), (Some(_), Some(until)) if until > now)
    }
}

//--------------------------------------   PaymentAuthorization   ------------------------------------------------------
/// The capability references handed out by the payment gate. They are stored verbatim and never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAuthorization {
    pub payment_method_ref: String,
    pub auth_token_ref: String,
    pub authorized_amount: Yen,
    pub expires_at: DateTime<Utc>,
}

//--------------------------------------       NewWatch        ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewWatch {
    pub buyer_id: UserId,
    pub item_id: ItemId,
    pub max_price: Yen,
    pub payment: PaymentAuthorization,
    pub use_registered_address: bool,
    pub recipient: RecipientAddress,
    pub delivery_time_slot: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl NewWatch {
    pub fn new(
        buyer_id: UserId,
        item_id: ItemId,
        max_price: Yen,
        payment: PaymentAuthorization,
        recipient: RecipientAddress,
    ) -> Self {
        let created_at = Utc::now();
        Self {
            buyer_id,
            item_id,
            max_price,
            payment,
            use_registered_address: false,
            recipient,
            delivery_time_slot: None,
            expires_at: created_at + Duration::days(DEFAULT_WATCH_LIFETIME_DAYS),
            created_at,
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = expires_at;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

//--------------------------------------    WatchTransition    ---------------------------------------------------------
/// The target of a conditional status update. See [`crate::traits::WatchManagement::transition_watch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTransition {
    pub status: WatchStatus,
    pub at: DateTime<Utc>,
    pub order_id: Option<OrderId>,
    /// The lease the caller holds. `None` means the caller holds no lease and the watch must not be leased by anyone.
    pub lease_token: Option<String>,
}

impl WatchTransition {
    pub fn cancel(at: DateTime<Utc>) -> Self {
        Self { status: WatchStatus::Cancelled, at, order_id: None, lease_token: None }
    }

    pub fn expire(at: DateTime<Utc>) -> Self {
        Self { status: WatchStatus::Expired, at, order_id: None, lease_token: None }
    }

    pub fn execute(order_id: OrderId, at: DateTime<Utc>, lease_token: String) -> Self {
        Self { status: WatchStatus::Executed, at, order_id: Some(order_id), lease_token: Some(lease_token) }
    }

    /// Only moves out of `active` are legal, and `executed` must carry an order reference.
    pub fn is_well_formed(&self) -> bool {
        match self.status {
            WatchStatus::Active => false,
            WatchStatus::Executed => self.order_id.is_some(),
            WatchStatus::Cancelled | WatchStatus::Expired => self.order_id.is_none(),
        }
    }
}

//--------------------------------------      AuditAction      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    PriceCheck,
    PurchaseAttempt,
    PurchaseSuccess,
    PurchaseFailed,
}

impl Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditAction::PriceCheck => write!(f, "price_check"),
            AuditAction::PurchaseAttempt => write!(f, "purchase_attempt"),
            AuditAction::PurchaseSuccess => write!(f, "purchase_success"),
            AuditAction::PurchaseFailed => write!(f, "purchase_failed"),
        }
    }
}

//--------------------------------------    WatchAuditEntry    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct WatchAuditEntry {
    pub id: i64,
    pub watch_id: WatchId,
    pub action: AuditAction,
    pub observed_price: Yen,
    pub success: bool,
    pub error_message: Option<String>,
    pub execution_time_ms: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditEntry {
    pub watch_id: WatchId,
    pub action: AuditAction,
    pub observed_price: Yen,
    pub success: bool,
    pub error_message: Option<String>,
    pub execution_time_ms: i64,
    pub created_at: DateTime<Utc>,
}

impl NewAuditEntry {
    fn new(watch_id: WatchId, action: AuditAction, observed_price: Yen, success: bool) -> Self {
        Self {
            watch_id,
            action,
            observed_price,
            success,
            error_message: None,
            execution_time_ms: 0,
            created_at: Utc::now(),
        }
    }

    pub fn price_check(watch_id: WatchId, observed_price: Yen) -> Self {
        Self::new(watch_id, AuditAction::PriceCheck, observed_price, true)
    }

    pub fn price_check_failed<S: Display>(watch_id: WatchId, reason: S) -> Self {
        Self::new(watch_id, AuditAction::PriceCheck, Yen::default(), false).with_error(reason)
    }

    pub fn attempt(watch_id: WatchId, observed_price: Yen) -> Self {
        Self::new(watch_id, AuditAction::PurchaseAttempt, observed_price, true)
    }

    pub fn success(watch_id: WatchId, price: Yen, elapsed: std::time::Duration) -> Self {
        Self::new(watch_id, AuditAction::PurchaseSuccess, price, true).with_elapsed(elapsed)
    }

    pub fn failed<S: Display>(watch_id: WatchId, observed_price: Yen, reason: S, elapsed: std::time::Duration) -> Self {
        Self::new(watch_id, AuditAction::PurchaseFailed, observed_price, false).with_error(reason).with_elapsed(elapsed)
    }

    pub fn with_error<S: Display>(mut self, reason: S) -> Self {
        self.error_message = Some(reason.to_string());
        self
    }

    pub fn with_elapsed(mut self, elapsed: std::time::Duration) -> Self {
        self.execution_time_ms = i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX);
        self
    }

    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

//--------------------------------------      ItemStatus       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Active,
    Sold,
    Withdrawn,
}

impl Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemStatus::Active => write!(f, "active"),
            ItemStatus::Sold => write!(f, "sold"),
            ItemStatus::Withdrawn => write!(f, "withdrawn"),
        }
    }
}

impl From<String> for ItemStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "active" => Self::Active,
            "sold" => Self::Sold,
            "withdrawn" => Self::Withdrawn,
            _ => {
                error!("Invalid item status: {value}. Treating the item as withdrawn");
                Self::Withdrawn
            },
        }
    }
}

//--------------------------------------     ItemSnapshot      ---------------------------------------------------------
/// What the catalog reports about an item at one instant.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub id: ItemId,
    pub seller_id: UserId,
    pub title: String,
    pub price: Yen,
    pub status: ItemStatus,
    pub weight_kg: f64,
}

impl ItemSnapshot {
    pub fn purchasable(&self) -> bool {
        self.status == ItemStatus::Active
    }
}

/// Seed data for a catalog listing. Used by the SQLite catalog and by tests.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub seller_id: UserId,
    pub title: String,
    pub price: Yen,
    pub weight_kg: f64,
}

impl NewItem {
    pub fn new<S: Into<String>>(seller_id: UserId, title: S, price: Yen) -> Self {
        Self { seller_id, title: title.into(), price, weight_kg: 0.0 }
    }

    pub fn with_weight(mut self, weight_kg: f64) -> Self {
        self.weight_kg = weight_kg;
        self
    }
}

//--------------------------------------      UserProfile      ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub display_name: String,
    pub phone: String,
    pub postal_code: String,
    pub region: String,
    pub city: String,
    pub address_line1: String,
    pub address_line2: String,
}

impl UserProfile {
    pub fn address(&self) -> RecipientAddress {
        RecipientAddress {
            name: self.display_name.clone(),
            phone: self.phone.clone(),
            postal_code: self.postal_code.clone(),
            region: self.region.clone(),
            city: self.city.clone(),
            address_line1: self.address_line1.clone(),
            address_line2: self.address_line2.clone(),
        }
    }
}

//--------------------------------------      OrderStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Completed => write!(f, "completed"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub watch_id: WatchId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub item_id: ItemId,
    pub price: Yen,
    pub status: OrderStatus,
    pub payment_method_ref: String,
    #[sqlx(flatten)]
    pub recipient: RecipientAddress,
    pub delivery_time_slot: Option<String>,
    pub shipping_label_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub watch_id: WatchId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub item_id: ItemId,
    pub price: Yen,
    pub payment_method_ref: String,
    pub recipient: RecipientAddress,
    pub delivery_time_slot: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// Materializes the order for a watch that has just claimed `item` at `price`.
    pub fn for_watch(watch: &Watch, item: &ItemSnapshot, price: Yen, created_at: DateTime<Utc>) -> Self {
        Self {
            watch_id: watch.id,
            buyer_id: watch.buyer_id,
            seller_id: item.seller_id,
            item_id: watch.item_id,
            price,
            payment_method_ref: watch.payment_method_ref.clone(),
            recipient: watch.recipient.clone(),
            delivery_time_slot: watch.delivery_time_slot.clone(),
            created_at,
        }
    }
}

//--------------------------------------  ReconciliationAnomaly  -------------------------------------------------------
/// An item that was claimed but not turned into a finished purchase. These need a human.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct ReconciliationAnomaly {
    pub id: i64,
    pub watch_id: WatchId,
    pub item_id: ItemId,
    pub order_id: Option<OrderId>,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnomaly {
    pub watch_id: WatchId,
    pub item_id: ItemId,
    pub order_id: Option<OrderId>,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------   NotificationKind    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    AutoPurchaseWatchCreated,
    AutoPurchaseWatchCancelled,
    AutoPurchaseWatchExpired,
    AutoPurchaseExecuted,
    ProductSold,
}

impl Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotificationKind::AutoPurchaseWatchCreated => "auto_purchase_watch_created",
            NotificationKind::AutoPurchaseWatchCancelled => "auto_purchase_watch_cancelled",
            NotificationKind::AutoPurchaseWatchExpired => "auto_purchase_watch_expired",
            NotificationKind::AutoPurchaseExecuted => "auto_purchase_executed",
            NotificationKind::ProductSold => "product_sold",
        };
        f.write_str(s)
    }
}

impl FromStr for NotificationKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto_purchase_watch_created" => Ok(Self::AutoPurchaseWatchCreated),
            "auto_purchase_watch_cancelled" => Ok(Self::AutoPurchaseWatchCancelled),
            "auto_purchase_watch_expired" => Ok(Self::AutoPurchaseWatchExpired),
            "auto_purchase_executed" => Ok(Self::AutoPurchaseExecuted),
            "product_sold" => Ok(Self::ProductSold),
            s => Err(ConversionError { kind: "notification kind", value: s.to_string() }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------     LabelRequest      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq)]
pub struct LabelRequest {
    pub order_id: OrderId,
    pub sender: RecipientAddress,
    pub recipient: RecipientAddress,
    pub item_title: String,
    pub parcel_weight_kg: f64,
    pub delivery_time_slot: Option<String>,
}

impl LabelRequest {
    /// The carrier's box size class for the parcel weight. Unknown (zero) weights are billed as 1kg.
    pub fn package_size(&self) -> &'static str {
        let weight = if self.parcel_weight_kg <= 0.0 { 1.0 } else { self.parcel_weight_kg };
        match weight {
            w if w <= 2.0 => "60",
            w if w <= 5.0 => "80",
            w if w <= 10.0 => "100",
            w if w <= 15.0 => "120",
            w if w <= 20.0 => "140",
            _ => "160",
        }
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ShippingLabel {
    pub label_ref: String,
    pub order_id: OrderId,
    pub carrier: String,
    pub package_size: String,
    pub weight_kg: f64,
    pub sender_name: String,
    pub sender_postal_code: String,
    pub sender_address: String,
    #[sqlx(flatten)]
    pub recipient: RecipientAddress,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod test {
    use super::*;

    fn item(price: i64, status: ItemStatus) -> ItemSnapshot {
        ItemSnapshot {
            id: ItemId(1),
            seller_id: UserId(2),
            title: "Bike".into(),
            price: Yen::from(price),
            status,
            weight_kg: 12.0,
        }
    }

    #[test]
    fn watch_status_round_trips_through_strings() {
        for s in [WatchStatus::Active, WatchStatus::Executed, WatchStatus::Cancelled, WatchStatus::Expired] {
            assert_eq!(s.to_string().parse::<WatchStatus>().unwrap(), s);
        }
        assert!("paused".parse::<WatchStatus>().is_err());
        assert!(!WatchStatus::Active.is_terminal());
        assert!(WatchStatus::Expired.is_terminal());
    }

    #[test]
    fn transitions_must_leave_active() {
        let now = Utc::now();
        assert!(WatchTransition::cancel(now).is_well_formed());
        assert!(WatchTransition::expire(now).is_well_formed());
        assert!(WatchTransition::execute(OrderId(4), now, "lease".into()).is_well_formed());
        let to_active = WatchTransition { status: WatchStatus::Active, at: now, order_id: None, lease_token: None };
        assert!(!to_active.is_well_formed());
        let executed_without_order =
            WatchTransition { status: WatchStatus::Executed, at: now, order_id: None, lease_token: None };
        assert!(!executed_without_order.is_well_formed());
    }

    #[test]
    fn purchasable_only_when_active() {
        assert!(item(100, ItemStatus::Active).purchasable());
        assert!(!item(100, ItemStatus::Sold).purchasable());
        assert!(!item(100, ItemStatus::Withdrawn).purchasable());
    }

    #[test]
    fn package_sizes_follow_weight_classes() {
        let mut req = LabelRequest {
            order_id: OrderId(1),
            sender: RecipientAddress::default(),
            recipient: RecipientAddress::default(),
            item_title: "Bike".into(),
            parcel_weight_kg: 0.0,
            delivery_time_slot: None,
        };
        let cases = [(0.0, "60"), (2.0, "60"), (2.1, "80"), (10.0, "100"), (14.0, "120"), (20.0, "140"), (21.0, "160")];
        for (w, size) in cases {
            req.parcel_weight_kg = w;
            assert_eq!(req.package_size(), size, "weight {w}");
        }
    }

    #[test]
    fn missing_address_fields_are_reported() {
        let mut addr = RecipientAddress {
            name: "Hanako".into(),
            phone: "090-0000-0000".into(),
            postal_code: "150-0001".into(),
            region: "Tokyo".into(),
            city: "Shibuya".into(),
            address_line1: "1-2-3 Jingumae".into(),
            address_line2: String::new(),
        };
        assert!(addr.missing_fields().is_empty());
        addr.city = "  ".into();
        addr.phone = String::new();
        assert_eq!(addr.missing_fields(), vec!["phone", "city"]);
    }

    #[test]
    fn audit_entry_builders() {
        let e = NewAuditEntry::failed(WatchId(3), Yen::from(9_500), "item unavailable", std::time::Duration::from_millis(42));
        assert_eq!(e.action, AuditAction::PurchaseFailed);
        assert!(!e.success);
        assert_eq!(e.error_message.as_deref(), Some("item unavailable"));
        assert_eq!(e.execution_time_ms, 42);
        assert_eq!(AuditAction::PurchaseAttempt.to_string(), "purchase_attempt");
    }
}
