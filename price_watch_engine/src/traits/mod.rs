//! # Storage and collaborator seams
//!
//! Everything the watch engine touches outside its own memory goes through one of these traits. Backends and
//! external services implement them; the engine only ever sees the trait.
//!
//! ## Storage
//! * [`WatchManagement`] is the watch store. All status changes are conditional updates, so two workers racing on
//!   the same watch cannot both succeed.
//! * [`AuditLog`] is the append-only record of every price check and purchase attempt.
//! * [`OrderManagement`] stores the orders produced by executed watches.
//! * [`ReconciliationQueue`] holds claimed-but-unfinished purchases for an operator.
//!
//! ## Collaborators
//! * [`Catalog`] reports item prices and performs the atomic claim.
//! * [`UserDirectory`] supplies registered delivery addresses.
//! * [`PaymentGateway`] issues pre-authorizations.
//! * [`ShippingLabelGenerator`] and [`NotificationSink`] are best-effort side effects after a purchase.
mod audit_log;
mod collaborators;
mod data_objects;
mod errors;
mod order_management;
mod reconciliation;
mod watch_management;

pub use audit_log::AuditLog;
pub use collaborators::{Catalog, NotificationSink, PaymentGateway, ShippingLabelGenerator, UserDirectory};
pub use data_objects::{AuthorizationOutcome, PaymentInstrument};
pub use errors::{CollaboratorError, StoreError};
pub use order_management::OrderManagement;
pub use reconciliation::ReconciliationQueue;
pub use watch_management::WatchManagement;
