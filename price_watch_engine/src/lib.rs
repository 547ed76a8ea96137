//! Price Watch Engine
//!
//! A buyer arms a *watch* on a listed item with a price ceiling and a payment pre-authorization. A scan cycle
//! periodically checks prices and, once an item is at or below a watch's ceiling, buys it on the buyer's behalf.
//! Many buyers can watch the same item; at most one of them ever gets it.
//!
//! The library is divided into:
//! 1. Storage and collaborator seams ([`mod@traits`]). The engine talks to the watch store, the item catalog, the
//!    user directory, the payment gate, the label generator and the notifier only through these traits.
//! 2. A SQLite backend ([`SqliteDatabase`]) that implements all of them in one file, so the server can run on its
//!    own.
//! 3. The engine API ([`mod@pw_api`]): buyer operations, the scanner, the contention resolver and the
//!    claim-and-execute pipeline.
//!
//! The engine also emits events ([`mod@events`]) when a watch executes, expires, or ends up needing manual
//! reconciliation.
mod db;

pub mod db_types;
pub mod events;
pub mod pw_api;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{db::SqliteDatabase, SqliteDatabaseError};
pub use pw_api::{
    errors::WatchApiError,
    payment_gate::MockPreAuthGateway,
    pipeline::ClaimPipeline,
    resolver::{rank_candidates, Resolution},
    retry::CallPolicy,
    scanner::PriceScanner,
    watch_api::WatchFlowApi,
    watch_objects,
};

/// The scanner with every seam backed by SQLite.
#[cfg(feature = "sqlite")]
pub type SqliteScanner = PriceScanner<SqliteDatabase, SqliteDatabase, SqliteDatabase, SqliteDatabase, SqliteDatabase>;
/// The buyer API backed by SQLite and the built-in pre-authorization gate.
#[cfg(feature = "sqlite")]
pub type SqliteWatchApi = WatchFlowApi<SqliteDatabase, SqliteDatabase, SqliteDatabase, MockPreAuthGateway, SqliteDatabase>;
